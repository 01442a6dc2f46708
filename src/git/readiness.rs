use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Exit code git reports when the macOS developer tools license has not been accepted
pub const EXIT_TOOLCHAIN_LICENSE: i32 = 69;

/// Whether git can answer questions about a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady(NotReadyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReadyReason {
    /// `git` exited with 69: the Xcode license agreement is pending
    ToolchainLicense,
    /// `git status` failed for any other reason
    NotARepository,
    /// `git` could not be started at all
    ToolUnavailable,
}

impl Readiness {
    /// Classify the exit code of `git status`
    pub fn from_status_exit(exit_code: i32) -> Self {
        match exit_code {
            0 => Readiness::Ready,
            EXIT_TOOLCHAIN_LICENSE => Readiness::NotReady(NotReadyReason::ToolchainLicense),
            _ => Readiness::NotReady(NotReadyReason::NotARepository),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn reason(&self) -> Option<NotReadyReason> {
        match self {
            Readiness::Ready => None,
            Readiness::NotReady(reason) => Some(*reason),
        }
    }
}

impl NotReadyReason {
    /// User-facing explanation, with the fix where one is known
    pub fn message(&self, project_dir: &Path) -> String {
        match self {
            NotReadyReason::ToolchainLicense => format!(
                "git returned with error {}.\n\
                 On macOS this means Xcode was updated and its new license agreement \
                 has not been accepted yet, so the developer tools refuse to run.\n\
                 Open Xcode once and accept the license, or run\n\
                 \txcode-select --install\n\
                 No version information will be derived from git for {}.",
                EXIT_TOOLCHAIN_LICENSE,
                project_dir.display()
            ),
            NotReadyReason::NotARepository => format!(
                "can't generate a git version, {} is not a git repository \
                 (or any of the parent directories)",
                project_dir.display()
            ),
            NotReadyReason::ToolUnavailable => format!(
                "can't generate a git version, git could not be run in {}",
                project_dir.display()
            ),
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Ready => write!(f, "ready"),
            Readiness::NotReady(NotReadyReason::ToolchainLicense) => {
                write!(f, "not ready (toolchain license not accepted)")
            }
            Readiness::NotReady(NotReadyReason::NotARepository) => {
                write!(f, "not ready (not a git repository)")
            }
            Readiness::NotReady(NotReadyReason::ToolUnavailable) => {
                write!(f, "not ready (git unavailable)")
            }
        }
    }
}
