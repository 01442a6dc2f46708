use crate::config::GitConfig;
use crate::error::{GitError, GitResult};
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Deadline for blocking commands unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of executing a git command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Stdout of a running command, one line per item.
///
/// Dropping the stream releases the process.
pub type LineStream = Box<dyn Iterator<Item = io::Result<String>>>;

/// Runs git subcommands in a fixed working directory
pub trait CommandRunner {
    /// Run to completion and collect the output.
    ///
    /// A non-zero exit is reported through `CommandOutput`, not as an error.
    fn run(&self, args: &[&str]) -> GitResult<CommandOutput>;

    /// Start the command and hand back its stdout without waiting for exit
    fn stream(&self, args: &[&str]) -> GitResult<LineStream>;
}

/// Executes git commands within a repository
#[derive(Debug, Clone)]
pub struct GitExecutor {
    repo_path: PathBuf,
    program: String,
    timeout: Duration,
    c_locale: bool,
}

impl GitExecutor {
    /// Create a new GitExecutor for the given repository path
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            program: "git".to_string(),
            timeout: DEFAULT_TIMEOUT,
            c_locale: true,
        }
    }

    /// Create a GitExecutor using the `[git]` settings
    pub fn from_config<P: AsRef<Path>>(repo_path: P, config: &GitConfig) -> Self {
        Self::new(repo_path)
            .with_program(config.program.clone())
            .with_timeout(config.timeout())
            .with_c_locale(config.c_locale)
    }

    /// Use a different executable than `git`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the deadline for blocking commands
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Force `LC_ALL=C` so that parsed output is never translated
    pub fn with_c_locale(mut self, enabled: bool) -> Self {
        self.c_locale = enabled;
        self
    }

    /// Get the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn spawn(&self, args: &[&str], stderr: Stdio) -> GitResult<ChildGuard> {
        // Otherwise a missing directory is indistinguishable from a missing executable
        if !self.repo_path.is_dir() {
            return Err(GitError::SpawnFailed {
                program: self.program.clone(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("working directory {} does not exist", self.repo_path.display()),
                ),
            });
        }

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr);
        if self.c_locale {
            command.env("LC_ALL", "C");
        }

        let child = command.spawn().map_err(|source| GitError::SpawnFailed {
            program: self.program.clone(),
            source,
        })?;

        Ok(ChildGuard {
            child,
            reaped: false,
        })
    }
}

impl CommandRunner for GitExecutor {
    fn run(&self, args: &[&str]) -> GitResult<CommandOutput> {
        let command = self.describe(args);
        debug!(%command, "running");

        let mut guard = self.spawn(args, Stdio::piped())?;

        // Pipes are drained on their own threads so a chatty command cannot
        // block on a full pipe while we wait for it to exit
        let stdout = drain(guard.child.stdout.take());
        let stderr = drain(guard.child.stderr.take());

        let status = match guard.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                return Err(GitError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);
        debug!(%command, exit_code, "finished");

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success: status.success(),
        })
    }

    fn stream(&self, args: &[&str]) -> GitResult<LineStream> {
        debug!(command = %self.describe(args), "streaming");

        // Nobody reads stderr while streaming, so don't let it fill a pipe
        let mut guard = self.spawn(args, Stdio::null())?;
        let stdout = guard.child.stdout.take().ok_or_else(|| {
            GitError::IoError(io::Error::other("child stdout was not captured"))
        })?;

        Ok(Box::new(ChildLines {
            lines: BufReader::new(stdout).lines(),
            _guard: guard,
        }))
    }
}

/// Owns a child process and kills and reaps it on drop unless it already exited
#[derive(Debug)]
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let status = self.child.wait_timeout(timeout)?;
        self.reaped = status.is_some();
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Streaming stdout. Field order matters: the pipe closes before the guard reaps.
struct ChildLines {
    lines: Lines<BufReader<ChildStdout>>,
    _guard: ChildGuard,
}

impl Iterator for ChildLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            // Keep whatever arrived before a read error
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
