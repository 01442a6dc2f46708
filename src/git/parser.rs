use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Working-tree changes relative to HEAD, as summarized by `git diff --shortstat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalChanges {
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_deleted: u32,
}

impl LocalChanges {
    /// A clean working tree
    pub const NONE: LocalChanges = LocalChanges {
        files_changed: 0,
        lines_added: 0,
        lines_deleted: 0,
    };

    pub fn new(files_changed: u32, lines_added: u32, lines_deleted: u32) -> Self {
        Self {
            files_changed,
            lines_added,
            lines_deleted,
        }
    }

    pub fn is_clean(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for LocalChanges {
    /// Same wording as git's own shortstat line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "no changes");
        }

        let plural = |n: u32| if n == 1 { "" } else { "s" };
        write!(
            f,
            "{} file{} changed",
            self.files_changed,
            plural(self.files_changed)
        )?;
        if self.lines_added > 0 {
            write!(
                f,
                ", {} insertion{}(+)",
                self.lines_added,
                plural(self.lines_added)
            )?;
        }
        if self.lines_deleted > 0 {
            write!(
                f,
                ", {} deletion{}(-)",
                self.lines_deleted,
                plural(self.lines_deleted)
            )?;
        }
        Ok(())
    }
}

fn leading_number() -> &'static Regex {
    static LEADING_NUMBER: OnceLock<Regex> = OnceLock::new();
    LEADING_NUMBER.get_or_init(|| Regex::new(r"^(\d+)").unwrap())
}

fn leading_count(segment: &str) -> Option<u32> {
    leading_number()
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse `git diff --shortstat` output
///
/// Format: `3 files changed, 10 insertions(+), 2 deletions(-)`, where the
/// insertion and deletion parts are omitted when zero. Each comma-separated
/// segment feeds at most one field, picked by the first marker it contains in
/// the order `(+)`, `(-)`, `changed`. Anything unrecognized is skipped.
pub fn parse_short_stats(shortstat: &str) -> LocalChanges {
    let shortstat = shortstat.trim();
    if shortstat.is_empty() {
        return LocalChanges::NONE;
    }

    let mut changes = LocalChanges::NONE;

    for segment in shortstat.split(',').map(str::trim) {
        let field = if segment.contains("(+)") {
            &mut changes.lines_added
        } else if segment.contains("(-)") {
            &mut changes.lines_deleted
        } else if segment.contains("changed") {
            &mut changes.files_changed
        } else {
            continue;
        };

        if let Some(count) = leading_count(segment) {
            *field = count;
        }
    }

    changes
}

/// Single-line output such as a sha1 or branch name; blank means absent
pub fn parse_optional_line(output: &str) -> Option<String> {
    let line = output.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Parse `git rev-list` output, one commit id per line
pub fn parse_commit_list<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse `git log --pretty=format:'%at'` output
///
/// The quotes reach git verbatim and come back in the output, so they are
/// stripped here. Anything that is not an integer yields 0.
pub fn parse_timestamp(output: &str) -> i64 {
    output.replace('\'', "").trim().parse().unwrap_or(0)
}
