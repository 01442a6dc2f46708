use crate::config::{Config, MissingToolPolicy};
use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandRunner, GitExecutor};
use crate::git::parser::{self, LocalChanges};
use crate::git::readiness::{NotReadyReason, Readiness};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Author timestamp of a single commit. The quotes are passed to git as-is.
const TIMESTAMP_FORMAT: &str = "--pretty=format:'%at'";

/// Revision plus extra `rev-list` arguments
type HistoryKey = (String, Vec<String>);

/// Facts computed so far. `None` means not asked yet.
#[derive(Debug, Default)]
struct FactCache {
    readiness: Option<Readiness>,
    current_sha1: Option<Option<String>>,
    current_branch: Option<Option<String>>,
    local_changes: Option<LocalChanges>,
    initial_commit_date: Option<i64>,
    histories: HashMap<HistoryKey, Vec<String>>,
    commit_dates: HashMap<String, i64>,
}

/// Snapshot of everything a version string is derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFacts {
    pub readiness: Readiness,
    pub sha1: Option<String>,
    pub branch: Option<String>,
    pub commit_count: usize,
    pub initial_commit_date: i64,
    pub local_changes: LocalChanges,
}

/// Reads version-relevant facts about the repository containing a project.
///
/// Each fact runs at most one git command, on first access, and is cached for
/// the lifetime of the extractor; later changes to the working tree are not
/// observed. Every fact except readiness itself falls back to an empty value
/// (`None`, zero, empty list) when git cannot answer, so the only error an
/// accessor returns is a readiness check that could not run git under
/// [`MissingToolPolicy::Fail`].
#[derive(Debug)]
pub struct GitInfoExtractor<R = GitExecutor> {
    project_dir: PathBuf,
    runner: R,
    remote: String,
    on_missing_tool: MissingToolPolicy,
    cache: FactCache,
}

impl GitInfoExtractor<GitExecutor> {
    /// Extractor running the `git` on `PATH` with default settings
    pub fn new<P: AsRef<Path>>(project_dir: P) -> Self {
        Self::with_config(project_dir, &Config::default())
    }

    pub fn with_config<P: AsRef<Path>>(project_dir: P, config: &Config) -> Self {
        let project_dir = project_dir.as_ref();
        let runner = GitExecutor::from_config(project_dir, &config.git);

        Self::with_runner(project_dir, runner)
            .remote(config.git.remote.clone())
            .on_missing_tool(config.git.on_missing_tool)
    }
}

impl<R: CommandRunner> GitInfoExtractor<R> {
    /// Extractor on top of any command runner, typically a test double
    pub fn with_runner<P: AsRef<Path>>(project_dir: P, runner: R) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
            runner,
            remote: "origin".to_string(),
            on_missing_tool: MissingToolPolicy::default(),
            cache: FactCache::default(),
        }
    }

    /// Remote whose tracking branches back up a failed history walk
    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn on_missing_tool(mut self, policy: MissingToolPolicy) -> Self {
        self.on_missing_tool = policy;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Check the repository with `git status`, once
    pub fn readiness(&mut self) -> GitResult<Readiness> {
        if let Some(readiness) = self.cache.readiness {
            return Ok(readiness);
        }

        // An error leaves the slot empty, so the next call checks again
        let readiness = self.check_status()?;
        self.cache.readiness = Some(readiness);
        Ok(readiness)
    }

    pub fn is_ready(&mut self) -> GitResult<bool> {
        Ok(self.readiness()?.is_ready())
    }

    /// Full id of the HEAD commit
    pub fn current_sha1(&mut self) -> GitResult<Option<String>> {
        if let Some(sha1) = &self.cache.current_sha1 {
            trace!("current_sha1 cached");
            return Ok(sha1.clone());
        }

        let sha1 = if self.is_ready()? {
            self.query(&["rev-parse", "HEAD"])
                .and_then(|output| parser::parse_optional_line(&output))
        } else {
            None
        };

        self.cache.current_sha1 = Some(sha1.clone());
        Ok(sha1)
    }

    /// Short name of the checked-out branch, `None` when HEAD is detached
    pub fn current_branch(&mut self) -> GitResult<Option<String>> {
        if let Some(branch) = &self.cache.current_branch {
            trace!("current_branch cached");
            return Ok(branch.clone());
        }

        let branch = if self.is_ready()? {
            self.query(&["symbolic-ref", "--short", "-q", "HEAD"])
                .and_then(|output| parser::parse_optional_line(&output))
        } else {
            None
        };

        self.cache.current_branch = Some(branch.clone());
        Ok(branch)
    }

    /// Uncommitted changes in the working tree and index, relative to HEAD
    pub fn local_changes(&mut self) -> GitResult<LocalChanges> {
        if let Some(changes) = self.cache.local_changes {
            trace!("local_changes cached");
            return Ok(changes);
        }

        let changes = if self.is_ready()? {
            self.query(&["diff", "HEAD", "--shortstat"])
                .map(|output| parser::parse_short_stats(&output))
                .unwrap_or(LocalChanges::NONE)
        } else {
            LocalChanges::NONE
        };

        self.cache.local_changes = Some(changes);
        Ok(changes)
    }

    /// Every commit reachable from HEAD, newest first
    pub fn commits_to_head(&mut self) -> GitResult<Vec<String>> {
        self.commits_up_to("HEAD", &[])
    }

    /// Every commit reachable from `rev`, newest first, filtered by extra
    /// `rev-list` arguments such as `-- path`.
    ///
    /// When git cannot be started or its output cannot be read, the walk is
    /// retried once against the remote-tracking branch (`origin/<rev>`). An
    /// unknown revision is not such a failure: git exits non-zero without
    /// output and the list is empty. Failure of the retry gives an empty list.
    ///
    /// A `rev` starting with `-` would be taken as an option, so it is refused
    /// without running git.
    pub fn commits_up_to(&mut self, rev: &str, extra_args: &[&str]) -> GitResult<Vec<String>> {
        if is_option_like(rev) {
            debug!(rev, "refusing revision that looks like an option");
            return Ok(Vec::new());
        }

        let key: HistoryKey = (
            rev.to_string(),
            extra_args.iter().map(|arg| arg.to_string()).collect(),
        );
        if let Some(commits) = self.cache.histories.get(&key) {
            trace!(rev, "history cached");
            return Ok(commits.clone());
        }

        let commits = if self.is_ready()? {
            self.walk_history(rev, extra_args)
        } else {
            Vec::new()
        };

        self.cache.histories.insert(key, commits.clone());
        Ok(commits)
    }

    /// Author date of the root commit of HEAD, 0 when there is no history
    pub fn initial_commit_date(&mut self) -> GitResult<i64> {
        if let Some(date) = self.cache.initial_commit_date {
            return Ok(date);
        }

        let date = match self.commits_to_head()?.last() {
            Some(initial) => self.commit_date(initial)?,
            None => 0,
        };

        self.cache.initial_commit_date = Some(date);
        Ok(date)
    }

    /// Author date of `rev` in Unix seconds, 0 when it cannot be resolved
    pub fn commit_date(&mut self, rev: &str) -> GitResult<i64> {
        if is_option_like(rev) {
            debug!(rev, "refusing revision that looks like an option");
            return Ok(0);
        }

        if let Some(date) = self.cache.commit_dates.get(rev) {
            trace!(rev, "commit date cached");
            return Ok(*date);
        }

        let date = if self.is_ready()? {
            self.query(&["log", rev, "-n", "1", TIMESTAMP_FORMAT])
                .map(|output| parser::parse_timestamp(&output))
                .unwrap_or(0)
        } else {
            0
        };

        self.cache.commit_dates.insert(rev.to_string(), date);
        Ok(date)
    }

    /// Collect all HEAD-related facts
    pub fn facts(&mut self) -> GitResult<GitFacts> {
        let readiness = self.readiness()?;

        Ok(GitFacts {
            readiness,
            sha1: self.current_sha1()?,
            branch: self.current_branch()?,
            commit_count: self.commits_to_head()?.len(),
            initial_commit_date: self.initial_commit_date()?,
            local_changes: self.local_changes()?,
        })
    }

    fn check_status(&self) -> GitResult<Readiness> {
        let readiness = match self.runner.run(&["status"]) {
            Ok(output) => Readiness::from_status_exit(output.exit_code),
            Err(err) => match self.on_missing_tool {
                MissingToolPolicy::Fail => return Err(err),
                MissingToolPolicy::Degrade => {
                    warn!(error = %err, "git status could not be run");
                    Readiness::NotReady(NotReadyReason::ToolUnavailable)
                }
            },
        };

        if let Some(reason) = readiness.reason() {
            warn!("{}", reason.message(&self.project_dir));
        }

        Ok(readiness)
    }

    /// Stdout of a command that ran and succeeded
    fn query(&self, args: &[&str]) -> Option<String> {
        match self.runner.run(args) {
            Ok(output) if output.success => Some(output.stdout),
            Ok(output) => {
                debug!(
                    command = %args.join(" "),
                    exit_code = output.exit_code,
                    stderr = %output.stderr.trim(),
                    "git reported failure"
                );
                None
            }
            Err(err) => {
                warn!(command = %args.join(" "), error = %err, "git could not be run");
                None
            }
        }
    }

    fn walk_history(&self, rev: &str, extra_args: &[&str]) -> Vec<String> {
        let mut args = vec!["rev-list", rev];
        args.extend_from_slice(extra_args);

        match self.read_stream(&args) {
            Ok(lines) => return parser::parse_commit_list(lines),
            Err(err) => {
                debug!(rev, error = %err, "history walk failed, retrying on {}", self.remote);
            }
        }

        let remote_rev = format!("{}/{}", self.remote, rev);
        let mut retry_args = vec!["rev-list", remote_rev.as_str()];
        retry_args.extend_from_slice(extra_args);

        match self.runner.run(&retry_args) {
            Ok(output) => parser::parse_commit_list(output.stdout.lines()),
            Err(err) => {
                debug!(rev = %remote_rev, error = %err, "history walk retry failed");
                Vec::new()
            }
        }
    }

    /// Read a streamed command to the end. The stream is consumed, and so
    /// released, before this returns.
    fn read_stream(&self, args: &[&str]) -> Result<Vec<String>, GitError> {
        let stream = self.runner.stream(args)?;
        let lines = stream.collect::<io::Result<Vec<String>>>()?;
        Ok(lines)
    }
}

/// Revisions never start with `-`; git would parse one as an option
fn is_option_like(rev: &str) -> bool {
    rev.starts_with('-')
}
