#![allow(dead_code)]

use git_versioner::error::{GitError, GitResult};
use git_versioner::git::{CommandOutput, CommandRunner, LineStream};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use tempfile::TempDir;

/// Run git in `repo_path` and return its trimmed stdout
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Canned answer for a blocking run
pub enum Reply {
    Exit { code: i32, stdout: String },
    SpawnError,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Reply::Exit {
            code: 0,
            stdout: stdout.to_string(),
        }
    }

    pub fn exit(code: i32) -> Self {
        Reply::Exit {
            code,
            stdout: String::new(),
        }
    }
}

/// Canned answer for a streaming run
pub enum StreamReply {
    Lines(Vec<&'static str>),
    /// Yields the lines, then a read error
    FailAfter(Vec<&'static str>),
    SpawnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub command: String,
    pub streamed: bool,
}

/// `CommandRunner` answering from a script and recording every invocation.
///
/// Unscripted blocking commands exit with 1 and no output; unscripted streams
/// are empty.
#[derive(Default)]
pub struct ScriptedRunner {
    blocking: HashMap<String, Reply>,
    streaming: HashMap<String, StreamReply>,
    calls: RefCell<Vec<Call>>,
    released: Rc<Cell<usize>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose `git status` succeeds
    pub fn ready() -> Self {
        Self::new().on("status", Reply::ok("On branch main\n"))
    }

    pub fn on(mut self, command: &str, reply: Reply) -> Self {
        self.blocking.insert(command.to_string(), reply);
        self
    }

    pub fn on_stream(mut self, command: &str, reply: StreamReply) -> Self {
        self.streaming.insert(command.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|call| call.command.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_to(&self, command: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.command == command)
            .count()
    }

    /// Number of streams dropped so far
    pub fn released(&self) -> usize {
        self.released.get()
    }

    fn record(&self, args: &[&str], streamed: bool) -> String {
        let command = args.join(" ");
        self.calls.borrow_mut().push(Call {
            command: command.clone(),
            streamed,
        });
        command
    }
}

fn spawn_error() -> GitError {
    GitError::SpawnFailed {
        program: "git".to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, args: &[&str]) -> GitResult<CommandOutput> {
        let command = self.record(args, false);

        match self.blocking.get(&command) {
            Some(Reply::Exit { code, stdout }) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: *code,
                success: *code == 0,
            }),
            Some(Reply::SpawnError) => Err(spawn_error()),
            None => Ok(CommandOutput {
                stdout: String::new(),
                stderr: format!("unscripted command: {}", command),
                exit_code: 1,
                success: false,
            }),
        }
    }

    fn stream(&self, args: &[&str]) -> GitResult<LineStream> {
        let command = self.record(args, true);

        let items: Vec<io::Result<String>> = match self.streaming.get(&command) {
            Some(StreamReply::SpawnError) => return Err(spawn_error()),
            Some(StreamReply::Lines(lines)) => {
                lines.iter().map(|line| Ok(line.to_string())).collect()
            }
            Some(StreamReply::FailAfter(lines)) => lines
                .iter()
                .map(|line| Ok(line.to_string()))
                .chain(std::iter::once(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "stream did not contain valid UTF-8",
                ))))
                .collect(),
            None => Vec::new(),
        };

        Ok(Box::new(FakeStream {
            items: items.into_iter(),
            released: Rc::clone(&self.released),
        }))
    }
}

struct FakeStream {
    items: std::vec::IntoIter<io::Result<String>>,
    released: Rc<Cell<usize>>,
}

impl Iterator for FakeStream {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}
