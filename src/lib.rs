pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use config::{Config, MissingToolPolicy};
pub use error::{GitError, GitResult};
pub use git::{GitExecutor, GitFacts, GitInfoExtractor, LocalChanges, Readiness};
