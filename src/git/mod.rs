pub mod executor;
pub mod extractor;
pub mod parser;
pub mod readiness;

// Re-export commonly used types
pub use executor::{CommandOutput, CommandRunner, GitExecutor, LineStream};
pub use extractor::{GitFacts, GitInfoExtractor};
pub use parser::{
    LocalChanges, parse_commit_list, parse_optional_line, parse_short_stats, parse_timestamp,
};
pub use readiness::{NotReadyReason, Readiness};
