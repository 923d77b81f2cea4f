//! The recursive search engine and its matchers.
//!
//! A run pairs one [`MatchStrategy`] with one [`crate::report::Reporter`]:
//!
//! ```rust,ignore
//! let strategy = MatchStrategy::new(SearchMode::Contents, EncodingMode::FailFast);
//! let mut reporter = ConsoleReporter::stdout(SearchMode::Contents);
//! engine::run(&request, &strategy, &mut reporter)?;
//! ```
//!
//! The walk is single-threaded and depth-first. Every file is handed to the
//! matcher; matches go to the reporter; read and decode failures are counted
//! and dropped without stopping the walk.

pub mod engine;
pub mod matcher;

pub use engine::{collect, run, search, traverse, Visit, Walker};
pub use matcher::{ContentMatcher, MatchStrategy, Matcher, NameMatcher};
