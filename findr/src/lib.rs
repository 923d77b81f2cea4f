pub mod config;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod results;
pub mod search;

pub use config::{ConfigOverrides, EncodingMode, SearchConfig, SearchMode, SearchRequest};
pub use errors::{SearchError, SearchResult};
pub use report::{CollectingReporter, ConsoleReporter, Reporter};
pub use results::{Highlighted, LineHit, MatchBuffer, Report, SearchOutput};
pub use search::{collect, search};
