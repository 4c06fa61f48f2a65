//! # nzb-direct-search
//!
//! Find a Usenet binary posting by scanning newsgroup overview headers directly,
//! without an indexer.
//!
//! Given a subject pattern, a list of groups and the date a posting was made,
//! the search:
//! - binary-searches each group's article numbers for the target date and for
//!   the start of a lookback window
//! - scans the overview headers in between with a bounded number of
//!   concurrent connections
//! - reassembles matching yEnc subjects into files and segments
//!
//! The first group that yields a posting wins, and the result converts into an
//! [`nntp_rs::Nzb`] document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nzb_direct_search::{Config, DirectSearch, SearchRequest, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         server: ServerConfig {
//!             host: "news.example.com".to_string(),
//!             port: 563,
//!             tls: true,
//!             username: Some("user".to_string()),
//!             password: Some("pass".to_string()),
//!         },
//!         ..Default::default()
//!     };
//!
//!     let search = DirectSearch::new(config).await?;
//!
//!     let mut events = search.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = SearchRequest::new(
//!         "My.Binary.Post",
//!         vec!["alt.binaries.test".to_string()],
//!         1_700_000_000,
//!     );
//!     let result = search.search(request).await?;
//!     println!("{}", result.into_nzb().to_xml());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Retry logic with exponential backoff
pub mod retry;
/// The direct-search engine
pub mod search;
/// News server access
pub mod source;
/// yEnc subject parsing
pub mod subject;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, RetryConfig, SearchConfig, ServerConfig};
pub use error::{BoundaryError, Error, Result};
pub use search::{DirectSearch, EventProgress, ProgressSink};
pub use source::{NewsConnection, NewsSource, NntpSource};
pub use subject::{SubjectParseError, SubjectParser, YencSubjectParser};
pub use types::{
    FileRecord, GroupRange, OverviewRecord, ParsedSubject, SearchEvent, SearchPhase,
    SearchRequest, SearchResult, SegmentRecord, SelectionStrategy,
};
