//! The direct-search engine.
//!
//! A search walks the requested groups in order. For each group it:
//! - [`session`] - resolves the group's article range
//! - [`boundary`] - binary-searches the article numbers nearest the target date
//!   and the start of the lookback window
//! - [`partition`] - splits that interval into chunks
//! - [`scanner`] - scans the chunks concurrently, filtering subjects through
//!   [`filter`] and merging hits in the [`aggregator`]
//! - [`finalize`] - picks one posting and normalises it
//!
//! The first group that yields a posting wins.

mod aggregator;
mod boundary;
mod filter;
mod finalize;
mod partition;
mod progress;
mod scanner;
mod session;


pub use aggregator::{JobBucket, Observation, ResultAggregator, ResultSet};
pub use boundary::{BoundKind, EXHAUSTIVE_WIDTH, FIRST_PROBE_SPAN, PROBE_SPAN, locate_boundary};
pub use filter::{SubjectMatcher, decode_subject};
pub use finalize::finalize;
pub use partition::{Chunk, partition_range};
pub use progress::{EventProgress, ProgressSink};
pub use session::resolve_range;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{BoundaryError, Error, Result};
use crate::source::{NewsSource, NntpSource};
use crate::subject::{SubjectParser, YencSubjectParser};
use crate::types::{GroupRange, SearchEvent, SearchPhase, SearchRequest, SearchResult};

use scanner::ChunkScanner;
use session::{GroupSession, group_error};

/// Searches newsgroups for a binary posting by scanning overview headers.
///
/// Cloning is cheap; clones share the news source and event channel.
#[derive(Clone)]
pub struct DirectSearch {
    config: Arc<Config>,
    source: Arc<dyn NewsSource>,
    parser: Arc<dyn SubjectParser>,
    event_tx: broadcast::Sender<SearchEvent>,
}

impl DirectSearch {
    /// Connect to the configured NNTP server.
    ///
    /// Fails with [`Error::Config`] when credentials are missing.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let connections = config.search.with_builtin_defaults().connections;
        let source = NntpSource::new(config.server.clone(), connections)
            .await
            .map_err(|e| Error::Nntp(format!("Failed to create NNTP pool: {e}")))?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Search through an arbitrary [`NewsSource`]. Credentials are not checked.
    pub fn with_source(config: Config, source: Arc<dyn NewsSource>) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        Self {
            config: Arc::new(config),
            source,
            parser: Arc::new(YencSubjectParser),
            event_tx,
        }
    }

    /// Replace the subject parser
    pub fn with_parser(mut self, parser: Arc<dyn SubjectParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Subscribe to [`SearchEvent`]s. Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Valid article range of `group`
    pub async fn group_range(&self, group: &str) -> Result<GroupRange> {
        resolve_range(self.source.as_ref(), group, &self.config.retry).await
    }

    /// Run a search.
    ///
    /// Groups are tried in request order and the first one containing a
    /// matching posting wins. Failures of individual groups are logged and
    /// reported as [`SearchEvent::GroupFailed`]; only invalid requests and
    /// [`Error::NoResultsFound`] are returned.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        request.validate()?;
        let request = request.resolved(&self.config.search);
        let matcher = SubjectMatcher::new(&request.header)?;

        for group in &request.groups {
            tracing::info!(group = %group, header = %request.header, "searching group");
            self.emit(SearchEvent::GroupStarted {
                group: group.clone(),
            });

            match self.search_group(&request, &matcher, group).await {
                Ok(Some(result)) => {
                    tracing::info!(
                        group = %group,
                        files = result.files.len(),
                        segments = result.segment_count(),
                        "found posting"
                    );
                    self.emit(SearchEvent::Completed {
                        group: group.clone(),
                        files: result.files.len(),
                        segments: result.segment_count(),
                    });
                    return Ok(result);
                }
                Ok(None) => {
                    tracing::warn!(group = %group, "no result in group");
                    self.emit(SearchEvent::GroupEmpty {
                        group: group.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(group = %group, error = %e, "group search failed");
                    self.emit(SearchEvent::GroupFailed {
                        group: group.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(Error::NoResultsFound)
    }

    async fn search_group(
        &self,
        request: &SearchRequest,
        matcher: &SubjectMatcher,
        group: &str,
    ) -> Result<Option<SearchResult>> {
        let (lower, upper) = self.locate_scan_interval(request, group).await?;
        if lower >= upper {
            return Err(Error::boundary(
                group,
                BoundaryError::EmptyRange { lower, upper },
            ));
        }

        let chunks = partition_range(lower, upper, request.step);
        tracing::info!(
            group = %group,
            lower,
            upper,
            chunks = chunks.len(),
            concurrency = request.scan_ceiling(),
            "scanning overviews"
        );

        let aggregator = ResultAggregator::new();
        let processed = Arc::new(AtomicU64::new(0));
        let scanner = ChunkScanner {
            source: self.source.as_ref(),
            parser: self.parser.as_ref(),
            matcher,
            aggregator: &aggregator,
            retry: &self.config.retry,
            group,
            cutoff: request.date,
            processed: Arc::clone(&processed),
        };

        let cancel_token = CancellationToken::new();
        let reporter_token = cancel_token.child_token();
        let total = upper - lower;
        let sink: Arc<dyn ProgressSink> = Arc::new(self.progress(group, SearchPhase::Scanning));
        let reporter = progress::spawn_progress_reporter(
            Arc::clone(&processed),
            total,
            Arc::clone(&sink),
            reporter_token.clone(),
        );

        let outcome = scanner
            .scan_all(chunks, request.scan_ceiling(), &cancel_token)
            .await;

        reporter_token.cancel();
        if let Err(e) = reporter.await {
            tracing::error!(group = %group, error = %e, "progress reporter panicked");
        }
        sink.set_progress(processed.load(Ordering::Relaxed), total);
        sink.finish();
        outcome?;

        Ok(finalize(
            group,
            aggregator.into_results(),
            self.config.search.selection,
        ))
    }

    /// Article numbers bounding the scan: `(lower, upper)`
    async fn locate_scan_interval(
        &self,
        request: &SearchRequest,
        group: &str,
    ) -> Result<(u64, u64)> {
        let mut session =
            GroupSession::open(self.source.as_ref(), group, &self.config.retry).await?;
        let range = session.range.clone();
        tracing::debug!(
            group = %group,
            first = range.first,
            last = range.last,
            "group selected"
        );

        let upper = locate_boundary(
            session.conn.as_mut(),
            &range,
            request.date,
            BoundKind::Upper,
            &self.progress(group, SearchPhase::UpperBoundary),
        )
        .await
        .map_err(|e| group_error(group, e))?;

        let lower = locate_boundary(
            session.conn.as_mut(),
            &range,
            request.window_start(),
            BoundKind::Lower,
            &self.progress(group, SearchPhase::LowerBoundary),
        )
        .await
        .map_err(|e| group_error(group, e))?;

        tracing::debug!(group = %group, lower, upper, "scan interval located");
        Ok((lower, upper))
    }

    fn progress(&self, group: &str, phase: SearchPhase) -> EventProgress {
        EventProgress::new(group, phase, self.event_tx.clone())
    }

    fn emit(&self, event: SearchEvent) {
        self.event_tx.send(event).ok();
    }
}
