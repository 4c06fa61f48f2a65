//! Concurrent overview scanning of a partitioned article range

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::source::NewsSource;
use crate::subject::SubjectParser;
use crate::types::OverviewRecord;

use super::aggregator::{Observation, ResultAggregator};
use super::filter::{SubjectMatcher, decode_subject};
use super::partition::Chunk;
use super::session::GroupSession;

/// Everything a chunk worker needs, shared by reference across workers
pub(crate) struct ChunkScanner<'a> {
    pub(crate) source: &'a dyn NewsSource,
    pub(crate) parser: &'a dyn SubjectParser,
    pub(crate) matcher: &'a SubjectMatcher,
    pub(crate) aggregator: &'a ResultAggregator,
    pub(crate) retry: &'a RetryConfig,
    pub(crate) group: &'a str,
    /// Articles posted at or after this date end a chunk
    pub(crate) cutoff: i64,
    /// Records processed so far, across all chunks
    pub(crate) processed: Arc<AtomicU64>,
}

impl ChunkScanner<'_> {
    /// Scan every chunk with at most `concurrency` in flight.
    ///
    /// The first failing chunk closes the aggregator and cancels its siblings;
    /// its error is returned once all chunks have stopped.
    pub(crate) async fn scan_all(
        &self,
        chunks: Vec<Chunk>,
        concurrency: usize,
        cancel_token: &CancellationToken,
    ) -> Result<()> {
        let results: Vec<Result<()>> = stream::iter(chunks)
            .map(|chunk| async move {
                let result = self.scan_chunk(chunk, cancel_token).await;
                if let Err(e) = &result {
                    tracing::error!(
                        group = %self.group,
                        first = chunk.first,
                        last = chunk.last,
                        error = %e,
                        "chunk scan failed, cancelling remaining chunks"
                    );
                    self.aggregator.close();
                    cancel_token.cancel();
                }
                result
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        // Completion order: the first error is the first one observed
        results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
    }

    /// Scan one chunk. A cancelled chunk returns `Ok(())` without doing more work.
    pub(crate) async fn scan_chunk(
        &self,
        chunk: Chunk,
        cancel_token: &CancellationToken,
    ) -> Result<()> {
        if cancel_token.is_cancelled() {
            return Ok(());
        }

        let records = {
            // Opening may sit in retry backoff; a failed sibling ends the wait
            let opened = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Ok(()),
                opened = GroupSession::open(self.source, self.group, self.retry) => opened,
            };
            let mut session = opened.map_err(|e| self.scan_error(chunk, e))?;

            let Some((first, last)) = session.range.clamp(chunk.first, chunk.last) else {
                tracing::debug!(
                    group = %self.group,
                    first = chunk.first,
                    last = chunk.last,
                    "chunk outside live range"
                );
                return Ok(());
            };
            if cancel_token.is_cancelled() {
                return Ok(());
            }

            session
                .conn
                .overview(first, last)
                .await
                .map_err(|e| self.scan_error(chunk, e))?
        };

        tracing::debug!(
            group = %self.group,
            first = chunk.first,
            last = chunk.last,
            records = records.len(),
            "scanning chunk"
        );

        for record in records {
            if cancel_token.is_cancelled() {
                return Ok(());
            }
            if record.date >= self.cutoff {
                break;
            }
            self.classify(record);
            self.processed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn classify(&self, record: OverviewRecord) {
        let subject = decode_subject(&record.subject);
        if !self.matcher.is_match(&subject) {
            return;
        }
        let parsed = match self.parser.parse(&subject) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::trace!(
                    article = record.number,
                    subject = %subject,
                    error = %e,
                    "unparseable subject"
                );
                return;
            }
        };

        self.aggregator.observe(Observation {
            group: self.group.to_string(),
            parsed,
            poster: record.poster.replace(char::REPLACEMENT_CHARACTER, ""),
            date: record.date.max(0),
            message_id: record.message_id,
            bytes: record.bytes,
        });
    }

    fn scan_error(&self, chunk: Chunk, error: Error) -> Error {
        Error::Scan {
            group: self.group.to_string(),
            first: chunk.first,
            last: chunk.last,
            message: error.to_string(),
        }
    }
}
