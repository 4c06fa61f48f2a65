//! News-server access behind a trait seam
//!
//! The search algorithms only ever need two things from a server: select a
//! group and read an overview range. [`NewsSource`] hands out connections that
//! can do both, so production code talks to an [`nntp_rs::NntpPool`] and tests
//! talk to an in-memory group.

use std::ops::DerefMut;

use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::types::{GroupRange, OverviewRecord};

/// NNTP "no article in range" responses for an overview request
const NO_ARTICLES_CODES: [u16; 2] = [420, 423];

/// Hands out connections to a news server
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Acquire a connection; it is released when dropped
    async fn connect(&self) -> Result<Box<dyn NewsConnection + '_>>;
}

/// A single server connection
#[async_trait]
pub trait NewsConnection: Send {
    /// Select a group and report its valid article range
    async fn select_group(&mut self, group: &str) -> Result<GroupRange>;

    /// Overview records for the inclusive article interval `[first, last]`
    /// of the currently selected group.
    ///
    /// Missing article numbers are simply absent from the result; an interval
    /// with no articles yields an empty vector.
    async fn overview(&mut self, first: u64, last: u64) -> Result<Vec<OverviewRecord>>;
}

/// Production [`NewsSource`] backed by an nntp-rs connection pool
pub struct NntpSource {
    pool: nntp_rs::NntpPool,
}

impl NntpSource {
    /// Create a pool of at most `connections` connections to `server`
    pub async fn new(server: ServerConfig, connections: usize) -> Result<Self> {
        let max_size = u32::try_from(connections.max(1)).unwrap_or(u32::MAX);
        tracing::debug!(host = %server.host, port = server.port, max_size, "creating NNTP pool");
        let pool = nntp_rs::NntpPool::new(server.into(), max_size).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl NewsSource for NntpSource {
    async fn connect(&self) -> Result<Box<dyn NewsConnection + '_>> {
        let client = self.pool.get().await?;
        Ok(Box::new(PooledConnection { client }))
    }
}

/// Adapts a pooled [`nntp_rs::NntpClient`] to [`NewsConnection`]
struct PooledConnection<C> {
    client: C,
}

#[async_trait]
impl<C> NewsConnection for PooledConnection<C>
where
    C: DerefMut<Target = nntp_rs::NntpClient> + Send,
{
    async fn select_group(&mut self, group: &str) -> Result<GroupRange> {
        let info = self
            .client
            .select_group(group)
            .await
            .map_err(|e| group_error(group, e))?;

        Ok(GroupRange {
            group: group.to_string(),
            first: info.first,
            last: info.last,
        })
    }

    async fn overview(&mut self, first: u64, last: u64) -> Result<Vec<OverviewRecord>> {
        let range = format!("{first}-{last}");
        match self.client.fetch_xover(&range).await {
            Ok(entries) => Ok(entries.into_iter().map(overview_record).collect()),
            Err(nntp_rs::NntpError::Protocol { code, .. }) if NO_ARTICLES_CODES.contains(&code) => {
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn group_error(group: &str, error: nntp_rs::NntpError) -> Error {
    match error {
        nntp_rs::NntpError::NoSuchGroup(_) => Error::Group {
            group: group.to_string(),
            message: "no such newsgroup".to_string(),
        },
        other => other.into(),
    }
}

/// Convert an overview line, mapping unparseable dates to 0
fn overview_record(entry: nntp_rs::XoverEntry) -> OverviewRecord {
    OverviewRecord {
        number: entry.article_number,
        date: parse_overview_date(&entry.date),
        subject: entry.subject,
        poster: entry.author,
        message_id: entry.message_id,
        bytes: entry.bytes as u64,
    }
}

pub(crate) fn parse_overview_date(raw: &str) -> i64 {
    match nntp_rs::parse_date(raw.trim()) {
        Ok(date) => date.timestamp().max(0),
        Err(e) => {
            tracing::trace!(date = raw, error = %e, "unparseable overview date");
            0
        }
    }
}
