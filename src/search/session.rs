//! Group sessions: a connection with a newsgroup selected

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::source::{NewsConnection, NewsSource};
use crate::types::GroupRange;

/// A server connection with `group` selected and its live range.
///
/// Dropping the session releases the connection.
pub(crate) struct GroupSession<'a> {
    pub(crate) conn: Box<dyn NewsConnection + 'a>,
    pub(crate) range: GroupRange,
}

impl<'a> GroupSession<'a> {
    /// Connect and select `group`, retrying transient transport failures
    pub(crate) async fn open(
        source: &'a dyn NewsSource,
        group: &str,
        retry: &RetryConfig,
    ) -> Result<Self> {
        with_retry(retry, || async move {
            let mut conn = source.connect().await?;
            let range = conn.select_group(group).await?;
            Ok(GroupSession { conn, range })
        })
        .await
        .map_err(|e| group_error(group, e))
    }
}

/// Valid article range of `group`; the connection is released before returning
pub async fn resolve_range(
    source: &dyn NewsSource,
    group: &str,
    retry: &RetryConfig,
) -> Result<GroupRange> {
    let session = GroupSession::open(source, group, retry).await?;
    tracing::debug!(
        group = %group,
        first = session.range.first,
        last = session.range.last,
        "resolved group range"
    );
    Ok(session.range)
}

/// Attribute a transport failure to the group it happened in
pub(crate) fn group_error(group: &str, error: Error) -> Error {
    match error {
        Error::Nntp(message) => Error::Group {
            group: group.to_string(),
            message,
        },
        other => other,
    }
}
