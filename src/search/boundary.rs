//! Date-boundary search
//!
//! Article numbers grow with post dates, so a binary search over the numbering
//! space converts a timestamp into an approximate article number. The search
//! probes single overview records until the remaining width drops below
//! [`EXHAUSTIVE_WIDTH`], then reads a window around the cursor record by record.

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, Error, Result};
use crate::source::NewsConnection;
use crate::types::GroupRange;

use super::progress::ProgressSink;

/// Overview span of the first probe; tolerates gaps at the start of a group
pub const FIRST_PROBE_SPAN: u64 = 2000;

/// Overview span of later probes; tolerates expired or cancelled articles
pub const PROBE_SPAN: u64 = 100;

/// Width below which the search switches to reading a window exhaustively
pub const EXHAUSTIVE_WIDTH: u64 = 1000;

/// Which end of the scan interval is being located
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundKind {
    /// Newest article to scan: the target date itself
    Upper,
    /// Oldest article to scan: the target date minus the lookback window
    Lower,
}

/// Locate the first article posted after `bound` within `range`.
///
/// On the very first probe, an article already newer than `bound` means the
/// bound predates retention: for [`BoundKind::Upper`] there is nothing to scan
/// and the search fails with [`BoundaryError::TargetOlderThanRetention`], for
/// [`BoundKind::Lower`] scanning simply starts at that article.
///
/// If no article in the final window is newer than `bound`, the last article
/// of the window is returned. `progress` always receives `finish()`.
pub async fn locate_boundary<C>(
    conn: &mut C,
    range: &GroupRange,
    bound: i64,
    kind: BoundKind,
    progress: &dyn ProgressSink,
) -> Result<u64>
where
    C: NewsConnection + ?Sized,
{
    let result = search(conn, range, bound, kind, progress).await;
    progress.finish();
    result
}

async fn search<C>(
    conn: &mut C,
    range: &GroupRange,
    bound: i64,
    kind: BoundKind,
    progress: &dyn ProgressSink,
) -> Result<u64>
where
    C: NewsConnection + ?Sized,
{
    let empty = || Error::boundary(&range.group, BoundaryError::NoMessagesInRange);
    if range.is_empty() {
        return Err(empty());
    }

    let total = range.last - range.first;
    let mut cursor = range.first;
    let mut width = total;
    let mut first_probe = true;
    progress.set_progress(0, total);

    while width >= EXHAUSTIVE_WIDTH {
        let span = if first_probe { FIRST_PROBE_SPAN } else { PROBE_SPAN };
        let probe_last = cursor.saturating_add(span).min(range.last);
        let records = conn.overview(cursor, probe_last).await?;
        let record = records.first().ok_or_else(empty)?;
        width /= 2;

        tracing::debug!(
            group = %range.group,
            ?kind,
            cursor,
            article = record.number,
            date = record.date,
            bound,
            width,
            "boundary probe"
        );

        if first_probe && record.date > bound {
            return match kind {
                BoundKind::Upper => Err(Error::boundary(
                    &range.group,
                    BoundaryError::TargetOlderThanRetention,
                )),
                BoundKind::Lower => Ok(record.number),
            };
        }
        first_probe = false;

        if record.date < bound {
            cursor = cursor.saturating_add(width).min(range.last);
        } else if record.date > bound {
            cursor = cursor.saturating_sub(width).max(range.first);
        }
        progress.advance(width);
    }

    let window_first = cursor.saturating_sub(EXHAUSTIVE_WIDTH).max(range.first);
    let window_last = cursor.saturating_add(EXHAUSTIVE_WIDTH).min(range.last);
    let records = conn.overview(window_first, window_last).await?;

    let found = records
        .iter()
        .find(|r| r.date > bound)
        .or_else(|| records.last())
        .map(|r| r.number)
        .ok_or_else(empty)?;

    progress.set_progress(total, total);
    tracing::debug!(group = %range.group, ?kind, article = found, "boundary located");
    Ok(found)
}
