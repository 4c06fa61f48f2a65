//! Event collection helpers

use std::time::Duration;

use nzb_direct_search::SearchEvent;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Drain every event currently buffered in `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

/// Wait until a terminal event for some group arrives, or `timeout` passes
pub async fn wait_for_terminal_event(
    rx: &mut broadcast::Receiver<SearchEvent>,
    timeout: Duration,
) -> Option<SearchEvent> {
    tokio::time::timeout(timeout, async {
        loop {
            match rx.recv().await {
                Ok(
                    event @ (SearchEvent::Completed { .. }
                    | SearchEvent::GroupFailed { .. }
                    | SearchEvent::GroupEmpty { .. }),
                ) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Names of the groups that failed, in order
pub fn failed_groups(events: &[SearchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SearchEvent::GroupFailed { group, .. } => Some(group.clone()),
            _ => None,
        })
        .collect()
}
