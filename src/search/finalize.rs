//! Selecting one posting and normalising it into a [`SearchResult`]

use crate::types::{FileRecord, SearchResult, SelectionStrategy};

use super::aggregator::{JobBucket, ResultSet};

/// Pick one posting from `results` and normalise it.
///
/// Returns `None` for an empty result set. Segments are deduplicated by
/// number, keeping the smallest message id, then sorted; files are sorted by
/// file index, ties broken by filename.
pub fn finalize(
    group: &str,
    results: ResultSet,
    strategy: SelectionStrategy,
) -> Option<SearchResult> {
    let job = select(results, strategy)?;
    let header = job.header.clone();

    let mut files: Vec<FileRecord> = job.into_files();
    for file in &mut files {
        normalize_segments(file);
    }
    files.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.filename.cmp(&b.filename)));

    Some(SearchResult {
        group: group.to_string(),
        header,
        files,
    })
}

fn select(results: ResultSet, strategy: SelectionStrategy) -> Option<JobBucket> {
    let jobs = results.into_jobs();
    match strategy {
        SelectionStrategy::FirstFound => jobs.into_iter().next(),
        SelectionStrategy::MostSegments => {
            let mut best: Option<JobBucket> = None;
            for job in jobs {
                let better = best
                    .as_ref()
                    .is_none_or(|b| job.segment_count() > b.segment_count());
                if better {
                    best = Some(job);
                }
            }
            best
        }
    }
}

fn normalize_segments(file: &mut FileRecord) {
    file.segments.sort_by(|a, b| {
        a.number
            .cmp(&b.number)
            .then_with(|| a.message_id.cmp(&b.message_id))
    });
    file.segments.dedup_by_key(|s| s.number);
}
