//! Merging classified articles into per-file records

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{FileRecord, ParsedSubject, SegmentRecord};

/// One matching article, classified and ready to merge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Group the article was found in
    pub group: String,
    /// Parsed subject
    pub parsed: ParsedSubject,
    /// Decoded poster
    pub poster: String,
    /// Post date, unix seconds, never negative
    pub date: i64,
    /// Message-ID as reported by the server (angle brackets allowed)
    pub message_id: String,
    /// Article size in bytes
    pub bytes: u64,
}

impl Observation {
    /// Job key: `md5(header ‖ poster ‖ total_files)`
    pub fn header_hash(&self) -> String {
        md5_hex(&format!(
            "{}{}{}",
            self.parsed.header, self.poster, self.parsed.total_files
        ))
    }

    /// File key within a job: `md5(header_hash ‖ filename ‖ total_segments)`
    pub fn file_hash(&self, header_hash: &str) -> String {
        md5_hex(&format!(
            "{}{}{}",
            header_hash, self.parsed.filename, self.parsed.total_segments
        ))
    }
}

fn md5_hex(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// Files of one posting, keyed by file hash
#[derive(Clone, Debug, Default)]
pub struct JobBucket {
    /// Header text shared by the posting's files
    pub header: String,
    /// Poster of the first observed article
    pub poster: String,
    files: HashMap<String, FileRecord>,
    file_order: Vec<String>,
}

impl JobBucket {
    /// Files in creation order
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.file_order.iter().filter_map(|key| self.files.get(key))
    }

    /// Total number of segments observed, duplicates included
    pub fn segment_count(&self) -> usize {
        self.files.values().map(|f| f.segments.len()).sum()
    }

    /// Consume the bucket, yielding files in creation order
    pub fn into_files(mut self) -> Vec<FileRecord> {
        self.file_order
            .iter()
            .filter_map(|key| self.files.remove(key))
            .collect()
    }
}

/// All postings found in one group scan, keyed by header hash
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    jobs: HashMap<String, JobBucket>,
    job_order: Vec<String>,
}

impl ResultSet {
    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of postings
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Postings in creation order
    pub fn jobs(&self) -> impl Iterator<Item = &JobBucket> {
        self.job_order.iter().filter_map(|key| self.jobs.get(key))
    }

    /// Consume the set, yielding postings in creation order
    pub fn into_jobs(mut self) -> Vec<JobBucket> {
        self.job_order
            .iter()
            .filter_map(|key| self.jobs.remove(key))
            .collect()
    }

    fn upsert(&mut self, observation: Observation) {
        let header_hash = observation.header_hash();
        let file_hash = observation.file_hash(&header_hash);

        let job = self.jobs.entry(header_hash.clone()).or_insert_with(|| {
            self.job_order.push(header_hash);
            JobBucket {
                header: observation.parsed.header.clone(),
                poster: observation.poster.clone(),
                ..Default::default()
            }
        });

        let file = job.files.entry(file_hash.clone()).or_insert_with(|| {
            job.file_order.push(file_hash);
            FileRecord {
                groups: vec![observation.group.clone()],
                subject: observation.parsed.subject.clone(),
                poster: observation.poster.clone(),
                number: observation.parsed.file,
                filename: observation.parsed.filename.clone(),
                basefilename: observation.parsed.basefilename.clone(),
                date: 0,
                segments: Vec::new(),
            }
        });

        // Only consecutive repeats are collapsed
        if file.groups.last() != Some(&observation.group) {
            file.groups.push(observation.group);
        }
        if observation.parsed.segment == 1 {
            file.subject = observation.parsed.subject;
        }
        file.date = file.date.max(observation.date);
        file.segments.push(SegmentRecord {
            number: observation.parsed.segment,
            message_id: observation
                .message_id
                .trim_matches(|c| c == '<' || c == '>')
                .to_string(),
            bytes: observation.bytes,
        });
    }
}

#[derive(Default)]
struct AggregatorState {
    results: ResultSet,
    closed: bool,
}

/// Thread-safe accumulator for one group scan.
///
/// Every upsert happens under a single lock. Once [`close`](Self::close) is
/// called, further observations are rejected.
#[derive(Default)]
pub struct ResultAggregator {
    state: Mutex<AggregatorState>,
}

impl ResultAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge one observation. Returns `false` if the aggregator is closed.
    pub fn observe(&self, observation: Observation) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.results.upsert(observation);
        true
    }

    /// Reject all further observations
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Whether [`close`](Self::close) was called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Take the accumulated results
    pub fn into_results(self) -> ResultSet {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .results
    }
}
