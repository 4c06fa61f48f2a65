//! Core types for nzb-direct-search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, non_zero_or};
use crate::error::{Error, Result};

/// Seconds in one day, used to turn the lookback window into an offset
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Parameters of a single direct search
///
/// Numeric tunables left at zero are filled from [`SearchConfig`] when the
/// search starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Literal text to look for in article subjects (case-insensitive)
    pub header: String,
    /// Groups to search, in order; the first group with a hit wins
    pub groups: Vec<String>,
    /// Target post date as unix seconds; articles at or after it are ignored
    pub date: i64,
    /// Lookback window before `date`, in days
    #[serde(default)]
    pub days: u32,
    /// Maximum number of NNTP connections used while scanning
    #[serde(default)]
    pub connections: usize,
    /// Maximum number of chunks scanned concurrently
    #[serde(default)]
    pub scans: usize,
    /// Number of articles per scan chunk
    #[serde(default)]
    pub step: u64,
}

impl SearchRequest {
    /// Create a request with default tunables
    pub fn new(header: impl Into<String>, groups: Vec<String>, date: i64) -> Self {
        Self {
            header: header.into(),
            groups,
            date,
            ..Default::default()
        }
    }

    /// Create a request targeting a [`DateTime`]
    pub fn at(header: impl Into<String>, groups: Vec<String>, date: DateTime<Utc>) -> Self {
        Self::new(header, groups, date.timestamp())
    }

    /// Check the caller-supplied fields
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::config("No groups provided", "groups"));
        }
        if self.date == 0 {
            return Err(Error::config("No date provided", "date"));
        }
        Ok(())
    }

    /// Copy of this request with zero tunables replaced from `defaults`
    pub fn resolved(&self, defaults: &SearchConfig) -> Self {
        let defaults = defaults.with_builtin_defaults();
        Self {
            header: self.header.clone(),
            groups: self.groups.clone(),
            date: self.date,
            days: non_zero_or(self.days, defaults.days),
            connections: non_zero_or(self.connections, defaults.connections),
            scans: non_zero_or(self.scans, defaults.scans),
            step: non_zero_or(self.step, defaults.step),
        }
    }

    /// Number of chunks scanned at once: the smaller of the two ceilings
    pub fn scan_ceiling(&self) -> usize {
        self.connections.min(self.scans).max(1)
    }

    /// Lower date bound of the search window
    pub fn window_start(&self) -> i64 {
        self.date - i64::from(self.days) * SECONDS_PER_DAY
    }
}

/// Valid article interval of a newsgroup as reported by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRange {
    /// Newsgroup name
    pub group: String,
    /// First (oldest) article number
    pub first: u64,
    /// Last (newest) article number, inclusive
    pub last: u64,
}

impl GroupRange {
    /// Clamp an inclusive article interval to this range.
    ///
    /// Returns `None` when the interval lies entirely outside the range.
    pub fn clamp(&self, first: u64, last: u64) -> Option<(u64, u64)> {
        let first = first.max(self.first);
        let last = last.min(self.last);
        (first <= last).then_some((first, last))
    }

    /// Number of articles in the range
    pub fn len(&self) -> u64 {
        if self.last < self.first {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Whether the range holds no articles
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One line of an overview (XOVER) response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRecord {
    /// Article number within the group
    pub number: u64,
    /// Raw subject; may contain HTML entities or replacement characters
    pub subject: String,
    /// Poster (From header)
    pub poster: String,
    /// Post date as unix seconds (0 when unparseable)
    pub date: i64,
    /// Message-ID, usually with angle brackets
    pub message_id: String,
    /// Article size in bytes
    pub bytes: u64,
}

/// Structured metadata extracted from a binary posting's subject
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSubject {
    /// Subject text shared by every file of the posting
    pub header: String,
    /// Canonical subject line for the file
    pub subject: String,
    /// Filename without volume/part suffixes and extension
    pub basefilename: String,
    /// Full filename
    pub filename: String,
    /// 1-based index of this file within the posting
    pub file: u32,
    /// Number of files in the posting
    pub total_files: u32,
    /// 1-based index of this segment within the file
    pub segment: u32,
    /// Number of segments in the file
    pub total_segments: u32,
}

/// A segment (article) of a reconstructed file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// 1-based segment number
    pub number: u32,
    /// Message-ID without angle brackets
    pub message_id: String,
    /// Article size in bytes
    pub bytes: u64,
}

/// A file reconstructed from its segments
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Groups the file was seen in, first-seen order
    pub groups: Vec<String>,
    /// Subject line (taken from segment 1 when it was seen)
    pub subject: String,
    /// Poster of the first observed segment
    pub poster: String,
    /// 1-based index of this file within the posting
    pub number: u32,
    /// Full filename
    pub filename: String,
    /// Filename without volume/part suffixes and extension
    pub basefilename: String,
    /// Most recent post date seen, unix seconds
    pub date: i64,
    /// Segments in observation order until finalization
    pub segments: Vec<SegmentRecord>,
}

impl FileRecord {
    /// Total size of all segments in bytes
    pub fn total_bytes(&self) -> u64 {
        self.segments.iter().map(|s| s.bytes).sum()
    }
}

/// Final result of a direct search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Group in which the posting was found
    pub group: String,
    /// Header text shared by the posting's files
    pub header: String,
    /// Files sorted by file index, segments sorted and unique
    pub files: Vec<FileRecord>,
}

impl SearchResult {
    /// Total size of all files in bytes
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(FileRecord::total_bytes).sum()
    }

    /// Total number of segments across all files
    pub fn segment_count(&self) -> usize {
        self.files.iter().map(|f| f.segments.len()).sum()
    }

    /// Convert into an [`nntp_rs::Nzb`] for serialization with `to_xml`
    pub fn into_nzb(self) -> nntp_rs::Nzb {
        let mut meta = std::collections::HashMap::new();
        if !self.header.is_empty() {
            meta.insert("title".to_string(), self.header);
        }

        let files = self
            .files
            .into_iter()
            .map(|file| nntp_rs::NzbFile {
                poster: file.poster,
                date: file.date,
                subject: file.subject,
                groups: file.groups,
                segments: file
                    .segments
                    .into_iter()
                    .map(|s| nntp_rs::NzbSegment {
                        bytes: s.bytes,
                        number: s.number,
                        message_id: s.message_id,
                    })
                    .collect(),
            })
            .collect();

        nntp_rs::Nzb { meta, files }
    }
}

/// How one posting is chosen when a group holds several matching postings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// The posting whose first segment was observed first
    #[default]
    FirstFound,
    /// The posting with the most segments (ties go to the one found first)
    MostSegments,
}

/// Phase of a group search, used for progress reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Locating the article closest to the target date
    UpperBoundary,
    /// Locating the article closest to the start of the lookback window
    LowerBoundary,
    /// Scanning overviews between the two boundaries
    Scanning,
}

/// Event emitted during a direct search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// Search of a group started
    GroupStarted {
        /// Newsgroup name
        group: String,
    },

    /// Progress update for a phase
    Progress {
        /// Newsgroup name
        group: String,
        /// Phase being reported
        phase: SearchPhase,
        /// Units done so far
        current: u64,
        /// Total units
        total: u64,
    },

    /// A phase reached its terminal state
    PhaseFinished {
        /// Newsgroup name
        group: String,
        /// Phase that finished
        phase: SearchPhase,
    },

    /// Group search failed; the search continues with the next group
    GroupFailed {
        /// Newsgroup name
        group: String,
        /// Error message
        error: String,
    },

    /// Group was scanned without finding a matching posting
    GroupEmpty {
        /// Newsgroup name
        group: String,
    },

    /// A matching posting was found and finalized
    Completed {
        /// Newsgroup name
        group: String,
        /// Number of files in the result
        files: usize,
        /// Number of segments in the result
        segments: usize,
    },
}
