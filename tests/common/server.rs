//! Synthetic news server for end-to-end tests
//!
//! Groups hold articles `first..=last` whose dates grow by a fixed spacing.
//! Selected articles are replaced by yEnc posting segments.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nzb_direct_search::{
    Error, GroupRange, NewsConnection, NewsSource, OverviewRecord, Result,
};

/// Date of article 0 in every synthetic group
pub const BASE_DATE: i64 = 1_650_000_000;

/// Seconds between consecutive articles
pub const SPACING: i64 = 10;

/// Date of article `number`
pub fn date_of(number: u64) -> i64 {
    BASE_DATE + number as i64 * SPACING
}

/// One synthetic newsgroup
#[derive(Clone, Debug)]
pub struct SyntheticGroup {
    pub name: String,
    pub first: u64,
    pub last: u64,
    postings: BTreeMap<u64, (String, String)>,
}

impl SyntheticGroup {
    pub fn new(name: &str, first: u64, last: u64) -> Self {
        Self {
            name: name.to_string(),
            first,
            last,
            postings: BTreeMap::new(),
        }
    }

    /// Post `files` files of `segments` segments each, starting at article `at`.
    ///
    /// Segments are posted in reverse so results must be sorted.
    pub fn with_posting(self, header: &str, at: u64, files: u32, segments: u32) -> Self {
        self.with_spread_posting(header, at, 1, files, segments)
    }

    /// Like [`with_posting`](Self::with_posting), with `gap` articles between segments
    pub fn with_spread_posting(
        mut self,
        header: &str,
        at: u64,
        gap: u64,
        files: u32,
        segments: u32,
    ) -> Self {
        let mut number = at;
        for file in (1..=files).rev() {
            for segment in (1..=segments).rev() {
                let subject = format!(
                    r#"{header} [{file}/{files}] - "{header}.part{file}.rar" yEnc ({segment}/{segments})"#
                );
                let message_id = format!("{header}.{file}.{segment}@synthetic");
                self.postings.insert(number, (subject, message_id));
                number += gap;
            }
        }
        self
    }

    fn record(&self, number: u64) -> OverviewRecord {
        let (subject, message_id, poster, bytes) = match self.postings.get(&number) {
            Some((subject, id)) => (subject.clone(), id.clone(), "uploader@synthetic", 716_800),
            None => (
                format!("Re: discussion thread {number}"),
                format!("chatter{number}@synthetic"),
                "chatter@synthetic",
                2_048,
            ),
        };
        OverviewRecord {
            number,
            subject,
            poster: poster.to_string(),
            date: date_of(number),
            message_id: format!("<{message_id}>"),
            bytes,
        }
    }
}

/// In-memory [`NewsSource`] serving [`SyntheticGroup`]s
#[derive(Default)]
pub struct SyntheticServer {
    groups: HashMap<String, SyntheticGroup>,
    /// Number of connections handed out
    pub connections: AtomicUsize,
    /// Number of overview requests served
    pub overviews: AtomicUsize,
}

impl SyntheticServer {
    pub fn new(groups: Vec<SyntheticGroup>) -> Arc<Self> {
        Arc::new(Self {
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
            ..Default::default()
        })
    }

    pub fn overview_count(&self) -> usize {
        self.overviews.load(Ordering::SeqCst)
    }
}

struct SyntheticConnection<'a> {
    server: &'a SyntheticServer,
    group: Option<&'a SyntheticGroup>,
}

#[async_trait]
impl NewsSource for SyntheticServer {
    async fn connect(&self) -> Result<Box<dyn NewsConnection + '_>> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticConnection {
            server: self,
            group: None,
        }))
    }
}

#[async_trait]
impl NewsConnection for SyntheticConnection<'_> {
    async fn select_group(&mut self, group: &str) -> Result<GroupRange> {
        let found = self.server.groups.get(group).ok_or_else(|| Error::Group {
            group: group.to_string(),
            message: "411 no such newsgroup".to_string(),
        })?;
        self.group = Some(found);
        Ok(GroupRange {
            group: found.name.clone(),
            first: found.first,
            last: found.last,
        })
    }

    async fn overview(&mut self, first: u64, last: u64) -> Result<Vec<OverviewRecord>> {
        self.server.overviews.fetch_add(1, Ordering::SeqCst);
        let group = self
            .group
            .ok_or_else(|| Error::Nntp("412 no newsgroup selected".to_string()))?;
        Ok((first.max(group.first)..=last.min(group.last))
            .map(|n| group.record(n))
            .collect())
    }
}
