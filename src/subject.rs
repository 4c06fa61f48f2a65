//! Subject parsing for yEnc binary postings
//!
//! Posters follow a loose convention:
//!
//! ```text
//! My.Binary.Post [1/3] - "My.Binary.Post.part1.rar" yEnc (1/5)
//! ```
//!
//! The trailing `(segment/total)` counter is mandatory, the `[file/total]`
//! counter and the quotes around the filename are optional.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::types::ParsedSubject;

/// Why a subject could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectParseError {
    /// No `(segment/total)` counter
    #[error("subject has no segment counter")]
    MissingSegmentCounter,

    /// No recognisable filename
    #[error("subject has no filename")]
    MissingFilename,

    /// A counter is zero or its index exceeds its total
    #[error("invalid counter {index}/{total}")]
    InvalidCounter {
        /// Index part of the counter
        index: u32,
        /// Total part of the counter
        total: u32,
    },
}

/// Turns a decoded subject into structured posting metadata
pub trait SubjectParser: Send + Sync {
    /// Parse a decoded subject line
    fn parse(&self, subject: &str) -> Result<ParsedSubject, SubjectParseError>;
}

static SEGMENT_COUNTER: OnceLock<Regex> = OnceLock::new();
static FILE_COUNTER: OnceLock<Regex> = OnceLock::new();
static QUOTED_FILENAME: OnceLock<Regex> = OnceLock::new();
static BARE_FILENAME: OnceLock<Regex> = OnceLock::new();
static YENC_MARKER: OnceLock<Regex> = OnceLock::new();
static BASE_FILENAME: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid subject regex"))
}

/// `(segment/total)`, the last occurrence wins
fn segment_counter() -> &'static Regex {
    compiled(&SEGMENT_COUNTER, r"\((\d+)\s*/\s*(\d+)\)")
}

/// `[file/total]`
fn file_counter() -> &'static Regex {
    compiled(&FILE_COUNTER, r"\[(\d+)\s*/\s*(\d+)\]")
}

fn quoted_filename() -> &'static Regex {
    compiled(&QUOTED_FILENAME, r#""([^"]+)""#)
}

/// Last token with an extension, optionally followed by a size and `yEnc`
fn bare_filename() -> &'static Regex {
    compiled(
        &BARE_FILENAME,
        r"(?i)([^\s\[\]()]+\.[a-z0-9]{1,5})(?:\s+\d+)?\s*(?:yenc)?\s*$",
    )
}

/// `yEnc` marker plus an adjacent byte size
fn yenc_marker() -> &'static Regex {
    compiled(&YENC_MARKER, r"(?i)(?:\b\d+\s+)?\byenc\b(?:\s+\d+)?")
}

fn base_filename_regex() -> &'static Regex {
    compiled(
        &BASE_FILENAME,
        r"(?i)^(.+?)(?:\.part\d+|\.vol\d+[+\-]\d+)?(?:\.[a-z0-9]{1,5})?(?:\.\d{3})?$",
    )
}

/// Regex-based parser for yEnc-style subjects
#[derive(Debug, Clone, Copy, Default)]
pub struct YencSubjectParser;

impl SubjectParser for YencSubjectParser {
    fn parse(&self, subject: &str) -> Result<ParsedSubject, SubjectParseError> {
        let subject = subject.trim();

        let segment_match = segment_counter()
            .captures_iter(subject)
            .last()
            .ok_or(SubjectParseError::MissingSegmentCounter)?;
        let (segment, total_segments) = counter(&segment_match)?;
        let counter_span = segment_match
            .get(0)
            .map(|m| m.range())
            .ok_or(SubjectParseError::MissingSegmentCounter)?;

        // Everything except the segment counter
        let mut rest = String::with_capacity(subject.len());
        rest.push_str(&subject[..counter_span.start]);
        rest.push(' ');
        rest.push_str(&subject[counter_span.end..]);

        let (filename, rest) = extract_filename(&rest)?;

        let file_counter_value = file_counter()
            .captures(&rest)
            .map(|caps| counter(&caps))
            .transpose()?;
        let (file, total_files, rest) = match file_counter_value {
            Some((file, total)) => {
                let stripped = file_counter().replace(&rest, " ").into_owned();
                (file, total, stripped)
            }
            None => (1, 1, rest),
        };

        let header = clean_header(&rest);
        let basefilename = base_filename(&filename);

        Ok(ParsedSubject {
            header,
            subject: subject.to_string(),
            basefilename,
            filename,
            file,
            total_files,
            segment,
            total_segments,
        })
    }
}

fn counter(caps: &regex::Captures<'_>) -> Result<(u32, u32), SubjectParseError> {
    let parse = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let (index, total) = (parse(1), parse(2));
    if index == 0 || total == 0 || index > total {
        return Err(SubjectParseError::InvalidCounter { index, total });
    }
    Ok((index, total))
}

/// Split the filename off the subject, returning it and the remaining text
fn extract_filename(text: &str) -> Result<(String, String), SubjectParseError> {
    if let Some(m) = quoted_filename()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter(|m| !m.as_str().trim().is_empty())
        .last()
    {
        let filename = m.as_str().trim().to_string();
        let before = &text[..m.start().saturating_sub(1)];
        let after = &text[(m.end() + 1).min(text.len())..];
        let rest = format!("{before} {after}");
        return Ok((filename, rest));
    }

    let caps = bare_filename()
        .captures(text.trim_end())
        .ok_or(SubjectParseError::MissingFilename)?;
    let m = caps.get(1).ok_or(SubjectParseError::MissingFilename)?;
    let filename = m.as_str().to_string();
    let rest = text[..m.start()].to_string();
    Ok((filename, rest))
}

fn clean_header(text: &str) -> String {
    let without_marker = yenc_marker().replace_all(text, " ");
    let collapsed = without_marker.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '-' || c == '"' || c.is_whitespace())
        .to_string()
}

/// Filename without `.partNN`/`.volNN+NN` markers, extension and split suffix
pub fn base_filename(filename: &str) -> String {
    base_filename_regex()
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| filename.to_string())
}
