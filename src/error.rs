//! Error types for nzb-direct-search
//!
//! This module provides the error taxonomy for a direct search:
//! - Caller-input errors ([`Error::Config`]) that abort the search immediately
//! - Per-group errors ([`Error::Group`], [`Error::Boundary`], [`Error::Scan`]) that
//!   are logged and swallowed by the group loop
//! - The terminal [`Error::NoResultsFound`] once every group has been tried

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for nzb-direct-search operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nzb-direct-search
///
/// Each variant carries enough context (group name, article range) to diagnose
/// which part of a search failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or request validation error
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "groups")
        key: Option<String>,
    },

    /// Group could not be selected (missing group, connection failure)
    #[error("group '{group}' unavailable: {message}")]
    Group {
        /// The newsgroup that could not be selected
        group: String,
        /// Reason reported by the server or transport
        message: String,
    },

    /// Date-boundary search could not establish a scan interval
    #[error("boundary search failed in group '{group}': {kind}")]
    Boundary {
        /// The newsgroup being searched
        group: String,
        /// Which boundary condition failed
        kind: BoundaryError,
    },

    /// A scan chunk failed; sibling chunks were cancelled
    #[error("scan of articles {first}-{last} in group '{group}' failed: {message}")]
    Scan {
        /// The newsgroup being scanned
        group: String,
        /// First article number of the failed chunk
        first: u64,
        /// Last article number of the failed chunk
        last: u64,
        /// Underlying failure
        message: String,
    },

    /// No group produced a matching posting
    #[error("no results found")]
    NoResultsFound,

    /// NNTP protocol or connection error
    #[error("NNTP error: {0}")]
    Nntp(String),
}

/// Reasons a date-boundary search cannot produce a scan interval
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryError {
    /// The requested date predates the oldest retained article of the group
    #[error("post date is older than oldest message of this group")]
    TargetOlderThanRetention,

    /// The overview returned no records where some were expected
    #[error("no messages found within search range")]
    NoMessagesInRange,

    /// The lower boundary is not below the upper boundary
    #[error("empty search range: lower boundary {lower} is not below upper boundary {upper}")]
    EmptyRange {
        /// Article number of the lower (oldest) boundary
        lower: u64,
        /// Article number of the upper (newest) boundary
        upper: u64,
    },
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build a boundary error for a group
    pub fn boundary(group: impl Into<String>, kind: BoundaryError) -> Self {
        Error::Boundary {
            group: group.into(),
            kind,
        }
    }

    /// Whether this error ends the whole search rather than a single group
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config { .. } | Error::NoResultsFound)
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Group { .. } => "group_error",
            Error::Boundary { kind, .. } => match kind {
                BoundaryError::TargetOlderThanRetention => "target_older_than_retention",
                BoundaryError::NoMessagesInRange => "no_messages_in_range",
                BoundaryError::EmptyRange { .. } => "empty_range",
            },
            Error::Scan { .. } => "scan_error",
            Error::NoResultsFound => "no_results_found",
            Error::Nntp(_) => "nntp_error",
        }
    }
}

impl From<nntp_rs::NntpError> for Error {
    fn from(error: nntp_rs::NntpError) -> Self {
        match error {
            nntp_rs::NntpError::NoSuchGroup(group) => Error::Group {
                group,
                message: "no such newsgroup".to_string(),
            },
            other => Error::Nntp(other.to_string()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_config_and_no_results_are_fatal() {
        let cases = [
            (Error::config("No groups provided", "groups"), true),
            (Error::NoResultsFound, true),
            (
                Error::Group {
                    group: "alt.binaries.test".into(),
                    message: "no such newsgroup".into(),
                },
                false,
            ),
            (
                Error::boundary("alt.binaries.test", BoundaryError::NoMessagesInRange),
                false,
            ),
            (
                Error::Scan {
                    group: "alt.binaries.test".into(),
                    first: 1,
                    last: 20000,
                    message: "connection reset".into(),
                },
                false,
            ),
            (Error::Nntp("timeout".into()), false),
        ];

        for (error, fatal) in cases {
            assert_eq!(error.is_fatal(), fatal, "{error:?} fatal should be {fatal}");
        }
    }

    #[test]
    fn boundary_error_codes_distinguish_kinds() {
        assert_eq!(
            Error::boundary("g", BoundaryError::TargetOlderThanRetention).error_code(),
            "target_older_than_retention"
        );
        assert_eq!(
            Error::boundary("g", BoundaryError::NoMessagesInRange).error_code(),
            "no_messages_in_range"
        );
        assert_eq!(
            Error::boundary("g", BoundaryError::EmptyRange { lower: 5, upper: 5 }).error_code(),
            "empty_range"
        );
    }

    #[test]
    fn scan_error_message_names_group_and_range() {
        let err = Error::Scan {
            group: "alt.binaries.misc".into(),
            first: 100,
            last: 199,
            message: "broken pipe".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("alt.binaries.misc"), "got: {msg}");
        assert!(msg.contains("100-199"), "got: {msg}");
        assert!(msg.contains("broken pipe"), "got: {msg}");
    }

    #[test]
    fn no_such_group_converts_to_group_error() {
        let err: Error = nntp_rs::NntpError::NoSuchGroup("alt.gone".into()).into();
        match err {
            Error::Group { group, .. } => assert_eq!(group, "alt.gone"),
            other => panic!("expected Group error, got {other:?}"),
        }
    }

    #[test]
    fn transport_errors_convert_to_nntp_error() {
        let err: Error = nntp_rs::NntpError::ConnectionClosed.into();
        assert!(matches!(err, Error::Nntp(_)), "got {err:?}");
    }

    #[test]
    fn boundary_error_serializes_with_kind_tag() {
        let json = serde_json::to_value(BoundaryError::EmptyRange { lower: 10, upper: 3 }).unwrap();
        assert_eq!(json["kind"], "empty_range");
        assert_eq!(json["lower"], 10);
        assert_eq!(json["upper"], 3);
    }
}
