//! Subject decoding and pattern matching

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// Decode an overview subject for matching and parsing.
///
/// HTML named and numeric entities are unescaped; a `&` that does not start a
/// known entity stays literal. U+FFFD replacement characters, left behind by
/// lossy decoding of invalid byte sequences, are dropped.
pub fn decode_subject(raw: &str) -> String {
    let cleaned: Cow<'_, str> = if raw.contains(char::REPLACEMENT_CHARACTER) {
        Cow::Owned(raw.replace(char::REPLACEMENT_CHARACTER, ""))
    } else {
        Cow::Borrowed(raw)
    };

    html_escape::decode_html_entities(&cleaned).into_owned()
}

/// Case-insensitive literal substring matcher
#[derive(Debug, Clone)]
pub struct SubjectMatcher {
    regex: Regex,
}

impl SubjectMatcher {
    /// Build a matcher for `pattern`; regex metacharacters match literally
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&regex::escape(pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::config(format!("invalid header pattern: {e}"), "header"))?;
        Ok(Self { regex })
    }

    /// Whether `subject` contains the pattern
    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_html_entities() {
        assert_eq!(
            decode_subject("Tom &amp; Jerry &quot;ep1.mkv&quot; yEnc (1/2)"),
            "Tom & Jerry \"ep1.mkv\" yEnc (1/2)"
        );
        assert_eq!(decode_subject("caf&#233;"), "café");
    }

    #[test]
    fn drops_replacement_characters() {
        assert_eq!(decode_subject("bad\u{FFFD}bytes\u{FFFD}"), "badbytes");
    }

    #[test]
    fn bare_ampersand_stays_literal() {
        assert_eq!(decode_subject("Fish & Chips"), "Fish & Chips");
        assert_eq!(decode_subject("Rock &amp; Roll & Co"), "Rock & Roll & Co");
    }

    #[test]
    fn decodes_entities_beyond_xml_set() {
        assert_eq!(decode_subject("Caf&eacute; &amp; Bar"), "Caf\u{e9} & Bar");
        assert_eq!(decode_subject("Part&nbsp;1 &hellip; &#x41;"), "Part\u{a0}1 \u{2026} A");
    }

    #[test]
    fn decoded_subject_with_bare_ampersand_matches() {
        let matcher = SubjectMatcher::new("Rock & Roll").unwrap();
        let subject = decode_subject(r#"Rock &amp; Roll & Co [1/1] - "a.rar" yEnc (1/1)"#);
        assert!(matcher.is_match(&subject), "decoded: {subject}");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(decode_subject("My.Binary.Post (1/5)"), "My.Binary.Post (1/5)");
    }

    #[test]
    fn matcher_is_case_insensitive() {
        let matcher = SubjectMatcher::new("My.Binary.Post").unwrap();
        assert!(matcher.is_match("[1/3] - \"my.binary.post.part1.rar\" yEnc (1/5)"));
        assert!(matcher.is_match("MY.BINARY.POST"));
    }

    #[test]
    fn matcher_treats_metacharacters_literally() {
        let matcher = SubjectMatcher::new("My.Binary.Post").unwrap();
        assert!(
            !matcher.is_match("MyXBinaryXPost"),
            "dots must not match arbitrary characters"
        );

        let matcher = SubjectMatcher::new("Show (2024) [1080p]").unwrap();
        assert!(matcher.is_match("show (2024) [1080P] - \"a.mkv\" yEnc (1/9)"));
    }
}
