//! Article document parsing.
//!
//! Articles follow a small header convention: `key: value` lines, a blank
//! line, then the body.
//!
//! ```text
//! date: 2019-04-01
//! title: First Post
//!
//! This is my first post.
//! ```
//!
//! The header may also be fenced by `---` lines. Without a fence, the lines
//! up to the first blank line form a header only if every one of them is a
//! `key: value` line; otherwise the whole document is body. Malformed lines
//! are only an error inside a fence. An empty `date:` means no date.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Structured fields extracted from a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub date: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub body: String,
    /// Every other header field, keyed by lower-cased name.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is not valid UTF-8")]
    NotUtf8,

    #[error("line {line}: expected `key: value`, got {text:?}")]
    MalformedHeader { line: usize, text: String },

    #[error("unrecognized date {0:?}")]
    InvalidDate(String),

    #[error("header fence opened but never closed")]
    UnclosedFence,
}

/// Turns raw file bytes into a [`ParsedDocument`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<ParsedDocument, ParseError>;
}

/// Parser for the `key: value` header convention.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderParser;

const FENCE: &str = "---";

fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !value.starts_with("//");
    valid.then(|| (key, value.trim()))
}

/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, and `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let value = value.trim().trim_matches('"');
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc());
        }
    }
    Err(ParseError::InvalidDate(value.to_string()))
}

impl HeaderParser {
    fn parse_str(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text.lines().collect();

        let fenced = lines.first().is_some_and(|l| l.trim_end() == FENCE);
        let (header_lines, body_start, first_line_no) = if fenced {
            let close = lines
                .iter()
                .skip(1)
                .position(|l| l.trim_end() == FENCE)
                .ok_or(ParseError::UnclosedFence)?
                + 1;
            (&lines[1..close], close + 1, 2)
        } else {
            let end = lines
                .iter()
                .position(|l| l.trim().is_empty())
                .unwrap_or(lines.len());
            let candidate = &lines[..end];
            let is_header =
                !candidate.is_empty() && candidate.iter().all(|l| split_header_line(l).is_some());
            if is_header {
                (candidate, end + 1, 1)
            } else {
                (&lines[..0], 0, 1)
            }
        };

        let mut doc = ParsedDocument::default();
        for (offset, line) in header_lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) =
                split_header_line(line).ok_or_else(|| ParseError::MalformedHeader {
                    line: first_line_no + offset,
                    text: line.to_string(),
                })?;
            match key.to_ascii_lowercase().as_str() {
                "date" if value.is_empty() => doc.date = None,
                "date" => doc.date = Some(parse_date(value)?),
                "title" => doc.title = Some(value.to_string()),
                other => {
                    doc.fields.insert(other.to_string(), value.to_string());
                }
            }
        }

        let body_lines = lines.get(body_start..).unwrap_or(&[]);
        doc.body = body_lines.join("\n").trim_end().to_string();
        Ok(doc)
    }
}

impl DocumentParser for HeaderParser {
    fn parse(&self, raw: &[u8]) -> Result<ParsedDocument, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;
        self.parse_str(text)
    }
}
