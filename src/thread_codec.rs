//! Flat comment-thread encoding
//!
//! The store has no separate reply entity: a comment annotation's
//! `content` field holds the quoted source text, the original comment,
//! and every reply as one `\n\n`-joined string, replies marked with a
//! literal `Reply:` prefix. This module is the compatibility layer for
//! that format; [`Thread`] is the structured in-memory representation.
//!
//! The format does not escape `\n\n` inside reply bodies. A reply
//! containing the delimiter splits into extra entries on decode. That
//! matches the data already in production stores and is kept as-is.

use serde::{Deserialize, Serialize};

const DELIMITER: &str = "\n\n";
const REPLY_MARKER: &str = "Reply:";

/// Whether a thread entry is the original comment or a reply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Comment,
    Reply,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl ThreadEntry {
    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Comment,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Reply,
            text: text.into(),
        }
    }
}

/// A decoded comment thread: the quoted source text plus the
/// chronological list of comment/reply entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub quoted_text: String,
    pub entries: Vec<ThreadEntry>,
}

impl Thread {
    /// The original comment body, if the thread has one.
    #[must_use]
    pub fn original_comment(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Comment)
            .map(|e| e.text.as_str())
    }

    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Reply)
            .count()
    }
}

/// Build the flat content string for a fresh comment thread.
///
/// The quoted text is wrapped in double quotes the way the viewer always
/// has; [`decode`] strips them again.
#[must_use]
pub fn encode(quoted_text: &str, comment: &str) -> String {
    format!("\"{quoted_text}\"{DELIMITER}{comment}")
}

/// Append one reply to an encoded thread. Each call appends exactly one
/// element; duplicate reply text is not deduplicated.
#[must_use]
pub fn append_reply(content: &str, reply_text: &str) -> String {
    format!("{content}{DELIMITER}{REPLY_MARKER}{reply_text}")
}

/// Decode a flat content string into a [`Thread`].
///
/// Element 0 is the quoted text (surrounding quote characters stripped);
/// element 1 the original comment; later elements are replies when they
/// carry the `Reply:` marker. Unmarked later elements are kept as
/// comment entries, which tolerates malformed legacy records.
#[must_use]
pub fn decode(content: &str) -> Thread {
    let mut parts = content.split(DELIMITER);

    let quoted_text = parts
        .next()
        .map(strip_quotes)
        .unwrap_or_default()
        .to_string();

    let mut entries = Vec::new();
    for (index, part) in parts.enumerate() {
        if index == 0 {
            entries.push(ThreadEntry::comment(part));
        } else if let Some(rest) = part.strip_prefix(REPLY_MARKER) {
            entries.push(ThreadEntry::reply(rest));
        } else {
            entries.push(ThreadEntry::comment(part));
        }
    }

    Thread {
        quoted_text,
        entries,
    }
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches('"')
}
