//! Export file naming

use regex::Regex;

/// Longest filename stem we will emit, in bytes. Filesystem limits sit
/// around 255 bytes for the whole name; this leaves room for the
/// `_annotations` suffix and extension.
const MAX_STEM_BYTES: usize = 200;

/// Sanitize a document title into a safe cross-platform filename.
/// Strips characters invalid on Windows, macOS, or Linux and guards
/// against reserved Windows device names.
pub fn sanitize_filename(name: &str) -> String {
    // Windows forbids < > : " / \ | ? * and control characters.
    let invalid = Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap();
    let cleaned = invalid.replace_all(name, "_");

    // Leading/trailing dots and spaces trip up Windows.
    let cleaned = cleaned.trim_matches(|c| c == ' ' || c == '.');

    let reserved = Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])$").unwrap();
    if reserved.is_match(cleaned) {
        return format!("_{cleaned}");
    }

    let cleaned = truncate_to_char_boundary(cleaned, MAX_STEM_BYTES);
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Cut `text` to at most `max_bytes`, backing up to the nearest char
/// boundary. Slicing at the raw byte offset panics when a multibyte
/// character straddles it.
fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Default export filename for a document: kebab-cased title plus an
/// `_annotations` suffix and the format extension.
pub fn export_filename(document_title: &str, extension: &str) -> String {
    let kebab: String = sanitize_filename(document_title)
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if kebab.is_empty() {
        format!("annotations.{extension}")
    } else {
        format!("{kebab}_annotations.{extension}")
    }
}
