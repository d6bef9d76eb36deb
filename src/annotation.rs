//! Annotation data model
//!
//! Mirrors the records the collaboration backend persists: a flat list of
//! annotations per document, each one a highlight, a comment thread, or a
//! page-scoped note. Highlights and comments carry an [`AnchorRect`];
//! notes never do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::AnchorRect;

/// Opaque annotation identifier, assigned by the store on creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an annotation is, which determines how `content` is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// A colored region on a page; `content` holds the highlighted text.
    Highlight,
    /// A region with an attached discussion; `content` holds the flat
    /// thread encoding (see [`crate::thread_codec`]).
    Comment,
    /// Freeform text attached to a page, not to a region.
    Note,
}

/// The fixed palette available for highlights and comments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::Yellow
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnnotationError {
    #[error("a note cannot carry an anchor")]
    NoteWithAnchor,

    #[error("a {0:?} annotation requires an anchor")]
    MissingAnchor(AnnotationKind),

    #[error("a {0:?} annotation requires a color")]
    MissingColor(AnnotationKind),

    #[error("anchor scalars must be non-negative: {0:?}")]
    NegativeAnchor(AnchorRect),

    #[error("page numbers are 1-based, got {0}")]
    PageOutOfRange(u32),
}

/// Creation payload: everything but the store-assigned id and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub document_id: String,
    pub page_number: u32,
    pub kind: AnnotationKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorRect>,
}

impl NewAnnotation {
    /// A highlight over a selected region.
    pub fn highlight(
        document_id: impl Into<String>,
        page_number: u32,
        anchor: AnchorRect,
        selected_text: impl Into<String>,
        color: HighlightColor,
    ) -> Result<Self, AnnotationError> {
        Self::anchored(
            document_id,
            page_number,
            AnnotationKind::Highlight,
            anchor,
            selected_text.into(),
            color,
        )
    }

    /// A comment thread over a selected region. `content` is expected to
    /// already be in the flat thread encoding.
    pub fn comment(
        document_id: impl Into<String>,
        page_number: u32,
        anchor: AnchorRect,
        content: impl Into<String>,
        color: HighlightColor,
    ) -> Result<Self, AnnotationError> {
        Self::anchored(
            document_id,
            page_number,
            AnnotationKind::Comment,
            anchor,
            content.into(),
            color,
        )
    }

    /// A page-scoped note. Notes have no anchor and no color; passing an
    /// anchor is rejected rather than silently dropped.
    pub fn note(
        document_id: impl Into<String>,
        page_number: u32,
        content: impl Into<String>,
        anchor: Option<AnchorRect>,
    ) -> Result<Self, AnnotationError> {
        if anchor.is_some() {
            return Err(AnnotationError::NoteWithAnchor);
        }
        if page_number == 0 {
            return Err(AnnotationError::PageOutOfRange(page_number));
        }
        Ok(Self {
            document_id: document_id.into(),
            page_number,
            kind: AnnotationKind::Note,
            content: content.into(),
            color: None,
            anchor: None,
        })
    }

    fn anchored(
        document_id: impl Into<String>,
        page_number: u32,
        kind: AnnotationKind,
        anchor: AnchorRect,
        content: String,
        color: HighlightColor,
    ) -> Result<Self, AnnotationError> {
        if page_number == 0 {
            return Err(AnnotationError::PageOutOfRange(page_number));
        }
        if !anchor.is_non_negative() {
            return Err(AnnotationError::NegativeAnchor(anchor));
        }
        Ok(Self {
            document_id: document_id.into(),
            page_number,
            kind,
            content,
            color: Some(color),
            anchor: Some(anchor),
        })
    }

    /// Re-check the kind/anchor/color invariant. The constructors already
    /// enforce it; this exists for payloads deserialized from elsewhere.
    pub fn validate(&self) -> Result<(), AnnotationError> {
        if self.page_number == 0 {
            return Err(AnnotationError::PageOutOfRange(self.page_number));
        }
        match self.kind {
            AnnotationKind::Note => {
                if self.anchor.is_some() {
                    return Err(AnnotationError::NoteWithAnchor);
                }
            }
            kind => {
                let Some(anchor) = self.anchor else {
                    return Err(AnnotationError::MissingAnchor(kind));
                };
                if !anchor.is_non_negative() {
                    return Err(AnnotationError::NegativeAnchor(anchor));
                }
                if self.color.is_none() {
                    return Err(AnnotationError::MissingColor(kind));
                }
            }
        }
        Ok(())
    }
}

/// A persisted annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub document_id: String,
    pub page_number: u32,
    pub kind: AnnotationKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorRect>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Materialize a creation payload with a store-assigned id. The
    /// payload is validated so a malformed record never reaches disk.
    pub fn from_new(new: NewAnnotation, id: AnnotationId) -> Result<Self, AnnotationError> {
        new.validate()?;
        let now = Utc::now();
        Ok(Self {
            id,
            document_id: new.document_id,
            page_number: new.page_number,
            kind: new.kind,
            content: new.content,
            color: new.color,
            anchor: new.anchor,
            created_at: now,
            updated_at: now,
        })
    }

    /// True for kinds that draw a highlight rectangle on the page.
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        matches!(self.kind, AnnotationKind::Highlight | AnnotationKind::Comment)
    }
}
