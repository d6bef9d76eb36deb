//! Annotation persistence
//!
//! The engine reads annotations and requests mutations; it never owns
//! the list's lifecycle. [`AnnotationStore`] is that boundary. The
//! bundled [`FileAnnotationStore`] keeps one YAML file per document,
//! loaded on open and rewritten on every mutation.

use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotation::{Annotation, AnnotationError, AnnotationId, AnnotationKind, NewAnnotation};
use crate::thread_codec;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),

    #[error("annotation belongs to document {actual:?}, store holds {expected:?}")]
    WrongDocument { expected: String, actual: String },

    #[error("replies can only be appended to comments, {id} is a {kind:?}")]
    NotAComment {
        id: AnnotationId,
        kind: AnnotationKind,
    },

    #[error(transparent)]
    Invalid(#[from] AnnotationError),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// Single-writer mutation boundary for one document's annotations.
///
/// Callers are expected to keep at most one mutation in flight per
/// annotation id; the store does not serialize concurrent writers.
pub trait AnnotationStore {
    fn create(&mut self, new: NewAnnotation) -> Result<Annotation, StoreError>;

    /// Replace an annotation's content, bumping `updated_at`. Anchors
    /// and page numbers are immutable after creation.
    fn update_content(
        &mut self,
        id: AnnotationId,
        content: String,
    ) -> Result<Annotation, StoreError>;

    fn delete(&mut self, id: AnnotationId) -> Result<(), StoreError>;

    fn get(&self, id: AnnotationId) -> Option<&Annotation>;

    /// All annotations, sorted by `(page_number, created_at)`.
    fn annotations(&self) -> &[Annotation];

    fn page_annotations(&self, page_number: u32) -> Vec<&Annotation>;

    /// Append one reply to a comment's thread via the flat encoding.
    fn append_reply(
        &mut self,
        id: AnnotationId,
        reply_text: &str,
    ) -> Result<Annotation, StoreError> {
        let annotation = self.get(id).ok_or(StoreError::NotFound(id))?;
        if annotation.kind != AnnotationKind::Comment {
            return Err(StoreError::NotAComment {
                id,
                kind: annotation.kind,
            });
        }
        let content = thread_codec::append_reply(&annotation.content, reply_text);
        self.update_content(id, content)
    }
}

/// YAML-file-backed store, one file per document.
pub struct FileAnnotationStore {
    document_id: String,
    file_path: Option<PathBuf>,
    annotations: Vec<Annotation>,
    // page_number -> indices into `annotations`
    by_page: HashMap<u32, Vec<usize>>,
    next_id: u64,
}

impl FileAnnotationStore {
    /// In-memory store that never touches disk.
    #[must_use]
    pub fn ephemeral(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            file_path: None,
            annotations: Vec::new(),
            by_page: HashMap::new(),
            next_id: 1,
        }
    }

    /// Open (or create) the store file for a document. The directory
    /// resolves to `PAGEMARK_ANNOTATIONS_DIR` when set, otherwise
    /// `.pagemark_annotations` under the current directory.
    pub fn open(document_id: &str, store_dir: Option<&Path>) -> Result<Self, StoreError> {
        let resolved_dir = match store_dir {
            Some(dir) => {
                if !dir.exists() {
                    fs::create_dir_all(dir)
                        .with_context(|| format!("creating store dir {}", dir.display()))?;
                }
                dir.to_path_buf()
            }
            None => Self::default_store_dir()?,
        };
        let file_path = resolved_dir.join(format!("doc_{}.yaml", Self::document_hash(document_id)));
        Self::open_path(document_id, file_path)
    }

    fn open_path(document_id: &str, file_path: PathBuf) -> Result<Self, StoreError> {
        let annotations = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            Vec::new()
        };

        let next_id = annotations
            .iter()
            .map(|a| a.id.0 + 1)
            .max()
            .unwrap_or(1);

        let mut store = Self {
            document_id: document_id.to_string(),
            file_path: Some(file_path),
            annotations,
            by_page: HashMap::new(),
            next_id,
        };
        store.sort_annotations();
        Ok(store)
    }

    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn document_hash(document_id: &str) -> String {
        let digest = md5::compute(document_id.as_bytes());
        format!("{digest:x}")
    }

    fn default_store_dir() -> anyhow::Result<PathBuf> {
        let store_dir = if let Ok(custom_dir) = std::env::var("PAGEMARK_ANNOTATIONS_DIR") {
            PathBuf::from(custom_dir)
        } else {
            std::env::current_dir()
                .context("Could not determine current directory")?
                .join(".pagemark_annotations")
        };

        if !store_dir.exists() {
            fs::create_dir_all(&store_dir).context("Failed to create annotations directory")?;
        }

        Ok(store_dir)
    }

    fn load_from_file(file_path: &Path) -> anyhow::Result<Vec<Annotation>> {
        let content = fs::read_to_string(file_path).context("Failed to read annotations file")?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_yaml::from_str(&content).context("Failed to parse annotations YAML")
    }

    fn save_to_disk(&self) -> anyhow::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let yaml =
            serde_yaml::to_string(&self.annotations).context("Failed to serialize annotations")?;
        fs::write(path, yaml).context("Failed to write annotations file")?;
        Ok(())
    }

    fn sort_annotations(&mut self) {
        self.annotations
            .sort_by(|a, b| {
                a.page_number
                    .cmp(&b.page_number)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            });
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.by_page.clear();
        for (idx, annotation) in self.annotations.iter().enumerate() {
            self.by_page
                .entry(annotation.page_number)
                .or_default()
                .push(idx);
        }
    }

    fn position(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }
}

impl AnnotationStore for FileAnnotationStore {
    fn create(&mut self, new: NewAnnotation) -> Result<Annotation, StoreError> {
        if new.document_id != self.document_id {
            return Err(StoreError::WrongDocument {
                expected: self.document_id.clone(),
                actual: new.document_id,
            });
        }

        let id = AnnotationId(self.next_id);
        let annotation = Annotation::from_new(new, id)?;
        self.next_id += 1;

        self.annotations.push(annotation.clone());
        self.sort_annotations();
        self.save_to_disk()?;
        Ok(annotation)
    }

    fn update_content(
        &mut self,
        id: AnnotationId,
        content: String,
    ) -> Result<Annotation, StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;

        self.annotations[idx].content = content;
        self.annotations[idx].updated_at = Utc::now();
        let updated = self.annotations[idx].clone();

        self.save_to_disk()?;
        Ok(updated)
    }

    fn delete(&mut self, id: AnnotationId) -> Result<(), StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        self.annotations.remove(idx);
        self.rebuild_index();
        self.save_to_disk()?;
        Ok(())
    }

    fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.position(id).map(|idx| &self.annotations[idx])
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn page_annotations(&self, page_number: u32) -> Vec<&Annotation> {
        self.by_page
            .get(&page_number)
            .map(|indices| indices.iter().map(|&i| &self.annotations[i]).collect())
            .unwrap_or_default()
    }
}
