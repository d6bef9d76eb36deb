//! Markdown and JSON export of a document's annotations
//!
//! Produces a reading-order digest: pages in order, the quoted source
//! text as block-quotes, comment threads decoded from the flat content
//! encoding, notes and bare highlights listed beneath.

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, HighlightColor};
use crate::export::filename::export_filename;
use crate::thread_codec::{self, EntryKind, Thread};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no annotations to export")]
    NoAnnotations,

    #[error("export directory does not exist: {0}")]
    ExportDirNotFound(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

pub struct AnnotationsExporter<'a> {
    document_title: &'a str,
    annotations: &'a [Annotation],
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    document: &'a str,
    exported_at: chrono::DateTime<Utc>,
    annotations: Vec<JsonAnnotation<'a>>,
}

#[derive(Serialize)]
struct JsonAnnotation<'a> {
    id: AnnotationId,
    page_number: u32,
    kind: AnnotationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<HighlightColor>,
    content: &'a str,
    /// Decoded thread, present for comment annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<Thread>,
}

impl<'a> AnnotationsExporter<'a> {
    #[must_use]
    pub fn new(document_title: &'a str, annotations: &'a [Annotation]) -> Self {
        Self {
            document_title,
            annotations,
        }
    }

    /// Render the export and write it into the given directory.
    /// Returns the written path.
    pub fn export_to_dir(&self, export_dir: &Path, format: ExportFormat) -> Result<PathBuf> {
        if self.annotations.is_empty() {
            return Err(ExportError::NoAnnotations.into());
        }
        if !export_dir.exists() {
            return Err(ExportError::ExportDirNotFound(export_dir.to_path_buf()).into());
        }

        let body = match format {
            ExportFormat::Markdown => self.generate_markdown(),
            ExportFormat::Json => self.generate_json()?,
        };

        let path = export_dir.join(export_filename(self.document_title, format.extension()));
        fs::write(&path, body)
            .with_context(|| format!("writing export to {}", path.display()))?;

        info!(
            "exported {} annotations for {:?} to {}",
            self.annotations.len(),
            self.document_title,
            path.display()
        );
        Ok(path)
    }

    pub fn generate_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("# {}\n\n", self.document_title));

        let mut sorted: Vec<&Annotation> = self.annotations.iter().collect();
        sorted.sort_by(|a, b| {
            a.page_number
                .cmp(&b.page_number)
                .then(a.created_at.cmp(&b.created_at))
        });

        let mut last_page: Option<u32> = None;
        for annotation in sorted {
            if last_page != Some(annotation.page_number) {
                output.push_str(&format!("## Page {}\n\n", annotation.page_number));
                last_page = Some(annotation.page_number);
            }
            match annotation.kind {
                AnnotationKind::Note => self.render_note(annotation, &mut output),
                AnnotationKind::Highlight => self.render_highlight(annotation, &mut output),
                AnnotationKind::Comment => self.render_comment(annotation, &mut output),
            }
        }

        output
    }

    pub fn generate_json(&self) -> Result<String> {
        let doc = JsonDocument {
            document: self.document_title,
            exported_at: Utc::now(),
            annotations: self
                .annotations
                .iter()
                .map(|a| JsonAnnotation {
                    id: a.id,
                    page_number: a.page_number,
                    kind: a.kind,
                    color: a.color,
                    content: &a.content,
                    thread: (a.kind == AnnotationKind::Comment)
                        .then(|| thread_codec::decode(&a.content)),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&doc).context("serializing JSON export")
    }

    fn render_note(&self, annotation: &Annotation, output: &mut String) {
        let timestamp = annotation.updated_at.format("%m-%d-%Y %H:%M");
        output.push_str(&annotation.content);
        output.push('\n');
        output.push_str(&format!("*// note, {timestamp}*\n\n---\n\n"));
    }

    fn render_highlight(&self, annotation: &Annotation, output: &mut String) {
        for line in annotation.content.lines() {
            output.push_str("> ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
        let color = match annotation.color.unwrap_or_default() {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
        };
        output.push_str(&format!("*// highlighted {color}*\n\n---\n\n"));
    }

    fn render_comment(&self, annotation: &Annotation, output: &mut String) {
        let thread = thread_codec::decode(&annotation.content);

        for line in thread.quoted_text.lines() {
            output.push_str("> ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');

        let timestamp = annotation.updated_at.format("%m-%d-%Y %H:%M");
        for entry in &thread.entries {
            if entry.kind == EntryKind::Reply {
                output.push_str("↳ ");
            }
            output.push_str(&entry.text);
            output.push('\n');
        }
        output.push_str(&format!("*// {timestamp}*\n\n---\n\n"));
    }
}
