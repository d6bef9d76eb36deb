pub mod annotations_exporter;
pub mod filename;

pub use annotations_exporter::{AnnotationsExporter, ExportError, ExportFormat};
pub use filename::{export_filename, sanitize_filename};
