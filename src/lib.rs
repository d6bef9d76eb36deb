pub mod annotation;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod overlay;
pub mod page_tracker;
pub mod renderer;
pub mod selection;
pub mod store;
pub mod thread_codec;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, HighlightColor, NewAnnotation};
pub use engine::{AnnotationEngine, EngineEvent};
pub use geometry::{AnchorRect, ScreenPoint, ScreenRect};
pub use selection::PendingSelection;
pub use store::{AnnotationStore, FileAnnotationStore, StoreError};
