//! Browser automation surface consumed by detection and capture.
//!
//! The core never drives a browser itself. Callers inject a [`PageHandle`]
//! for an already navigated page; [`SnapshotPage`] is an in-memory
//! implementation backed by a serialized page capture.

pub mod selector;
pub mod snapshot;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, ExtractedContent, StyleMap};

pub use selector::{Selector, SelectorError};
pub use snapshot::{SnapshotElement, SnapshotPage};

/// Style properties captured for every detected region.
pub const CAPTURED_STYLE_PROPERTIES: [&str; 21] = [
    "background",
    "background-color",
    "background-image",
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "letter-spacing",
    "text-align",
    "padding",
    "margin",
    "display",
    "flex-direction",
    "justify-content",
    "align-items",
    "gap",
    "box-shadow",
    "border-radius",
    "border",
    "overflow",
];

/// Faults raised by the automation layer. Detection never raises for
/// "nothing found"; these are the only detection errors.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("query failed for selector `{selector}`: {reason}")]
    Query { selector: String, reason: String },

    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("page operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("page detached: {0}")]
    Detached(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for page automation operations.
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Opaque handle to an element returned by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(pub u64);

/// Full-page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub scroll_height: f64,
    pub viewport_height: f64,
    pub viewport_width: f64,
}

/// A navigated page. Implementations need not support concurrent calls;
/// the pipeline issues them one at a time.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// All elements matching `selector`, in document order.
    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<ElementRef>>;

    async fn is_visible(&self, element: ElementRef) -> PageResult<bool>;

    /// `None` when the element is not rendered.
    async fn bounding_box(&self, element: ElementRef) -> PageResult<Option<BoundingBox>>;

    async fn outer_html(&self, element: ElementRef) -> PageResult<String>;

    /// Computed values for the requested properties; unknown ones are omitted.
    async fn computed_styles(
        &self,
        element: ElementRef,
        properties: &[&str],
    ) -> PageResult<StyleMap>;

    /// In-page extraction of headings, paragraphs, buttons, links and images.
    async fn extract_content(&self, element: ElementRef) -> PageResult<Option<ExtractedContent>>;

    async fn metrics(&self) -> PageResult<PageMetrics>;

    /// Capture the clipped area of the page to `path`.
    async fn screenshot(&self, clip: BoundingBox, path: &Path) -> PageResult<()>;
}
