//! In-memory [`PageHandle`] backed by a serialized page capture.
//!
//! A snapshot is produced by an external browser tool: one entry per
//! candidate element with its tag, attributes, box, visibility, outer HTML,
//! computed styles and optionally extracted content and a pre-rendered
//! screenshot. Queries are answered with the selector subset in
//! [`super::selector`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ElementRef, PageError, PageHandle, PageMetrics, PageResult, Selector};
use crate::domain::{BoundingBox, ExtractedContent, StyleMap};

fn default_visible() -> bool {
    true
}

/// One captured element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub styles: StyleMap,
    #[serde(default)]
    pub content: Option<ExtractedContent>,
    /// Pre-rendered image of this element, copied on screenshot requests.
    #[serde(default)]
    pub screenshot: Option<PathBuf>,
}

impl SnapshotElement {
    pub fn new(tag: &str, bounds: BoundingBox) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            bounds: Some(bounds),
            visible: true,
            html: String::new(),
            styles: StyleMap::new(),
            content: None,
            screenshot: None,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn style(mut self, name: &str, value: &str) -> Self {
        self.styles.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Pre-rendered image served for screenshots clipped to this element.
    pub fn screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }
}

/// A serialized page capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPage {
    #[serde(default)]
    pub url: Option<String>,
    pub metrics: PageMetrics,
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
}

impl SnapshotPage {
    pub fn new(metrics: PageMetrics) -> Self {
        Self {
            url: None,
            metrics,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: SnapshotElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub async fn from_path(path: &Path) -> PageResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw).map_err(|e| {
            PageError::Evaluation(format!("invalid snapshot {}: {e}", path.display()))
        })
    }

    fn element(&self, element: ElementRef) -> PageResult<&SnapshotElement> {
        usize::try_from(element.0)
            .ok()
            .and_then(|i| self.elements.get(i))
            .ok_or_else(|| PageError::Detached(format!("element #{} not in snapshot", element.0)))
    }
}

#[async_trait]
impl PageHandle for SnapshotPage {
    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<ElementRef>> {
        let parsed = Selector::parse(selector)?;
        let matches: Vec<ElementRef> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| parsed.matches(&el.tag, &el.attributes))
            .map(|(i, _)| ElementRef(i as u64))
            .collect();
        debug!(selector, matches = matches.len(), "snapshot query");
        Ok(matches)
    }

    async fn is_visible(&self, element: ElementRef) -> PageResult<bool> {
        let el = self.element(element)?;
        Ok(el.visible && el.bounds.is_some_and(|b| b.width > 0.0 && b.height > 0.0))
    }

    async fn bounding_box(&self, element: ElementRef) -> PageResult<Option<BoundingBox>> {
        Ok(self.element(element)?.bounds)
    }

    async fn outer_html(&self, element: ElementRef) -> PageResult<String> {
        Ok(self.element(element)?.html.clone())
    }

    async fn computed_styles(
        &self,
        element: ElementRef,
        properties: &[&str],
    ) -> PageResult<StyleMap> {
        let el = self.element(element)?;
        Ok(properties
            .iter()
            .filter_map(|p| el.styles.get(*p).map(|v| (p.to_string(), v.clone())))
            .collect())
    }

    async fn extract_content(&self, element: ElementRef) -> PageResult<Option<ExtractedContent>> {
        Ok(self.element(element)?.content.clone())
    }

    async fn metrics(&self) -> PageResult<PageMetrics> {
        Ok(self.metrics)
    }

    async fn screenshot(&self, clip: BoundingBox, path: &Path) -> PageResult<()> {
        let source = self
            .elements
            .iter()
            .find(|el| el.bounds == Some(clip) && el.screenshot.is_some())
            .and_then(|el| el.screenshot.clone())
            .ok_or_else(|| {
                PageError::Screenshot(format!(
                    "snapshot has no pre-rendered image for clip at y={}",
                    clip.y
                ))
            })?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> SnapshotPage {
        SnapshotPage::new(PageMetrics {
            scroll_height: 2000.0,
            viewport_height: 800.0,
            viewport_width: 1280.0,
        })
        .with_element(
            SnapshotElement::new("header", BoundingBox::new(0.0, 0.0, 1280.0, 80.0))
                .style("color", "#111"),
        )
        .with_element(
            SnapshotElement::new("div", BoundingBox::new(0.0, 80.0, 1280.0, 600.0))
                .class("hero big")
                .hidden(),
        )
    }

    #[tokio::test]
    async fn queries_by_selector() {
        let page = page();
        assert_eq!(page.query_selector_all("header").await.unwrap(), vec![ElementRef(0)]);
        assert_eq!(
            page.query_selector_all("[class*=hero]").await.unwrap(),
            vec![ElementRef(1)]
        );
        assert!(page.query_selector_all("footer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn visibility_and_styles() {
        let page = page();
        assert!(page.is_visible(ElementRef(0)).await.unwrap());
        assert!(!page.is_visible(ElementRef(1)).await.unwrap());
        let styles = page
            .computed_styles(ElementRef(0), &["color", "gap"])
            .await
            .unwrap();
        assert_eq!(styles.len(), 1);
    }

    #[tokio::test]
    async fn unknown_element_is_detached() {
        let err = page().outer_html(ElementRef(99)).await.unwrap_err();
        assert!(matches!(err, PageError::Detached(_)));
    }

    #[tokio::test]
    async fn screenshot_without_prerendered_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = page()
            .screenshot(
                BoundingBox::new(0.0, 0.0, 1280.0, 80.0),
                &dir.path().join("x.png"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Screenshot(_)));
    }

    #[tokio::test]
    async fn screenshot_copies_prerendered_image() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("header.png");
        std::fs::write(&src, b"png-bytes").unwrap();
        let bounds = BoundingBox::new(0.0, 0.0, 1280.0, 80.0);
        let mut element = SnapshotElement::new("header", bounds);
        element.screenshot = Some(src);
        let page = SnapshotPage::new(PageMetrics {
            scroll_height: 80.0,
            viewport_height: 800.0,
            viewport_width: 1280.0,
        })
        .with_element(element);

        let out = dir.path().join("shots/header-0.png");
        page.screenshot(bounds, &out).await.unwrap();
        assert_eq!(std::fs::read(out).unwrap(), b"png-bytes");
    }

    #[test]
    fn parses_snapshot_json() {
        let json = r#"{
            "url": "https://example.com",
            "metrics": {"scroll_height": 1000, "viewport_height": 800, "viewport_width": 1280},
            "elements": [
                {"tag": "footer", "bounds": {"x": 0, "y": 900, "width": 1280, "height": 100}}
            ]
        }"#;
        let page = SnapshotPage::from_json_str(json).unwrap();
        assert_eq!(page.elements.len(), 1);
        assert!(page.elements[0].visible);
    }
}
