//! Section detection.
//!
//! Regions are found by a chain of stages, each scored by how much of the
//! page height the accepted regions cover:
//!
//! 1. **Structural**: per-type selector queries (`queries`).
//! 2. **Generic**: block containers typed by position (`fallback`).
//! 3. **Viewport**: equal viewport-height bands typed by position.
//!
//! The chain stops as soon as a stage reaches the coverage threshold.
//! "Nothing found" is never an error; only faults raised by the
//! [`PageHandle`] propagate.

pub mod fallback;
pub mod geometry;
pub mod queries;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{BoundingBox, Region, SemanticType};
use crate::metrics::METRICS;
use crate::normalize::normalize;
use crate::page::{ElementRef, PageHandle, PageResult, CAPTURED_STYLE_PROPERTIES};

pub use fallback::{band_kind, viewport_partition};
pub use geometry::{conflicts, coverage, sort_and_renumber};
pub use queries::queries_for;

/// Caller-supplied detection limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectOptions {
    pub max_regions: usize,
    /// Candidates must be strictly taller than this (CSS pixels).
    pub min_height: f64,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            max_regions: 20,
            min_height: 50.0,
        }
    }
}

/// Stage of the detection chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStage {
    Structural,
    Generic,
    Viewport,
    Done,
}

impl fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectionStage::Structural => "structural",
            DetectionStage::Generic => "generic",
            DetectionStage::Viewport => "viewport",
            DetectionStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// How a detection run was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Stage whose output was accepted.
    pub resolved_by: DetectionStage,
    pub coverage: f64,
    pub structural_count: usize,
    pub generic_added: usize,
    pub region_count: usize,
}

/// Regions plus the report describing how they were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub regions: Vec<Region>,
    pub report: DetectionReport,
}

/// Section detector with its stage thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    /// Coverage at which a stage's result is accepted.
    pub coverage_threshold: f64,
    /// Minimum region count for the structural stage to be final.
    pub min_structural_regions: usize,
    /// Minimum height of generic containers.
    pub generic_min_height: f64,
    /// Generic candidates whose top edge lies this close to an existing
    /// region are treated as duplicates.
    pub near_duplicate_px: f64,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.7,
            min_structural_regions: 5,
            generic_min_height: 200.0,
            near_duplicate_px: 100.0,
        }
    }
}

/// Box of `element` when it is visible and taller than `min_height`.
pub(crate) async fn visible_box(
    page: &dyn PageHandle,
    element: ElementRef,
    min_height: f64,
) -> PageResult<Option<BoundingBox>> {
    if !page.is_visible(element).await? {
        return Ok(None);
    }
    Ok(page
        .bounding_box(element)
        .await?
        .filter(|b| b.height > min_height))
}

/// Snapshot markup, styles and content of `element` into a region.
pub(crate) async fn capture_region(
    page: &dyn PageHandle,
    element: ElementRef,
    kind: SemanticType,
    bounds: BoundingBox,
) -> PageResult<Region> {
    let markup = normalize(&page.outer_html(element).await?);
    let styles = page
        .computed_styles(element, &CAPTURED_STYLE_PROPERTIES)
        .await?;
    let content = page.extract_content(element).await?;
    Ok(Region::new(kind, 0, bounds, markup)
        .with_styles(styles)
        .with_content(content))
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered, typed, non-overlapping regions of the page.
    pub async fn detect_regions(
        &self,
        page: &dyn PageHandle,
        options: DetectOptions,
    ) -> PageResult<Vec<Region>> {
        Ok(self.detect(page, options).await?.regions)
    }

    /// Run the stage chain and report which stage resolved it.
    pub async fn detect(
        &self,
        page: &dyn PageHandle,
        options: DetectOptions,
    ) -> PageResult<Detection> {
        let metrics = page.metrics().await?;
        let mut stage = DetectionStage::Structural;
        let mut resolved_by = DetectionStage::Structural;
        let mut regions: Vec<Region> = Vec::new();
        let mut structural_count = 0;
        let mut generic_added = 0;
        let mut current_coverage = 0.0;

        loop {
            match stage {
                DetectionStage::Structural => {
                    regions = self.structural(page, options).await?;
                    structural_count = regions.len();
                    current_coverage = coverage(&regions, metrics.scroll_height);
                    debug!(
                        stage = %stage,
                        regions = regions.len(),
                        coverage = current_coverage,
                        "stage complete"
                    );
                    stage = if current_coverage >= self.coverage_threshold
                        && regions.len() >= self.min_structural_regions
                    {
                        resolved_by = DetectionStage::Structural;
                        DetectionStage::Done
                    } else {
                        DetectionStage::Generic
                    };
                }
                DetectionStage::Generic => {
                    let added = fallback::generic_containers(
                        self,
                        page,
                        &regions,
                        options.max_regions,
                        options.min_height,
                    )
                    .await?;
                    generic_added = added.len();
                    regions.extend(added);
                    current_coverage = coverage(&regions, metrics.scroll_height);
                    debug!(
                        stage = %stage,
                        added = generic_added,
                        coverage = current_coverage,
                        "stage complete"
                    );
                    stage = if current_coverage >= self.coverage_threshold {
                        resolved_by = DetectionStage::Generic;
                        DetectionStage::Done
                    } else {
                        DetectionStage::Viewport
                    };
                }
                DetectionStage::Viewport => {
                    let bands = viewport_partition(&regions, metrics, options.max_regions);
                    if !bands.is_empty() {
                        regions = bands;
                        resolved_by = DetectionStage::Viewport;
                    }
                    current_coverage = coverage(&regions, metrics.scroll_height);
                    stage = DetectionStage::Done;
                }
                DetectionStage::Done => break,
            }
        }

        sort_and_renumber(&mut regions);
        METRICS.add_regions_detected(regions.len() as u64);
        info!(
            resolved_by = %resolved_by,
            coverage = current_coverage,
            regions = regions.len(),
            "detection resolved"
        );

        let report = DetectionReport {
            resolved_by,
            coverage: current_coverage,
            structural_count,
            generic_added,
            region_count: regions.len(),
        };
        Ok(Detection { regions, report })
    }

    /// Re-run the structural queries for one type, sorted by y.
    pub async fn detect_type(
        &self,
        page: &dyn PageHandle,
        kind: SemanticType,
        options: DetectOptions,
    ) -> PageResult<Vec<Region>> {
        let mut found = self.collect_kind(page, kind, options).await?;
        found.truncate(options.max_regions);
        sort_and_renumber(&mut found);
        debug!(kind = %kind, regions = found.len(), "type re-detection");
        Ok(found)
    }

    async fn structural(
        &self,
        page: &dyn PageHandle,
        options: DetectOptions,
    ) -> PageResult<Vec<Region>> {
        let mut accepted: Vec<Region> = Vec::new();
        'kinds: for kind in SemanticType::ALL {
            for region in self.collect_kind(page, kind, options).await? {
                if accepted.len() >= options.max_regions {
                    break 'kinds;
                }
                if geometry::conflicts_with_any(&region.bounds, &accepted) {
                    debug!(kind = %kind, y = region.bounds.y, "dropping overlapped region");
                    continue;
                }
                accepted.push(region);
            }
        }
        Ok(accepted)
    }

    /// Matches for one kind. Singletons stop at the first hit; repeatable
    /// kinds drop candidates inside the vertical band of an earlier match.
    async fn collect_kind(
        &self,
        page: &dyn PageHandle,
        kind: SemanticType,
        options: DetectOptions,
    ) -> PageResult<Vec<Region>> {
        let mut found: Vec<Region> = Vec::new();
        for query in queries_for(kind) {
            for element in page.query_selector_all(query).await? {
                let Some(bounds) = visible_box(page, element, options.min_height).await? else {
                    continue;
                };
                if kind.is_singleton() {
                    return Ok(vec![capture_region(page, element, kind, bounds).await?]);
                }
                let duplicate = found
                    .iter()
                    .any(|r| (bounds.y - r.bounds.y).abs() < r.bounds.height);
                if !duplicate {
                    found.push(capture_region(page, element, kind, bounds).await?);
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageMetrics, SnapshotElement, SnapshotPage};

    fn metrics(scroll_height: f64) -> PageMetrics {
        PageMetrics {
            scroll_height,
            viewport_height: 800.0,
            viewport_width: 1280.0,
        }
    }

    fn block(tag: &str, y: f64, h: f64) -> SnapshotElement {
        SnapshotElement::new(tag, BoundingBox::new(0.0, y, 1280.0, h))
    }

    #[tokio::test]
    async fn structural_stage_accepts_well_labelled_page() {
        let page = SnapshotPage::new(metrics(3000.0))
            .with_element(block("header", 0.0, 100.0))
            .with_element(block("section", 100.0, 700.0).class("hero"))
            .with_element(block("section", 800.0, 600.0).class("features"))
            .with_element(block("section", 1400.0, 600.0).class("pricing"))
            .with_element(block("section", 2000.0, 600.0).class("testimonials"))
            .with_element(block("footer", 2600.0, 400.0));

        let detection = Detector::new()
            .detect(&page, DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(detection.report.resolved_by, DetectionStage::Structural);
        let kinds: Vec<_> = detection.regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SemanticType::Header,
                SemanticType::Hero,
                SemanticType::Features,
                SemanticType::Pricing,
                SemanticType::Testimonials,
                SemanticType::Footer,
            ]
        );
    }

    #[tokio::test]
    async fn singleton_skips_short_and_hidden_matches() {
        let page = SnapshotPage::new(metrics(1000.0))
            .with_element(block("header", 0.0, 30.0))
            .with_element(block("header", 0.0, 120.0).hidden())
            .with_element(block("div", 0.0, 90.0).class("site-header"));

        let regions = Detector::new()
            .detect_type(&page, SemanticType::Header, DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds.height, 90.0);
    }

    #[tokio::test]
    async fn repeatable_kind_deduplicates_nested_matches() {
        let page = SnapshotPage::new(metrics(2000.0))
            .with_element(block("section", 0.0, 800.0).class("features"))
            .with_element(block("div", 100.0, 200.0).class("feature-item"))
            .with_element(block("section", 1000.0, 600.0).class("more-features"));

        let regions = Detector::new()
            .detect_type(&page, SemanticType::Features, DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].id, "features-1");
    }

    #[tokio::test]
    async fn captured_markup_is_normalized() {
        let page = SnapshotPage::new(metrics(1000.0)).with_element(
            block("footer", 0.0, 200.0)
                .html(r#"<footer style="opacity: 0"><p>Bye</p></footer>"#),
        );
        let regions = Detector::new()
            .detect_type(&page, SemanticType::Footer, DetectOptions::default())
            .await
            .unwrap();
        assert!(regions[0].markup.contains("opacity: 1"));
    }

    #[tokio::test]
    async fn page_faults_propagate() {
        struct BrokenPage;

        #[async_trait::async_trait]
        impl PageHandle for BrokenPage {
            async fn query_selector_all(&self, _: &str) -> PageResult<Vec<ElementRef>> {
                Err(crate::page::PageError::Detached("navigated away".into()))
            }
            async fn is_visible(&self, _: ElementRef) -> PageResult<bool> {
                Ok(false)
            }
            async fn bounding_box(&self, _: ElementRef) -> PageResult<Option<BoundingBox>> {
                Ok(None)
            }
            async fn outer_html(&self, _: ElementRef) -> PageResult<String> {
                Ok(String::new())
            }
            async fn computed_styles(
                &self,
                _: ElementRef,
                _: &[&str],
            ) -> PageResult<crate::domain::StyleMap> {
                Ok(Default::default())
            }
            async fn extract_content(
                &self,
                _: ElementRef,
            ) -> PageResult<Option<crate::domain::ExtractedContent>> {
                Ok(None)
            }
            async fn metrics(&self) -> PageResult<PageMetrics> {
                Ok(metrics(1000.0))
            }
            async fn screenshot(&self, _: BoundingBox, _: &std::path::Path) -> PageResult<()> {
                Ok(())
            }
        }

        let err = Detector::new()
            .detect_regions(&BrokenPage, DetectOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("navigated away"));
    }
}
