//! Fallback stages used when structural queries leave the page uncovered.

use tracing::debug;

use super::geometry::conflicts_with_any;
use super::queries::GENERIC_CONTAINER_QUERIES;
use super::{capture_region, visible_box, Detector};
use crate::domain::{BoundingBox, Region, SemanticType};
use crate::page::{ElementRef, PageHandle, PageMetrics, PageResult};

/// Content kinds cycled through by middle viewport bands.
pub const BAND_ROTATION: [SemanticType; 5] = [
    SemanticType::Features,
    SemanticType::Testimonials,
    SemanticType::Pricing,
    SemanticType::Cards,
    SemanticType::Stats,
];

/// Share of a band's height that must overlap a typed region to inherit it.
pub const BAND_INHERIT_RATIO: f64 = 0.5;

/// Scan generic block containers and return the regions to add to
/// `existing`. Typing is positional: first hero, last footer, the rest
/// features.
pub(super) async fn generic_containers(
    detector: &Detector,
    page: &dyn PageHandle,
    existing: &[Region],
    max_regions: usize,
    min_height: f64,
) -> PageResult<Vec<Region>> {
    let min_height = detector.generic_min_height.max(min_height);
    let mut candidates: Vec<(ElementRef, BoundingBox)> = Vec::new();
    for query in GENERIC_CONTAINER_QUERIES {
        for element in page.query_selector_all(query).await? {
            if candidates.iter().any(|(seen, _)| *seen == element) {
                continue;
            }
            if let Some(bounds) = visible_box(page, element, min_height).await? {
                candidates.push((element, bounds));
            }
        }
    }
    candidates.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));

    let last = candidates.len().saturating_sub(1);
    let mut added: Vec<Region> = Vec::new();
    for (i, (element, bounds)) in candidates.into_iter().enumerate() {
        if existing.len() + added.len() >= max_regions {
            break;
        }
        let kind = if i == 0 {
            SemanticType::Hero
        } else if i == last {
            SemanticType::Footer
        } else {
            SemanticType::Features
        };
        let near_duplicate = existing
            .iter()
            .chain(added.iter())
            .any(|r| (r.bounds.y - bounds.y).abs() < detector.near_duplicate_px);
        if near_duplicate
            || conflicts_with_any(&bounds, existing)
            || conflicts_with_any(&bounds, &added)
        {
            debug!(y = bounds.y, "skipping generic container near an existing region");
            continue;
        }
        added.push(capture_region(page, element, kind, bounds).await?);
    }
    Ok(added)
}

/// Type of band `index` out of `count` in the viewport partition.
pub fn band_kind(index: usize, count: usize) -> SemanticType {
    if index == 0 {
        SemanticType::Header
    } else if index + 1 == count {
        SemanticType::Footer
    } else if index == 1 {
        SemanticType::Hero
    } else if index + 2 == count {
        SemanticType::Cta
    } else {
        BAND_ROTATION[(index - 2) % BAND_ROTATION.len()]
    }
}

/// Split the page into viewport-height bands.
///
/// The band count is `ceil(page_height / viewport_height)` capped at
/// `max_regions`; when capped, bands are stretched so the page stays fully
/// covered. A band overlapping a previously typed region by at least half
/// of its height inherits that region's type, markup, styles and content.
pub fn viewport_partition(
    existing: &[Region],
    metrics: PageMetrics,
    max_regions: usize,
) -> Vec<Region> {
    let page_height = metrics.scroll_height;
    let viewport = metrics.viewport_height;
    if page_height <= 0.0 || viewport <= 0.0 || max_regions == 0 {
        return Vec::new();
    }

    let natural = (page_height / viewport).ceil() as usize;
    let count = natural.clamp(1, max_regions);
    let band_height = if natural > max_regions {
        page_height / count as f64
    } else {
        viewport
    };

    (0..count)
        .map(|i| {
            let y = i as f64 * band_height;
            let height = band_height.min(page_height - y);
            let bounds = BoundingBox::new(0.0, y, metrics.viewport_width, height);
            let inherited = existing
                .iter()
                .map(|r| (r, r.bounds.vertical_overlap(&bounds)))
                .filter(|(_, overlap)| *overlap >= BAND_INHERIT_RATIO * height)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(r, _)| r);
            match inherited {
                Some(source) => Region::new(source.kind, i, bounds, source.markup.clone())
                    .with_styles(source.styles.clone())
                    .with_content(source.content.clone()),
                None => Region::new(band_kind(i, count), i, bounds, String::new()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_height: f64) -> PageMetrics {
        PageMetrics {
            scroll_height,
            viewport_height: 800.0,
            viewport_width: 1280.0,
        }
    }

    #[test]
    fn band_kinds_follow_position() {
        let kinds: Vec<_> = (0..8).map(|i| band_kind(i, 8)).collect();
        assert_eq!(
            kinds,
            vec![
                SemanticType::Header,
                SemanticType::Hero,
                SemanticType::Features,
                SemanticType::Testimonials,
                SemanticType::Pricing,
                SemanticType::Cards,
                SemanticType::Cta,
                SemanticType::Footer,
            ]
        );
        assert_eq!(band_kind(0, 1), SemanticType::Header);
        assert_eq!(band_kind(1, 2), SemanticType::Footer);
        assert_eq!(band_kind(1, 3), SemanticType::Hero);
    }

    #[test]
    fn rotation_wraps_for_long_pages() {
        assert_eq!(band_kind(6, 12), SemanticType::Stats);
        assert_eq!(band_kind(7, 12), SemanticType::Features);
    }

    #[test]
    fn partition_covers_page() {
        let bands = viewport_partition(&[], metrics(2000.0), 20);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[2].bounds.height, 400.0);
        assert_eq!(bands[2].kind, SemanticType::Footer);
    }

    #[test]
    fn capped_partition_stretches_bands() {
        let bands = viewport_partition(&[], metrics(8000.0), 4);
        assert_eq!(bands.len(), 4);
        assert_eq!(bands[0].bounds.height, 2000.0);
        assert_eq!(bands[3].bounds.bottom(), 8000.0);
    }

    #[test]
    fn bands_inherit_overlapping_regions() {
        let hero = Region::new(
            SemanticType::Pricing,
            0,
            BoundingBox::new(0.0, 700.0, 1280.0, 700.0),
            "<section class=\"plans\">Plans</section>".to_string(),
        );
        let bands = viewport_partition(&[hero], metrics(2400.0), 20);
        assert_eq!(bands[1].kind, SemanticType::Pricing);
        assert!(bands[1].markup.contains("Plans"));
        assert_eq!(bands[0].kind, SemanticType::Header);
        assert!(bands[0].markup.is_empty());
    }

    #[test]
    fn empty_metrics_yield_no_bands() {
        assert!(viewport_partition(&[], metrics(0.0), 20).is_empty());
    }
}
