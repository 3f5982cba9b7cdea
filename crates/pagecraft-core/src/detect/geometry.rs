//! Overlap resolution and coverage scoring over detected regions.

use crate::domain::{BoundingBox, Region};

/// Intersection share of the smaller box above which two regions conflict.
pub const OVERLAP_THRESHOLD: f64 = 0.8;

/// True when the shared area exceeds 80% of the smaller box.
pub fn conflicts(a: &BoundingBox, b: &BoundingBox) -> bool {
    let smaller = a.area().min(b.area());
    if smaller <= 0.0 {
        return false;
    }
    a.intersection_area(b) > OVERLAP_THRESHOLD * smaller
}

/// Whether `candidate` conflicts with anything already accepted.
pub fn conflicts_with_any(candidate: &BoundingBox, accepted: &[Region]) -> bool {
    accepted.iter().any(|r| conflicts(candidate, &r.bounds))
}

/// Sort by ascending y (then x) and reassign order indices and ids.
pub fn sort_and_renumber(regions: &mut [Region]) {
    regions.sort_by(|a, b| {
        a.bounds
            .y
            .total_cmp(&b.bounds.y)
            .then(a.bounds.x.total_cmp(&b.bounds.x))
    });
    for (i, region) in regions.iter_mut().enumerate() {
        region.renumber(i);
    }
}

/// Fraction of `page_height` spanned by the union of the regions' vertical
/// extents, clamped to `[0, 1]`.
pub fn coverage(regions: &[Region], page_height: f64) -> f64 {
    if page_height <= 0.0 || regions.is_empty() {
        return 0.0;
    }
    let mut spans: Vec<(f64, f64)> = regions
        .iter()
        .map(|r| {
            (
                r.bounds.y.clamp(0.0, page_height),
                r.bounds.bottom().clamp(0.0, page_height),
            )
        })
        .filter(|(top, bottom)| bottom > top)
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut covered = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for (top, bottom) in spans {
        current = match current {
            Some((start, end)) if top <= end => Some((start, end.max(bottom))),
            Some((start, end)) => {
                covered += end - start;
                Some((top, bottom))
            }
            None => Some((top, bottom)),
        };
    }
    if let Some((start, end)) = current {
        covered += end - start;
    }
    (covered / page_height).clamp(0.0, 1.0)
}
