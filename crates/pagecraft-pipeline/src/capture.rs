//! Per-region screenshot capture.

use std::path::{Path, PathBuf};

use pagecraft_core::{retry_with_policy, PageHandle, RecoveryError, Region, RetryPolicy};
use tracing::debug;

/// `<dir>/<region id>.png`
pub fn screenshot_path(dir: &Path, region: &Region) -> PathBuf {
    dir.join(format!("{}.png", region.id))
}

/// Capture a clipped screenshot of `region`, retrying under `policy`.
pub async fn capture_region(
    page: &dyn PageHandle,
    region: &Region,
    dir: &Path,
    policy: &RetryPolicy,
) -> Result<PathBuf, RecoveryError> {
    let path = screenshot_path(dir, region);
    let operation = format!("screenshot {}", region.id);
    retry_with_policy(&operation, policy, |_| page.screenshot(region.bounds, &path)).await?;
    debug!(region = %region.id, path = %path.display(), "screenshot captured");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::{BoundingBox, PageMetrics, SemanticType, SnapshotElement, SnapshotPage};

    fn page_with(bounds: BoundingBox, image: &Path) -> SnapshotPage {
        SnapshotPage::new(PageMetrics {
            scroll_height: 1000.0,
            viewport_height: 800.0,
            viewport_width: 1280.0,
        })
        .with_element(SnapshotElement::new("section", bounds).screenshot(image))
    }

    #[tokio::test]
    async fn writes_png_named_after_region() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("source.png");
        std::fs::write(&image, b"png").unwrap();
        let bounds = BoundingBox::new(0.0, 0.0, 1280.0, 400.0);
        let region = Region::new(SemanticType::Hero, 0, bounds, String::new());

        let shots = dir.path().join("shots");
        let page = page_with(bounds, &image);
        let path = capture_region(&page, &region, &shots, &RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(path, shots.join("hero-0.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reports_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::new(
            SemanticType::Hero,
            0,
            BoundingBox::new(0.0, 600.0, 1280.0, 400.0),
            String::new(),
        );
        let page = page_with(
            BoundingBox::new(0.0, 0.0, 1280.0, 400.0),
            &dir.path().join("missing.png"),
        );
        let err = capture_region(
            &page,
            &region,
            dir.path(),
            &RetryPolicy::linear(2, std::time::Duration::from_millis(10)),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("after 2 attempt(s)"));
    }
}
