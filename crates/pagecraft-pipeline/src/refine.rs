//! Batch refinement of pixel-faithful output through the vision generator.
//!
//! Components are processed in fixed-size batches; inside a batch at most
//! `concurrency` generator calls are in flight. A refined result is added as
//! a new pixel-faithful sibling variant, never replacing existing ones.

use std::sync::Arc;

use futures::future::join_all;
use pagecraft_core::{
    component_name, validate_source, GeneratedComponent, Region, StrategyKind,
    SynthesisOptions, Variant, VisionGenerator, VisionRequest,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineOptions {
    pub batch_size: usize,
    pub concurrency: usize,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            batch_size: 4,
            concurrency: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefineReport {
    pub refined: usize,
    /// Components without a captured screenshot.
    pub skipped: usize,
    /// `(region id, error)` per failed refinement.
    pub failed: Vec<(String, String)>,
}

/// Refine every component whose region carries a screenshot.
///
/// `regions` are matched to components by region id.
pub async fn refine_components(
    regions: &[Region],
    components: &mut [GeneratedComponent],
    generator: Arc<dyn VisionGenerator>,
    synthesis: &SynthesisOptions,
    options: RefineOptions,
) -> RefineReport {
    let mut report = RefineReport::default();

    let mut jobs = Vec::new();
    for (index, component) in components.iter().enumerate() {
        let region = regions.iter().find(|r| r.id == component.region_id);
        match region.and_then(|r| r.screenshot.clone().map(|shot| (r, shot))) {
            Some((region, screenshot)) => jobs.push((
                index,
                VisionRequest {
                    component_name: component_name(region, StrategyKind::PixelFaithful),
                    kind: region.kind,
                    screenshot,
                    content: region.effective_content(),
                    design_tokens: synthesis.design_tokens.clone(),
                },
            )),
            None => report.skipped += 1,
        }
    }

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut results = Vec::with_capacity(jobs.len());
    for (batch_no, batch) in jobs.chunks(options.batch_size.max(1)).enumerate() {
        debug!(batch = batch_no, size = batch.len(), "refinement batch started");
        let calls = batch.iter().map(|(index, request)| {
            let semaphore = semaphore.clone();
            let generator = generator.clone();
            async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => generator
                        .generate(request)
                        .await
                        .map_err(|e| e.to_string())
                        .and_then(|code| {
                            validate_source(&code, synthesis.max_source_bytes, false)
                                .map(|_| code)
                                .map_err(|e| e.to_string())
                        }),
                    Err(e) => Err(e.to_string()),
                };
                (*index, outcome)
            }
        });
        results.extend(join_all(calls).await);
    }

    for (index, outcome) in results {
        let component = &mut components[index];
        match outcome {
            Ok(code) => {
                let description = format!(
                    "Pixel-faithful {} section refined from its screenshot",
                    component.kind
                );
                component.push_variant(Variant::new(StrategyKind::PixelFaithful, description, code));
                report.refined += 1;
            }
            Err(error) => {
                warn!(region = %component.region_id, error = %error, "refinement failed");
                report.failed.push((component.region_id.clone(), error));
            }
        }
    }

    info!(
        refined = report.refined,
        skipped = report.skipped,
        failed = report.failed.len(),
        "refinement finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagecraft_core::{BoundingBox, SemanticType, SynthesisOutcome, VisionError};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowVision {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl VisionGenerator for SlowVision {
        async fn generate(&self, request: &VisionRequest) -> Result<String, VisionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if request.kind == SemanticType::Footer {
                return Err(VisionError::EmptyResponse);
            }
            Ok(format!(
                "export default function {}() {{ return <div />; }}",
                request.component_name
            ))
        }
    }

    fn fixture(kinds: &[SemanticType]) -> (Vec<Region>, Vec<GeneratedComponent>) {
        let mut regions = Vec::new();
        let mut components = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            let region = Region::new(
                *kind,
                i,
                BoundingBox::new(0.0, i as f64 * 500.0, 1280.0, 500.0),
                String::new(),
            )
            .with_screenshot(PathBuf::from(format!("/tmp/{kind}-{i}.png")));
            components.push(GeneratedComponent::from_outcome(
                &region,
                SynthesisOutcome::default(),
            ));
            regions.push(region);
        }
        (regions, components)
    }

    #[tokio::test(start_paused = true)]
    async fn refines_in_bounded_batches() {
        let kinds = [
            SemanticType::Header,
            SemanticType::Hero,
            SemanticType::Features,
            SemanticType::Stats,
            SemanticType::Cta,
            SemanticType::Footer,
        ];
        let (regions, mut components) = fixture(&kinds);
        let vision = Arc::new(SlowVision {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let report = refine_components(
            &regions,
            &mut components,
            vision.clone(),
            &SynthesisOptions::default(),
            RefineOptions {
                batch_size: 3,
                concurrency: 2,
            },
        )
        .await;

        assert_eq!(report.refined, 5);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "footer-5");
        assert!(vision.peak.load(Ordering::SeqCst) <= 2);

        // a failed component becomes pending once refined
        assert!(!components[1].is_failed());
        let pixel = components[1].variant(StrategyKind::PixelFaithful).unwrap();
        assert!(pixel.code.contains("HeroPixel"));
        assert!(components[5].is_failed());
    }

    #[tokio::test]
    async fn components_without_screenshots_are_skipped() {
        let region = Region::new(
            SemanticType::Hero,
            0,
            BoundingBox::new(0.0, 0.0, 1280.0, 600.0),
            String::new(),
        );
        let mut components = vec![GeneratedComponent::from_outcome(
            &region,
            SynthesisOutcome::default(),
        )];
        let vision = Arc::new(SlowVision {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let report = refine_components(
            &[region],
            &mut components,
            vision,
            &SynthesisOptions::default(),
            RefineOptions::default(),
        )
        .await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.refined, 0);
    }
}
