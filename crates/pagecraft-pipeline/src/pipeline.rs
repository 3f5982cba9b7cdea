//! Pipeline orchestration.
//!
//! A run walks the phases in order:
//!
//! 1. initializing: prepare the screenshot directory
//! 2. detecting: section detection under the retry policy
//! 3. capturing_screenshots: one clipped screenshot per region
//! 4. generating_variants: synthesis per region, in page order
//! 5. saving: output and metadata stores
//! 6. complete
//!
//! Only a detection failure ends a run early. Every other fault is
//! classified, recorded, and the run moves on.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use pagecraft_core::obs::{
    emit_component_generated, emit_error_recorded, emit_phase_started, emit_run_finished,
    emit_run_started, run_span,
};
use pagecraft_core::{
    classify, retry_with_policy, ComponentSynthesizer, Detection, DetectionReport, Detector,
    ErrorCode, ErrorQueue, FailedErrorStore, GeneratedComponent, HttpVisionGenerator, PageHandle,
    Phase, PipelineError, RecoveryError, RecoveryReport, RecoveryScheduler, Region, SemanticType,
    StrategyKind, Synthesizer, Variant, VisionGenerator, METRICS, VERSION,
};
use pagecraft_store::{ComponentRecord, MetadataStore, OutputStore, RunRecord};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::capture::capture_region;
use crate::config::PipelineConfig;
use crate::error::SetupError;
use crate::progress::{ProgressFn, ProgressUpdate};
use crate::refine::{refine_components, RefineReport};
use crate::result::PipelineResult;

/// Per-run bookkeeping.
struct RunContext<'a> {
    run_id: String,
    started: Instant,
    started_at: DateTime<Utc>,
    errors: Vec<PipelineError>,
    progress: ProgressFn<'a>,
    last_percent: u8,
}

impl<'a> RunContext<'a> {
    fn new(run_id: String, progress: ProgressFn<'a>) -> Self {
        Self {
            run_id,
            started: Instant::now(),
            started_at: Utc::now(),
            errors: Vec::new(),
            progress,
            last_percent: 0,
        }
    }

    fn report(&mut self, mut update: ProgressUpdate) {
        update.percent = update.percent.max(self.last_percent);
        self.last_percent = update.percent;
        (self.progress)(update);
    }

    fn phase(&mut self, phase: Phase, message: impl Into<String>) {
        emit_phase_started(&self.run_id, phase.as_str(), phase.start_percent());
        self.report(ProgressUpdate::phase(phase, message));
    }

    fn item(&mut self, phase: Phase, current: usize, total: usize, message: impl Into<String>) {
        self.report(ProgressUpdate::item(phase, current, total, message));
    }
}

/// Drives one page through detection, capture, synthesis and storage.
pub struct Pipeline {
    config: PipelineConfig,
    page: Arc<dyn PageHandle>,
    detector: Detector,
    synthesizer: Arc<dyn ComponentSynthesizer>,
    vision: Option<Arc<dyn VisionGenerator>>,
    output: Arc<dyn OutputStore>,
    metadata: Arc<dyn MetadataStore>,
    errors: Arc<ErrorQueue>,
    failed_store: Option<FailedErrorStore>,
}

impl Pipeline {
    /// Pipeline with the default synthesizer, no vision generator and no
    /// failed-error persistence.
    pub fn new(
        config: PipelineConfig,
        page: Arc<dyn PageHandle>,
        output: Arc<dyn OutputStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            config,
            page,
            detector: Detector::new(),
            synthesizer: Arc::new(Synthesizer::new()),
            vision: None,
            output,
            metadata,
            errors: Arc::new(ErrorQueue::new()),
            failed_store: None,
        }
    }

    /// Validate `config` and wire the vision generator and failed-error
    /// store it names.
    pub fn from_config(
        config: PipelineConfig,
        page: Arc<dyn PageHandle>,
        output: Arc<dyn OutputStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let failed_store = config
            .failed_error_dir
            .as_ref()
            .map(FailedErrorStore::new)
            .transpose()?;
        let vision = match &config.vision {
            Some(vision) => {
                Some(Arc::new(HttpVisionGenerator::new(vision.clone())?) as Arc<dyn VisionGenerator>)
            }
            None => None,
        };

        let mut pipeline = Self::new(config, page, output, metadata);
        pipeline.failed_store = failed_store;
        if let Some(vision) = vision {
            pipeline = pipeline.with_vision(vision);
        }
        Ok(pipeline)
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn ComponentSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Use `vision` for pixel-faithful synthesis and for refinement.
    pub fn with_vision(mut self, vision: Arc<dyn VisionGenerator>) -> Self {
        self.synthesizer = Arc::new(Synthesizer::new().with_vision(vision.clone()));
        self.vision = Some(vision);
        self
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_error_queue(mut self, errors: Arc<ErrorQueue>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_failed_store(mut self, store: FailedErrorStore) -> Self {
        self.failed_store = Some(store);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn errors(&self) -> &Arc<ErrorQueue> {
        &self.errors
    }

    /// Execute a full run. Never fails: faults end up in `result.errors`.
    pub async fn run(&self, progress: ProgressFn<'_>) -> PipelineResult {
        let run_id = Uuid::new_v4().to_string();
        let span = run_span(&run_id);
        self.execute(RunContext::new(run_id, progress))
            .instrument(span)
            .await
    }

    async fn execute(&self, mut ctx: RunContext<'_>) -> PipelineResult {
        emit_run_started(&ctx.run_id, &self.config.source);

        ctx.phase(Phase::Initializing, "Preparing run");
        let mut capture_enabled = self.config.capture_screenshots;
        if capture_enabled {
            if let Err(e) = tokio::fs::create_dir_all(&self.config.screenshot_dir).await {
                let message = format!(
                    "cannot create screenshot directory {}: {e}",
                    self.config.screenshot_dir.display()
                );
                self.record(
                    &mut ctx,
                    PipelineError::new(ErrorCode::ScreenshotFailed, Phase::Initializing, message),
                );
                capture_enabled = false;
            }
        }

        ctx.phase(Phase::Detecting, "Detecting page sections");
        let detection = match self.detect().await {
            Ok(detection) => detection,
            Err(e) => {
                let message = e.to_string();
                let code = classify(&message, Some(Phase::Detecting));
                self.record(&mut ctx, PipelineError::new(code, Phase::Detecting, message));
                return self.finish(ctx, None, Vec::new(), Vec::new()).await;
            }
        };
        let Detection { regions, report } = detection;
        if regions.is_empty() {
            self.record(
                &mut ctx,
                PipelineError::new(
                    ErrorCode::DetectionNoElements,
                    Phase::Detecting,
                    "no sections detected on page",
                ),
            );
            return self.finish(ctx, Some(report), Vec::new(), Vec::new()).await;
        }

        ctx.phase(
            Phase::CapturingScreenshots,
            format!("Capturing {} section screenshots", regions.len()),
        );
        let regions = if capture_enabled {
            self.capture_all(&mut ctx, regions).await
        } else {
            regions
        };

        ctx.phase(
            Phase::GeneratingVariants,
            format!("Generating variants for {} sections", regions.len()),
        );
        let total = regions.len();
        let mut components = Vec::with_capacity(total);
        for (i, region) in regions.iter().enumerate() {
            ctx.item(
                Phase::GeneratingVariants,
                i + 1,
                total,
                format!("Generating {}", region.id),
            );
            let component = self.generate(&mut ctx, region).await;
            components.push(component);
        }

        ctx.phase(Phase::Saving, "Saving generated components");
        for (i, component) in components.iter().enumerate() {
            ctx.item(
                Phase::Saving,
                i + 1,
                total,
                format!("Saving {}", component.region_id),
            );
            if component.is_failed() {
                continue;
            }
            for error in self.save_component(&ctx.run_id, component).await {
                self.record(&mut ctx, error);
            }
        }

        self.finish(ctx, Some(report), regions, components).await
    }

    async fn detect(&self) -> Result<Detection, RecoveryError> {
        let page = self.page.as_ref();
        let detector = &self.detector;
        let options = self.config.detect;
        retry_with_policy("detect", &self.config.retry, |_| detector.detect(page, options)).await
    }

    async fn capture_all(&self, ctx: &mut RunContext<'_>, regions: Vec<Region>) -> Vec<Region> {
        let total = regions.len();
        let mut captured = Vec::with_capacity(total);
        for (i, region) in regions.into_iter().enumerate() {
            ctx.item(
                Phase::CapturingScreenshots,
                i + 1,
                total,
                format!("Capturing {}", region.id),
            );
            match capture_region(
                self.page.as_ref(),
                &region,
                &self.config.screenshot_dir,
                &self.config.retry,
            )
            .await
            {
                Ok(path) => captured.push(region.with_screenshot(path)),
                Err(e) => {
                    self.record(
                        ctx,
                        PipelineError::new(
                            ErrorCode::ScreenshotFailed,
                            Phase::CapturingScreenshots,
                            e.to_string(),
                        )
                        .with_owner(region.kind)
                        .with_component(region.id.clone()),
                    );
                    captured.push(region);
                }
            }
        }
        captured
    }

    async fn generate(&self, ctx: &mut RunContext<'_>, region: &Region) -> GeneratedComponent {
        let outcome = self
            .synthesizer
            .synthesize(region, &self.config.synthesis)
            .await;
        for (strategy, message) in &outcome.metadata.errors {
            self.record(
                ctx,
                PipelineError::new(
                    ErrorCode::for_strategy(*strategy),
                    Phase::GeneratingVariants,
                    message.clone(),
                )
                .with_owner(region.kind)
                .with_component(region.id.clone())
                .with_detail(format!("strategy {strategy}")),
            );
        }

        let component = GeneratedComponent::from_outcome(region, outcome);
        if let Some(message) = component.error() {
            self.record(
                ctx,
                PipelineError::new(
                    ErrorCode::AllStrategiesFailed,
                    Phase::GeneratingVariants,
                    message,
                )
                .with_owner(region.kind)
                .with_component(region.id.clone()),
            );
        }
        emit_component_generated(
            &ctx.run_id,
            &region.id,
            component.variants().len(),
            component.is_failed(),
        );
        component
    }

    /// Write the latest variant of each strategy, then the component record.
    /// Returns every failure; nothing written is rolled back.
    async fn save_component(&self, run_id: &str, component: &GeneratedComponent) -> Vec<PipelineError> {
        let mut failures = Vec::new();
        let latest: BTreeMap<StrategyKind, &Variant> = component
            .variants()
            .iter()
            .map(|v| (v.strategy, v))
            .collect();

        let mut stored = Vec::with_capacity(latest.len());
        for variant in latest.values() {
            match self.output.put_variant(run_id, component, variant).await {
                Ok(entry) => stored.push(entry),
                Err(e) => failures.push(
                    PipelineError::new(ErrorCode::StorageFailed, Phase::Saving, e.to_string())
                        .with_owner(component.kind)
                        .with_component(component.region_id.clone())
                        .with_detail(format!("variant {}", variant.id)),
                ),
            }
        }

        let record = ComponentRecord::new(run_id, component.clone(), stored);
        if let Err(e) = self.metadata.save_component(&record).await {
            failures.push(
                PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, e.to_string())
                    .with_owner(component.kind)
                    .with_component(component.region_id.clone()),
            );
        }
        failures
    }

    fn record(&self, ctx: &mut RunContext<'_>, error: PipelineError) {
        self.record_into(&ctx.run_id, &mut ctx.errors, error);
    }

    fn record_into(&self, run_id: &str, sink: &mut Vec<PipelineError>, error: PipelineError) {
        emit_error_recorded(
            run_id,
            error.code.as_str(),
            error.severity.as_str(),
            &error.message,
        );
        if let Some(store) = &self.failed_store {
            if let Err(e) = store.record(run_id, &error) {
                warn!(run_id, error_id = %error.id, error = %e, "cannot persist failed error");
            }
        }
        self.errors.push(error.clone());
        sink.push(error);
    }

    async fn finish(
        &self,
        mut ctx: RunContext<'_>,
        detection: Option<DetectionReport>,
        regions: Vec<Region>,
        components: Vec<GeneratedComponent>,
    ) -> PipelineResult {
        let generated_count = components.iter().filter(|c| !c.is_failed()).count();
        let failed_count = components.len() - generated_count;
        let detected_count = detection.as_ref().map_or(0, |d| d.region_count);

        let run = RunRecord {
            run_id: ctx.run_id.clone(),
            source: self.config.source.clone(),
            started_at: ctx.started_at,
            finished_at: Utc::now(),
            success: PipelineResult::success_of(&ctx.errors, generated_count),
            detected: detected_count,
            generated: generated_count,
            failed: failed_count,
            error_count: ctx.errors.len(),
            version: VERSION.to_string(),
        };
        if let Err(e) = self.metadata.save_run(&run).await {
            self.record(
                &mut ctx,
                PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, e.to_string())
                    .with_detail("run record"),
            );
        }

        ctx.phase(
            Phase::Complete,
            format!("Generated {generated_count} of {detected_count} components"),
        );

        let success = PipelineResult::success_of(&ctx.errors, generated_count);
        let duration_ms = ctx.started.elapsed().as_millis() as u64;
        emit_run_finished(&ctx.run_id, duration_ms, generated_count, failed_count, success);
        METRICS.flush();

        PipelineResult {
            run_id: ctx.run_id,
            success,
            detected_count,
            generated_count,
            failed_count,
            components,
            regions,
            errors: ctx.errors,
            detection,
            duration_ms,
        }
    }

    /// Re-detect, capture, synthesize and save the `index`-th region of
    /// `kind`.
    ///
    /// The page goes through the same detection as a full run, so `index`
    /// and the resulting region id line up with [`PipelineResult`]
    /// (see [`PipelineResult::kind_index`]). Any fault is returned and not
    /// queued, leaving queue bookkeeping to the caller.
    pub async fn retry_component(
        &self,
        run_id: &str,
        kind: SemanticType,
        index: usize,
    ) -> Result<GeneratedComponent, PipelineError> {
        let detection = self.detect().await.map_err(|e| detection_error(kind, e))?;
        let Some(region) = detection
            .regions
            .into_iter()
            .filter(|r| r.kind == kind)
            .nth(index)
        else {
            return Err(PipelineError::new(
                ErrorCode::DetectionNoElements,
                Phase::Detecting,
                format!("no {kind} section at index {index}"),
            )
            .with_owner(kind));
        };
        self.regenerate(run_id, region).await
    }

    /// Regenerate a region from an earlier run.
    ///
    /// Only `original.kind` is re-detected. The match overlapping
    /// `original.bounds` the most is used, with its fresh markup and
    /// content but the original id and order, so it is saved over the
    /// earlier component.
    pub async fn retry_region(
        &self,
        run_id: &str,
        original: &Region,
    ) -> Result<GeneratedComponent, PipelineError> {
        let kind = original.kind;
        let page = self.page.as_ref();
        let detector = &self.detector;
        let options = self.config.detect;
        let operation = format!("detect {kind}");
        let candidates = retry_with_policy(&operation, &self.config.retry, |_| {
            detector.detect_type(page, kind, options)
        })
        .await
        .map_err(|e| detection_error(kind, e))?;

        let best = candidates
            .into_iter()
            .map(|r| (r.bounds.intersection_area(&original.bounds), r))
            .filter(|(shared, _)| *shared > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, r)| r);
        let Some(mut region) = best else {
            return Err(PipelineError::new(
                ErrorCode::DetectionNoElements,
                Phase::Detecting,
                format!("{kind} section {} no longer found", original.id),
            )
            .with_owner(kind)
            .with_component(original.id.clone()));
        };
        region.id = original.id.clone();
        region.order = original.order;
        self.regenerate(run_id, region).await
    }

    async fn regenerate(
        &self,
        run_id: &str,
        mut region: Region,
    ) -> Result<GeneratedComponent, PipelineError> {
        if self.config.capture_screenshots {
            match capture_region(
                self.page.as_ref(),
                &region,
                &self.config.screenshot_dir,
                &self.config.retry,
            )
            .await
            {
                Ok(path) => region = region.with_screenshot(path),
                Err(e) => warn!(region = %region.id, error = %e, "retry capture failed"),
            }
        }

        let outcome = self
            .synthesizer
            .synthesize(&region, &self.config.synthesis)
            .await;
        let component = GeneratedComponent::from_outcome(&region, outcome);
        if let Some(message) = component.error() {
            return Err(PipelineError::new(
                ErrorCode::AllStrategiesFailed,
                Phase::GeneratingVariants,
                message,
            )
            .with_owner(region.kind)
            .with_component(region.id.clone()));
        }

        if let Some(error) = self.save_component(run_id, &component).await.into_iter().next() {
            return Err(error);
        }
        info!(
            run_id,
            region = %region.id,
            variants = component.variants().len(),
            "component regenerated"
        );
        Ok(component)
    }

    /// Sweep the error queue once. Errors are grouped by component, and each
    /// component is regenerated once through [`Pipeline::retry_region`].
    pub async fn recover(
        &self,
        result: &PipelineResult,
        scheduler: &RecoveryScheduler,
    ) -> RecoveryReport {
        scheduler
            .run_pending_grouped(
                &self.errors,
                |error| error.component_id.clone(),
                |batch| async move {
                    let Some(component_id) =
                        batch.first().and_then(|e| e.component_id.clone())
                    else {
                        let ids: Vec<String> = batch.iter().map(|e| e.id.to_string()).collect();
                        return Err(format!(
                            "error {} is not tied to a component",
                            ids.join(", ")
                        ));
                    };
                    let region = result
                        .regions
                        .iter()
                        .find(|r| r.id == component_id)
                        .ok_or_else(|| format!("unknown component {component_id}"))?;
                    self.retry_region(&result.run_id, region)
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                },
            )
            .await
    }

    /// Refine a finished run's pixel-faithful output with the vision
    /// generator, then save the refined components again.
    ///
    /// Returns `None` when no generator is configured.
    pub async fn refine(&self, result: &mut PipelineResult) -> Option<RefineReport> {
        let vision = self.vision.clone()?;
        let report = refine_components(
            &result.regions,
            &mut result.components,
            vision,
            &self.config.synthesis,
            self.config.refine,
        )
        .await;

        if report.refined > 0 {
            for component in result.components.iter().filter(|c| !c.is_failed()) {
                for error in self.save_component(&result.run_id, component).await {
                    self.record_into(&result.run_id, &mut result.errors, error);
                }
            }
        }
        result.generated_count = result.components.iter().filter(|c| !c.is_failed()).count();
        result.failed_count = result.components.len() - result.generated_count;
        result.success = PipelineResult::success_of(&result.errors, result.generated_count);
        Some(report)
    }
}

fn detection_error(kind: SemanticType, error: RecoveryError) -> PipelineError {
    let message = error.to_string();
    PipelineError::new(
        classify(&message, Some(Phase::Detecting)),
        Phase::Detecting,
        message,
    )
    .with_owner(kind)
}
