//! Variant Synthesizer: one region in, up to three component variants out.
//!
//! Every strategy runs through [`Synthesizer::synthesize_one`] and is
//! isolated from the others. A failing strategy is recorded in the outcome
//! metadata and never prevents its siblings from producing output.

pub mod accessible;
pub mod node;
pub mod pixel;
pub mod semantic;
pub mod source;
pub mod templates;
pub mod vision;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    DesignTokens, EnhancementContext, Region, StrategyKind, SynthesisMetadata, SynthesisOutcome,
    Variant,
};
use crate::markup::DEFAULT_MARKUP_BUDGET;
use crate::metrics::METRICS;

pub use source::{render_module, validate_source, ExportStyle, DEFAULT_SOURCE_BUDGET};
pub use vision::{HttpVisionGenerator, VisionConfig, VisionError, VisionGenerator, VisionRequest};

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("region {0} has no markup to convert")]
    EmptyMarkup(String),

    #[error("generated source is invalid: {0}")]
    InvalidSource(String),

    #[error("generated source is {size} bytes, over the {limit} byte limit")]
    SourceTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("strategy {0} is not enabled")]
    Disabled(StrategyKind),

    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, SynthesisError>;

fn default_strategies() -> Vec<StrategyKind> {
    StrategyKind::ALL.to_vec()
}

fn default_markup_budget() -> usize {
    DEFAULT_MARKUP_BUDGET
}

fn default_source_budget() -> usize {
    DEFAULT_SOURCE_BUDGET
}

/// Inputs shared by every strategy for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    #[serde(default)]
    pub design_tokens: Option<DesignTokens>,
    #[serde(default)]
    pub enhancement: Option<EnhancementContext>,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,
    #[serde(default = "default_markup_budget")]
    pub max_markup_bytes: usize,
    #[serde(default = "default_source_budget")]
    pub max_source_bytes: usize,
    /// Prefer the vision generator for pixel-faithful output when one is
    /// configured and the region has a screenshot.
    #[serde(default)]
    pub use_vision: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            design_tokens: None,
            enhancement: None,
            strategies: default_strategies(),
            max_markup_bytes: DEFAULT_MARKUP_BUDGET,
            max_source_bytes: DEFAULT_SOURCE_BUDGET,
            use_vision: false,
        }
    }
}

impl SynthesisOptions {
    pub(crate) fn tokens(&self) -> DesignTokens {
        self.design_tokens.clone().unwrap_or_default()
    }
}

/// Generated component identifier, e.g. `HeroSemantic`.
pub fn component_name(region: &Region, strategy: StrategyKind) -> String {
    format!(
        "{}{}",
        region.kind.component_name(),
        strategy.component_suffix()
    )
}

/// Seam used by the pipeline so runs can be driven with a scripted fake.
#[async_trait]
pub trait ComponentSynthesizer: Send + Sync {
    async fn synthesize(&self, region: &Region, options: &SynthesisOptions) -> SynthesisOutcome;
}

#[derive(Clone, Default)]
pub struct Synthesizer {
    vision: Option<Arc<dyn VisionGenerator>>,
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer")
            .field("vision", &self.vision.is_some())
            .finish()
    }
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionGenerator>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn vision(&self) -> Option<&Arc<dyn VisionGenerator>> {
        self.vision.as_ref()
    }

    /// Run a single strategy.
    pub async fn synthesize_one(
        &self,
        region: &Region,
        strategy: StrategyKind,
        options: &SynthesisOptions,
    ) -> Result<Variant> {
        if !options.strategies.contains(&strategy) {
            return Err(SynthesisError::Disabled(strategy));
        }
        match strategy {
            StrategyKind::PixelFaithful => {
                pixel::render(region, options, self.vision.as_deref()).await
            }
            StrategyKind::Semantic => semantic::render(region, options),
            StrategyKind::Accessible => accessible::render(region, options),
        }
    }

    /// Run every enabled strategy and collect whatever succeeds.
    pub async fn synthesize(&self, region: &Region, options: &SynthesisOptions) -> SynthesisOutcome {
        let mut outcome = SynthesisOutcome::default();
        for strategy in StrategyKind::ALL {
            if !options.strategies.contains(&strategy) {
                continue;
            }
            outcome.metadata.attempted.push(strategy);
            match self.synthesize_one(region, strategy, options).await {
                Ok(variant) => {
                    METRICS.inc_variants_generated();
                    debug!(
                        region = %region.id,
                        strategy = %strategy,
                        bytes = variant.code.len(),
                        "variant generated"
                    );
                    outcome.metadata.succeeded.push(strategy);
                    outcome.variants.push(variant);
                }
                Err(e) => {
                    METRICS.inc_strategy_failures();
                    warn!(region = %region.id, strategy = %strategy, error = %e, "strategy failed");
                    outcome.metadata.errors.insert(strategy, e.to_string());
                }
            }
        }
        outcome
    }
}

#[async_trait]
impl ComponentSynthesizer for Synthesizer {
    async fn synthesize(&self, region: &Region, options: &SynthesisOptions) -> SynthesisOutcome {
        Synthesizer::synthesize(self, region, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundingBox, SemanticType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hero(markup: &str) -> Region {
        Region::new(
            SemanticType::Hero,
            1,
            BoundingBox::new(0.0, 80.0, 1280.0, 600.0),
            markup.to_string(),
        )
    }

    struct CountingVision {
        calls: AtomicUsize,
        reply: std::result::Result<String, ()>,
    }

    #[async_trait]
    impl VisionGenerator for CountingVision {
        async fn generate(&self, _request: &VisionRequest) -> std::result::Result<String, VisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| VisionError::EmptyResponse)
        }
    }

    #[test]
    fn component_names_carry_strategy_suffix() {
        let region = hero("");
        assert_eq!(component_name(&region, StrategyKind::PixelFaithful), "HeroPixel");
        assert_eq!(component_name(&region, StrategyKind::Accessible), "HeroAccessible");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: SynthesisOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, SynthesisOptions::default());
        assert_eq!(options.strategies.len(), 3);
    }

    #[tokio::test]
    async fn produces_three_variants_for_real_markup() {
        let region = hero("<section><h1>Welcome</h1><p>Lead</p></section>");
        let outcome = Synthesizer::new()
            .synthesize(&region, &SynthesisOptions::default())
            .await;
        assert_eq!(outcome.variants.len(), 3);
        assert_eq!(outcome.metadata.succeeded, StrategyKind::ALL.to_vec());
        assert!(outcome.metadata.errors.is_empty());
    }

    #[tokio::test]
    async fn empty_markup_keeps_template_variants() {
        let outcome = Synthesizer::new()
            .synthesize(&hero(""), &SynthesisOptions::default())
            .await;
        let strategies: Vec<_> = outcome.variants.iter().map(|v| v.strategy).collect();
        assert_eq!(strategies, vec![StrategyKind::Semantic, StrategyKind::Accessible]);
        assert!(outcome.metadata.errors.contains_key(&StrategyKind::PixelFaithful));
    }

    #[tokio::test]
    async fn disabled_strategies_are_not_attempted() {
        let options = SynthesisOptions {
            strategies: vec![StrategyKind::Semantic],
            ..Default::default()
        };
        let outcome = Synthesizer::new().synthesize(&hero("<p>x</p>"), &options).await;
        assert_eq!(outcome.metadata.attempted, vec![StrategyKind::Semantic]);

        let err = Synthesizer::new()
            .synthesize_one(&hero("<p>x</p>"), StrategyKind::Accessible, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Disabled(StrategyKind::Accessible)));
    }

    #[tokio::test]
    async fn vision_output_used_when_enabled() {
        let vision = Arc::new(CountingVision {
            calls: AtomicUsize::new(0),
            reply: Ok("export default function HeroPixel() { return null; }".into()),
        });
        let region = hero("<section><h1>Hi</h1></section>")
            .with_screenshot("/tmp/hero-1.png".into());
        let options = SynthesisOptions {
            use_vision: true,
            ..Default::default()
        };
        let variant = Synthesizer::new()
            .with_vision(vision.clone())
            .synthesize_one(&region, StrategyKind::PixelFaithful, &options)
            .await
            .unwrap();
        assert_eq!(vision.calls.load(Ordering::SeqCst), 1);
        assert!(variant.code.contains("return null"));
    }

    #[tokio::test]
    async fn vision_failure_falls_back_to_markup() {
        let vision = Arc::new(CountingVision {
            calls: AtomicUsize::new(0),
            reply: Err(()),
        });
        let region = hero("<section><h1>Hi</h1></section>")
            .with_screenshot("/tmp/hero-1.png".into());
        let options = SynthesisOptions {
            use_vision: true,
            ..Default::default()
        };
        let variant = Synthesizer::new()
            .with_vision(vision.clone())
            .synthesize_one(&region, StrategyKind::PixelFaithful, &options)
            .await
            .unwrap();
        assert_eq!(vision.calls.load(Ordering::SeqCst), 1);
        assert!(variant.code.contains("<h1>Hi</h1>"));
    }

    #[tokio::test]
    async fn vision_skipped_without_screenshot() {
        let vision = Arc::new(CountingVision {
            calls: AtomicUsize::new(0),
            reply: Ok("unused".into()),
        });
        let options = SynthesisOptions {
            use_vision: true,
            ..Default::default()
        };
        Synthesizer::new()
            .with_vision(vision.clone())
            .synthesize_one(&hero("<p>x</p>"), StrategyKind::PixelFaithful, &options)
            .await
            .unwrap();
        assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
    }
}
