//! PageCraft Core Library
//!
//! Turns a rendered landing page into reusable React component sources:
//! section detection, content normalization, variant synthesis, and the
//! error classification and recovery primitives used by the pipeline.

pub mod detect;
pub mod domain;
pub mod markup;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod page;
pub mod recovery;
pub mod synthesis;
pub mod telemetry;

/// Crate version, stamped into run metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use domain::{
    BoundingBox, ComponentStatus, DecorativeAccent, DesignTokens, EnhancementContext,
    ExtractedContent, GeneratedComponent, Heading, Image, Link, PagecraftError, Phase, Region,
    Result, SemanticType, StrategyKind, StyleMap, SynthesisMetadata, SynthesisOutcome, Variant,
};

pub use detect::{DetectOptions, Detection, DetectionReport, DetectionStage, Detector};

pub use normalize::normalize;

pub use page::{
    ElementRef, PageError, PageHandle, PageMetrics, PageResult, SnapshotElement, SnapshotPage,
};

pub use synthesis::{
    component_name, ComponentSynthesizer, HttpVisionGenerator, SynthesisError, SynthesisOptions,
    Synthesizer, validate_source, VisionConfig, VisionError, VisionGenerator, VisionRequest,
};

pub use recovery::{
    classify, format_error_line, retry_with_policy, BackoffKind, ErrorCode, ErrorQueue,
    ErrorSummary, FailedErrorStore, PipelineError, QueueSummary, RecoveryError, RecoveryReport,
    RecoveryScheduler, RetryPolicy, Severity,
};

pub use metrics::METRICS;
pub use telemetry::init_tracing;
