//! Domain types for PageCraft.
//!
//! This module contains the core domain model:
//! - `Region`: a typed page section produced by detection
//! - `Variant`: generated source for one region under one strategy
//! - `GeneratedComponent`: the sibling variants of one region plus status
//! - `ExtractedContent`, `DesignTokens`, `EnhancementContext`: synthesis inputs
//! - `Phase`: the ordered phases of a generation run

pub mod component;
pub mod content;
pub mod error;
pub mod phase;
pub mod region;
pub mod tokens;
pub mod variant;

pub use component::{ComponentStatus, GeneratedComponent, SynthesisMetadata, SynthesisOutcome};
pub use content::{ExtractedContent, Heading, Image, Link};
pub use error::{PagecraftError, Result};
pub use phase::Phase;
pub use region::{BoundingBox, Region, SemanticType, StyleMap};
pub use tokens::{DecorativeAccent, DesignTokens, EnhancementContext};
pub use variant::{StrategyKind, Variant};
