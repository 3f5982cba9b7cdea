//! Generated components: the per-region bundle of sibling variants.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::region::{Region, SemanticType};
use super::variant::{StrategyKind, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Pending,
    Failed,
}

/// Which strategies ran for a region and how each one ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisMetadata {
    pub attempted: Vec<StrategyKind>,
    pub succeeded: Vec<StrategyKind>,
    pub errors: BTreeMap<StrategyKind, String>,
}

impl SynthesisMetadata {
    /// Joined per-strategy error text, e.g. `semantic: boom; accessible: bang`.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Output of synthesizing one region: 0-3 variants plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutcome {
    pub variants: Vec<Variant>,
    pub metadata: SynthesisMetadata,
}

impl SynthesisOutcome {
    pub fn is_failure(&self) -> bool {
        self.variants.is_empty()
    }
}

/// A region's generated component.
///
/// `status == Failed` exactly when `variants` is empty; the only constructor is
/// [`GeneratedComponent::from_outcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedComponent {
    pub id: Uuid,
    pub kind: SemanticType,
    pub order: usize,
    pub region_id: String,
    variants: Vec<Variant>,
    selected_variant: Option<Uuid>,
    status: ComponentStatus,
    error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedComponent {
    pub fn from_outcome(region: &Region, outcome: SynthesisOutcome) -> Self {
        let (status, error) = if outcome.variants.is_empty() {
            let detail = outcome.metadata.error_summary();
            let message = if detail.is_empty() {
                format!("all strategies failed for {}", region.id)
            } else {
                format!("all strategies failed for {}: {}", region.id, detail)
            };
            (ComponentStatus::Failed, Some(message))
        } else {
            (ComponentStatus::Pending, None)
        };

        Self {
            id: Uuid::new_v4(),
            kind: region.kind,
            order: region.order,
            region_id: region.id.clone(),
            variants: outcome.variants,
            selected_variant: None,
            status,
            error,
            created_at: Utc::now(),
        }
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    pub fn is_failed(&self) -> bool {
        self.status == ComponentStatus::Failed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected_variant(&self) -> Option<&Variant> {
        self.selected_variant
            .and_then(|id| self.variants.iter().find(|v| v.id == id))
    }

    pub fn variant(&self, strategy: StrategyKind) -> Option<&Variant> {
        self.variants.iter().find(|v| v.strategy == strategy)
    }

    /// Select a sibling variant. Returns `false` for unknown ids.
    pub fn select_variant(&mut self, id: Uuid) -> bool {
        if self.variants.iter().any(|v| v.id == id) {
            self.selected_variant = Some(id);
            true
        } else {
            false
        }
    }

    /// Add a variant produced after the initial synthesis (e.g. refinement).
    ///
    /// A failed component becomes pending again once it owns a variant.
    pub fn push_variant(&mut self, variant: Variant) {
        self.variants.push(variant);
        self.status = ComponentStatus::Pending;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::region::BoundingBox;

    fn region() -> Region {
        Region::new(
            SemanticType::Hero,
            1,
            BoundingBox::new(0.0, 80.0, 1280.0, 600.0),
            "<section></section>".into(),
        )
    }

    #[test]
    fn empty_outcome_marks_component_failed_with_message() {
        let mut metadata = SynthesisMetadata::default();
        metadata.attempted = StrategyKind::ALL.to_vec();
        metadata
            .errors
            .insert(StrategyKind::Semantic, "template exploded".into());

        let component = GeneratedComponent::from_outcome(
            &region(),
            SynthesisOutcome {
                variants: vec![],
                metadata,
            },
        );

        assert!(component.is_failed());
        let err = component.error().unwrap();
        assert!(err.contains("hero-1"));
        assert!(err.contains("template exploded"));
    }

    #[test]
    fn select_variant_only_accepts_siblings() {
        let variant = Variant::new(StrategyKind::Semantic, "s", "code".into());
        let id = variant.id;
        let mut component = GeneratedComponent::from_outcome(
            &region(),
            SynthesisOutcome {
                variants: vec![variant],
                metadata: SynthesisMetadata::default(),
            },
        );

        assert_eq!(component.status(), ComponentStatus::Pending);
        assert!(!component.select_variant(Uuid::new_v4()));
        assert!(component.selected_variant().is_none());
        assert!(component.select_variant(id));
        assert_eq!(component.selected_variant().unwrap().id, id);
    }

    #[test]
    fn push_variant_revives_failed_component() {
        let mut component =
            GeneratedComponent::from_outcome(&region(), SynthesisOutcome::default());
        assert!(component.is_failed());

        component.push_variant(Variant::new(StrategyKind::PixelFaithful, "p", "x".into()));
        assert!(!component.is_failed());
        assert!(component.error().is_none());
    }
}
