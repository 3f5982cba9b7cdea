//! Design tokens and decorative enhancement hints fed into synthesis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::region::SemanticType;

/// Design tokens edited by the token UI. All maps are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignTokens {
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: BTreeMap<String, String>,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
    #[serde(default)]
    pub effects: BTreeMap<String, String>,
}

impl DesignTokens {
    pub fn primary_color(&self) -> Option<&str> {
        self.colors
            .get("primary")
            .or_else(|| self.colors.get("accent"))
            .map(String::as_str)
    }

    pub fn text_color(&self) -> Option<&str> {
        self.colors.get("text").map(String::as_str)
    }

    pub fn background_color(&self) -> Option<&str> {
        self.colors.get("background").map(String::as_str)
    }

    pub fn font_family(&self) -> Option<&str> {
        self.typography
            .get("fontFamily")
            .or_else(|| self.typography.get("font-family"))
            .or_else(|| self.typography.get("body"))
            .map(String::as_str)
    }

    pub fn section_padding(&self) -> Option<&str> {
        self.spacing
            .get("section")
            .or_else(|| self.spacing.get("sectionPadding"))
            .map(String::as_str)
    }

    pub fn radius(&self) -> Option<&str> {
        self.effects
            .get("borderRadius")
            .or_else(|| self.effects.get("radius"))
            .map(String::as_str)
    }
}

/// A single decorative accent, e.g. an ambient gradient blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorativeAccent {
    /// Free-form label (`gradient`, `glow`, ...), carried into a data attribute.
    pub kind: String,
    /// CSS `background` value painted by the accent.
    pub background: String,
    /// Extra absolute-positioning declarations (`top`, `left`, `width`, ...).
    #[serde(default)]
    pub position: BTreeMap<String, String>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub blur_px: Option<u32>,
}

/// Platform-specific decorative hints keyed by semantic type. Opaque to the
/// rest of the system; only the pixel-faithful strategy reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancementContext {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub accents: BTreeMap<SemanticType, Vec<DecorativeAccent>>,
}

impl EnhancementContext {
    pub fn accents_for(&self, kind: SemanticType) -> &[DecorativeAccent] {
        self.accents.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_color_falls_back_to_accent() {
        let mut tokens = DesignTokens::default();
        assert!(tokens.primary_color().is_none());
        tokens.colors.insert("accent".into(), "#ff0066".into());
        assert_eq!(tokens.primary_color(), Some("#ff0066"));
        tokens.colors.insert("primary".into(), "#0066ff".into());
        assert_eq!(tokens.primary_color(), Some("#0066ff"));
    }

    #[test]
    fn enhancement_context_deserializes_keyed_by_type() {
        let json = r#"{
            "platform": "framer",
            "accents": {
                "hero": [{"kind": "gradient", "background": "radial-gradient(#f0f, transparent)"}]
            }
        }"#;
        let ctx: EnhancementContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.accents_for(SemanticType::Hero).len(), 1);
        assert!(ctx.accents_for(SemanticType::Footer).is_empty());
    }
}
