//! Detected page regions and their semantic typing.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::content::ExtractedContent;

/// Captured style subset of a region (CSS property → value).
pub type StyleMap = BTreeMap<String, String>;

/// The fixed set of section kinds a region can be typed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Header,
    Hero,
    Features,
    Testimonials,
    Pricing,
    Cta,
    Footer,
    Cards,
    Gallery,
    Contact,
    Faq,
    Stats,
    Team,
    Logos,
}

impl SemanticType {
    /// All kinds, in detection priority order.
    pub const ALL: [SemanticType; 14] = [
        SemanticType::Header,
        SemanticType::Hero,
        SemanticType::Features,
        SemanticType::Testimonials,
        SemanticType::Pricing,
        SemanticType::Cta,
        SemanticType::Footer,
        SemanticType::Cards,
        SemanticType::Gallery,
        SemanticType::Contact,
        SemanticType::Faq,
        SemanticType::Stats,
        SemanticType::Team,
        SemanticType::Logos,
    ];

    /// Singleton kinds appear at most once per page.
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            SemanticType::Header
                | SemanticType::Hero
                | SemanticType::Cta
                | SemanticType::Footer
                | SemanticType::Contact
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Header => "header",
            SemanticType::Hero => "hero",
            SemanticType::Features => "features",
            SemanticType::Testimonials => "testimonials",
            SemanticType::Pricing => "pricing",
            SemanticType::Cta => "cta",
            SemanticType::Footer => "footer",
            SemanticType::Cards => "cards",
            SemanticType::Gallery => "gallery",
            SemanticType::Contact => "contact",
            SemanticType::Faq => "faq",
            SemanticType::Stats => "stats",
            SemanticType::Team => "team",
            SemanticType::Logos => "logos",
        }
    }

    /// PascalCase name used for generated component identifiers.
    pub fn component_name(&self) -> &'static str {
        match self {
            SemanticType::Header => "Header",
            SemanticType::Hero => "Hero",
            SemanticType::Features => "Features",
            SemanticType::Testimonials => "Testimonials",
            SemanticType::Pricing => "Pricing",
            SemanticType::Cta => "CallToAction",
            SemanticType::Footer => "Footer",
            SemanticType::Cards => "Cards",
            SemanticType::Gallery => "Gallery",
            SemanticType::Contact => "Contact",
            SemanticType::Faq => "Faq",
            SemanticType::Stats => "Stats",
            SemanticType::Team => "Team",
            SemanticType::Logos => "Logos",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SemanticType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown semantic type: {s}"))
    }
}

/// Axis-aligned box in page coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Area shared with `other`; zero when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Length of the shared vertical span with `other`.
    pub fn vertical_overlap(&self, other: &BoundingBox) -> f64 {
        (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0)
    }
}

/// A detected rectangular page section with an assigned semantic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub kind: SemanticType,
    pub order: usize,
    pub bounds: BoundingBox,
    pub markup: String,
    #[serde(default)]
    pub styles: StyleMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ExtractedContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl Region {
    pub fn new(kind: SemanticType, order: usize, bounds: BoundingBox, markup: String) -> Self {
        Self {
            id: format!("{}-{}", kind, order),
            kind,
            order,
            bounds,
            markup,
            styles: StyleMap::new(),
            content: None,
            screenshot: None,
        }
    }

    pub fn with_styles(mut self, styles: StyleMap) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_content(mut self, content: Option<ExtractedContent>) -> Self {
        self.content = content;
        self
    }

    /// Attach the screenshot captured for this region.
    pub fn with_screenshot(mut self, path: PathBuf) -> Self {
        self.screenshot = Some(path);
        self
    }

    /// Re-number the region after sorting; the id follows the order.
    pub fn renumber(&mut self, order: usize) {
        self.order = order;
        self.id = format!("{}-{}", self.kind, order);
    }

    /// Content captured by the page, or recovered from the markup snapshot.
    pub fn effective_content(&self) -> ExtractedContent {
        match &self.content {
            Some(c) if !c.is_empty() => c.clone(),
            _ => ExtractedContent::from_markup(&self.markup),
        }
    }
}
