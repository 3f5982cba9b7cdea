//! Pixel-faithful strategy: the captured markup and styles, kept as-is.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::node::{Element, Node};
use super::source::{render_module, validate_source, ExportStyle};
use super::vision::{VisionGenerator, VisionRequest};
use super::{component_name, SynthesisError, SynthesisOptions};
use crate::domain::{DecorativeAccent, Region, StrategyKind, Variant};
use crate::markup::{style_map_to_entries, to_jsx, tokenize, JsxOptions, Token};
use crate::normalize::split_declarations;

const CAROUSEL_MARKERS: [&str; 7] = [
    "carousel", "slider", "swiper", "slick", "splide", "glide", "marquee",
];

const WIDTH_PROPERTIES: [&str; 4] = ["width", "flex-basis", "min-width", "flex"];

fn naming_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:class|id)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn inline_declaration(style: &str, property: &str) -> Option<String> {
    split_declarations(style).into_iter().find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim().to_ascii_lowercase())
    })
}

fn style_attr(attrs: &[crate::markup::Attribute]) -> &str {
    attrs
        .iter()
        .find(|a| a.name == "style")
        .and_then(|a| a.value.as_deref())
        .unwrap_or("")
}

/// Root is a flex container with three or more direct children sharing
/// the same declared width.
fn has_equal_width_flex_children(region: &Region) -> bool {
    let mut depth = 0usize;
    let mut root_is_flex = region
        .styles
        .get("display")
        .is_some_and(|d| d.contains("flex"));
    let mut widths: Vec<Option<String>> = Vec::new();

    for token in tokenize(&region.markup) {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let style = style_attr(&attrs);
                if depth == 0 {
                    root_is_flex |= inline_declaration(style, "display")
                        .is_some_and(|d| d.contains("flex"));
                } else if depth == 1 {
                    widths.push(
                        WIDTH_PROPERTIES
                            .iter()
                            .find_map(|p| inline_declaration(style, p)),
                    );
                }
                if !self_closing && !crate::markup::tokenizer::is_void(&name) {
                    depth += 1;
                }
            }
            Token::EndTag { name } if !crate::markup::tokenizer::is_void(&name) => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    root_is_flex
        && widths.len() >= 3
        && widths[0].is_some()
        && widths.iter().all(|w| *w == widths[0])
}

/// Carousel or slider structure: translate transforms, slider-like naming,
/// or equal-width flex children.
pub fn is_carousel(region: &Region) -> bool {
    let lower = region.markup.to_ascii_lowercase();
    if lower.contains("translatex(") || lower.contains("translate3d(") {
        return true;
    }
    let named = naming_re().captures_iter(&region.markup).any(|caps| {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        CAROUSEL_MARKERS.iter().any(|m| value.contains(m))
    });
    named || has_equal_width_flex_children(region)
}

fn set_entry(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => entries.push((key.to_string(), value.to_string())),
    }
}

fn accent_node(accent: &DecorativeAccent) -> Node {
    let mut el = Element::new("div")
        .attr("aria-hidden", "true")
        .attr("data-accent", accent.kind.as_str())
        .style("position", Some("absolute"))
        .style("pointer-events", Some("none"))
        .style("z-index", Some("0"))
        .style("background", Some(&accent.background));
    for (property, value) in &accent.position {
        el = el.style(property, Some(value));
    }
    if let Some(opacity) = accent.opacity {
        el = el.style("opacity", Some(&format!("{}", opacity.clamp(0.0, 1.0))));
    }
    if let Some(blur) = accent.blur_px {
        el = el.style("filter", Some(&format!("blur({blur}px)")));
    }
    el.into()
}

async fn from_vision(
    region: &Region,
    options: &SynthesisOptions,
    vision: &dyn VisionGenerator,
) -> Option<Variant> {
    let screenshot = region.screenshot.clone()?;
    let request = VisionRequest {
        component_name: component_name(region, StrategyKind::PixelFaithful),
        kind: region.kind,
        screenshot,
        content: region.effective_content(),
        design_tokens: options.design_tokens.clone(),
    };
    let result = match vision.generate(&request).await {
        Ok(code) => validate_source(&code, options.max_source_bytes, false).map(|_| code),
        Err(e) => Err(e.into()),
    };
    match result {
        Ok(code) => Some(Variant::new(
            StrategyKind::PixelFaithful,
            format!("Pixel-faithful {} generated from the region screenshot", region.kind),
            code,
        )),
        Err(e) => {
            warn!(region = %region.id, error = %e, "vision generation failed; using captured markup");
            None
        }
    }
}

/// Render the captured markup with its captured styles.
pub(crate) async fn render(
    region: &Region,
    options: &SynthesisOptions,
    vision: Option<&dyn VisionGenerator>,
) -> Result<Variant, SynthesisError> {
    if let Some(vision) = vision.filter(|_| options.use_vision) {
        if let Some(variant) = from_vision(region, options, vision).await {
            return Ok(variant);
        }
    }

    if region.markup.trim().is_empty() {
        return Err(SynthesisError::EmptyMarkup(region.id.clone()));
    }
    let conversion = to_jsx(
        &region.markup,
        &JsxOptions {
            max_bytes: options.max_markup_bytes,
            elide_svg: true,
        },
    );
    if conversion.source.trim().is_empty() {
        return Err(SynthesisError::EmptyMarkup(region.id.clone()));
    }

    let accents = options
        .enhancement
        .as_ref()
        .map(|e| e.accents_for(region.kind))
        .unwrap_or(&[]);
    let carousel = is_carousel(region);

    let mut style = style_map_to_entries(&region.styles);
    set_entry(
        &mut style,
        "minHeight",
        &format!("{}px", region.bounds.height.round().max(0.0) as i64),
    );
    if carousel || !accents.is_empty() {
        set_entry(&mut style, "overflow", "hidden");
        set_entry(&mut style, "position", "relative");
    }

    let mut root = Element::new("div")
        .attr("data-region", region.id.as_str())
        .attr("data-strategy", StrategyKind::PixelFaithful.as_str());
    root.style = style;

    if accents.is_empty() {
        root = root.child(Node::Raw(conversion.source));
    } else {
        root = root.children(accents.iter().map(accent_node)).child(
            Element::new("div")
                .style("position", Some("relative"))
                .style("z-index", Some("1"))
                .child(Node::Raw(conversion.source)),
        );
    }

    let name = component_name(region, StrategyKind::PixelFaithful);
    let code = render_module(&name, None, &root.render(), ExportStyle::Plain);
    validate_source(&code, options.max_source_bytes, true)?;
    debug!(
        region = %region.id,
        carousel,
        accents = accents.len(),
        truncated = conversion.truncated,
        svg_elided = conversion.svg_elided,
        "pixel-faithful variant rendered"
    );

    let mut description = format!(
        "Pixel-faithful {} preserving captured markup and styles",
        region.kind
    );
    if carousel {
        description.push_str("; carousel clipped");
    }
    if !accents.is_empty() {
        description.push_str(&format!("; {} decorative accent(s)", accents.len()));
    }
    if conversion.truncated {
        description.push_str("; markup truncated");
    }
    Ok(Variant::new(StrategyKind::PixelFaithful, description, code))
}
