//! Markup normalization for captured page sections.
//!
//! Captured markup carries the state of scroll-reveal animations and other
//! decorative noise at the moment of capture. [`normalize`] rewrites it into the
//! settled, visible state:
//! - empty texture overlays (noise / grain / texture) are removed
//! - `opacity: 0` and `visibility: hidden` are reset to visible
//! - translate/scale/rotate transforms and blur filters are stripped
//! - performance hints (`will-change`, ...) and `data-aos*` attributes are dropped
//!
//! The transformation is textual and idempotent.

use std::sync::OnceLock;

use regex::{Captures, Regex};

const OVERLAY_MARKERS: [&str; 4] = ["noise", "grain", "texture", "film-grain"];
const PERFORMANCE_HINTS: [&str; 3] = ["will-change", "content-visibility", "contain-intrinsic-size"];
const HIDDEN_CLASS_TOKENS: [&str; 2] = ["opacity-0", "invisible"];

fn empty_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(div|span|i)\b([^>]*?)(?:/>|>\s*</(div|span|i)\s*>)").expect("valid regex")
    })
}

fn style_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\sstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)(\sclass\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn aos_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\s+data-aos(?:-[a-z-]+)?(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?"#)
            .expect("valid regex")
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\b(class|id|style)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

/// Normalize captured markup into its settled, visible state.
pub fn normalize(markup: &str) -> String {
    let mut out = markup.to_string();

    // One nesting level per pass; a changing pass always shortens the markup.
    loop {
        let next = remove_overlays(&out);
        if next.len() == out.len() {
            break;
        }
        out = next;
    }

    out = aos_attr_re().replace_all(&out, "").into_owned();
    out = style_attr_re()
        .replace_all(&out, |caps: &Captures| rewrite_style_attr(caps))
        .into_owned();
    out = class_attr_re()
        .replace_all(&out, |caps: &Captures| rewrite_class_attr(caps))
        .into_owned();
    out
}

fn is_overlay(attrs: &str) -> bool {
    attr_re().captures_iter(attrs).any(|caps| {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        match caps[1].to_ascii_lowercase().as_str() {
            "style" => {
                value.contains("background") && OVERLAY_MARKERS.iter().any(|m| value.contains(m))
            }
            _ => value
                .split(|c: char| c.is_whitespace())
                .any(|token| OVERLAY_MARKERS.iter().any(|m| token.contains(m))),
        }
    })
}

fn remove_overlays(markup: &str) -> String {
    empty_element_re()
        .replace_all(markup, |caps: &Captures| {
            let open = caps[1].to_ascii_lowercase();
            let matched_close = caps
                .get(3)
                .map(|m| m.as_str().eq_ignore_ascii_case(&open))
                .unwrap_or(true);
            if matched_close && is_overlay(&caps[2]) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Split a declaration block on `;`, ignoring separators inside parentheses
/// (`url(data:...;base64,...)`) and quotes.
pub(crate) fn split_declarations(block: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in block.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = (depth - 1).max(0),
            (None, ';') if depth == 0 => {
                parts.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn is_zero(value: &str) -> bool {
    let bare = value.trim_end_matches("!important").trim();
    bare.parse::<f64>().map(|v| v == 0.0).unwrap_or(false)
}

enum Decl {
    Keep(String),
    Replace(String),
    Drop,
}

fn rewrite_declaration(raw: &str) -> Decl {
    let Some((name, value)) = raw.split_once(':') else {
        return Decl::Keep(raw.trim().to_string());
    };
    let name = name.trim().to_ascii_lowercase();
    let value = value.trim();
    let lower = value.to_ascii_lowercase();

    match name.as_str() {
        "opacity" if is_zero(value) => Decl::Replace("opacity: 1".to_string()),
        "visibility" if lower.starts_with("hidden") => {
            Decl::Replace("visibility: visible".to_string())
        }
        "transform" | "-webkit-transform"
            if ["translate", "scale", "rotate"].iter().any(|f| lower.contains(f)) =>
        {
            Decl::Drop
        }
        "filter" | "-webkit-filter" if lower.contains("blur(") => Decl::Drop,
        n if PERFORMANCE_HINTS.contains(&n) => Decl::Drop,
        _ => Decl::Keep(raw.trim().to_string()),
    }
}

fn rewrite_style_attr(caps: &Captures) -> String {
    let (block, quote) = match (caps.get(1), caps.get(2)) {
        (Some(m), _) => (m.as_str(), '"'),
        (None, Some(m)) => (m.as_str(), '\''),
        _ => return caps[0].to_string(),
    };

    let mut changed = block.trim().is_empty();
    let mut kept = Vec::new();
    for raw in split_declarations(block) {
        match rewrite_declaration(raw) {
            Decl::Keep(d) => kept.push(d),
            Decl::Replace(d) => {
                changed = true;
                kept.push(d);
            }
            Decl::Drop => changed = true,
        }
    }

    if !changed {
        return caps[0].to_string();
    }
    if kept.is_empty() {
        return String::new();
    }
    format!(" style={quote}{}{quote}", kept.join("; "))
}

fn rewrite_class_attr(caps: &Captures) -> String {
    let (value, quote) = match (caps.get(2), caps.get(3)) {
        (Some(m), _) => (m.as_str(), '"'),
        (None, Some(m)) => (m.as_str(), '\''),
        _ => return caps[0].to_string(),
    };
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let kept: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !HIDDEN_CLASS_TOKENS.contains(t))
        .collect();
    if kept.len() == tokens.len() {
        return caps[0].to_string();
    }
    format!("{}{quote}{}{quote}", &caps[1], kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_empty_texture_overlay() {
        let html = r#"<section><div class="bg-noise absolute inset-0"></div><h1>Hi</h1></section>"#;
        assert_eq!(normalize(html), "<section><h1>Hi</h1></section>");
    }

    #[test]
    fn keeps_overlay_named_elements_with_content() {
        let html = r#"<div class="texture-card"><p>Real content</p></div>"#;
        assert_eq!(normalize(html), html);
    }

    #[test]
    fn removes_nested_overlays_in_one_call() {
        let html = r#"<main><div class="grain-wrap"><div class="noise"></div></div><p>x</p></main>"#;
        assert_eq!(normalize(html), "<main><p>x</p></main>");
    }

    #[test]
    fn resets_hidden_reveal_state() {
        let html = r#"<h2 style="opacity: 0; transform: translateY(40px); color: red">Title</h2>"#;
        assert_eq!(
            normalize(html),
            r#"<h2 style="opacity: 1; color: red">Title</h2>"#
        );
    }

    #[test]
    fn resets_visibility_and_strips_blur() {
        let html = r#"<p style="visibility:hidden;filter: blur(8px)">x</p>"#;
        assert_eq!(normalize(html), r#"<p style="visibility: visible">x</p>"#);
    }

    #[test]
    fn drops_style_attribute_left_empty() {
        let html = r#"<div style="will-change: transform; transform: scale(0.9)">x</div>"#;
        assert_eq!(normalize(html), "<div>x</div>");
    }

    #[test]
    fn keeps_non_animation_transforms_and_partial_opacity() {
        let html = r#"<div style="opacity: 0.5; transform: skewX(10deg)">x</div>"#;
        assert_eq!(normalize(html), html);
    }

    #[test]
    fn strips_aos_attributes_and_hidden_classes() {
        let html = r#"<div data-aos="fade-up" data-aos-delay="200" class="card opacity-0 shadow">x</div>"#;
        assert_eq!(normalize(html), r#"<div class="card shadow">x</div>"#);
    }

    #[test]
    fn semicolons_inside_urls_survive() {
        let html = r#"<div style="background: url(data:image/png;base64,AAA); opacity: 0">x</div>"#;
        assert_eq!(
            normalize(html),
            r#"<div style="background: url(data:image/png;base64,AAA); opacity: 1">x</div>"#
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            r#"<section style="opacity:0;will-change:opacity"><div class="noise"></div><h1 style="transform: translate3d(0,20px,0)">A</h1></section>"#,
            r#"<div class="grain"><span class="texture"></span></div><p style="">x</p>"#,
            r#"<ul><li data-aos="zoom-in" class="invisible">1</li><li style='visibility: hidden'>2</li></ul>"#,
            "plain text with no markup",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample}");
        }
    }

    #[test]
    fn deeply_nested_overlays_collapse_in_one_call() {
        let depth = 12;
        let nested = format!(
            "<p>x</p>{}{}",
            r#"<div class="noise">"#.repeat(depth),
            "</div>".repeat(depth)
        );
        let once = normalize(&nested);
        assert_eq!(once, "<p>x</p>");
        assert_eq!(normalize(&once), once);
    }
}
