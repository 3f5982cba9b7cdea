//! Accessible strategy: the semantic template with landmark roles, labels,
//! a single top-level heading and a memoized export.

use super::node::Element;
use super::source::{render_module, validate_source, ExportStyle};
use super::templates::{self, Slots};
use super::{component_name, SynthesisError, SynthesisOptions};
use crate::domain::{Region, SemanticType, StrategyKind, Variant};

fn nav_label(kind: SemanticType) -> &'static str {
    match kind {
        SemanticType::Footer => "Footer navigation",
        _ => "Main navigation",
    }
}

fn landmark_role(kind: SemanticType) -> Option<&'static str> {
    match kind {
        SemanticType::Header => Some("banner"),
        SemanticType::Footer => Some("contentinfo"),
        _ => None,
    }
}

/// Apply roles and labels below the root. Returns the id of the kept
/// top-level heading, if any.
fn annotate(tree: &mut Element, region: &Region) -> Option<String> {
    let heading_id = format!("{}-heading", region.id);
    let mut kept: Option<String> = None;
    let kind = region.kind;

    tree.walk_mut(
        &mut |el, depth| {
            match el.tag.as_str() {
                "h1" | "h2" => {
                    if kept.is_none() {
                        el.set_attr("id", heading_id.as_str());
                        kept = Some(heading_id.clone());
                    } else {
                        el.tag = "h3".to_string();
                    }
                }
                "nav" => el.set_attr("aria-label", nav_label(kind)),
                "ul" | "ol" => el.set_attr("role", "list"),
                "img" => {
                    if el.get_attr("alt").map_or(true, |a| a.trim().is_empty()) {
                        el.set_attr("alt", "");
                        el.set_attr("role", "presentation");
                    }
                }
                "form" => el.set_attr("aria-label", "Contact form"),
                "input" | "textarea" => el.set_attr("aria-required", "true"),
                "button" => {
                    if el.get_attr("type").is_none() {
                        el.set_attr("type", "button");
                    }
                }
                "dl" => el.set_attr("aria-label", "Key figures"),
                _ => {}
            }
            if depth == 0 {
                el.set_attr("data-region", region.id.as_str());
            }
        },
        0,
    );
    kept
}

fn contract(region: &Region, heading: Option<&str>) -> String {
    let landmark = templates::landmark(region.kind);
    let mut lines = vec![
        format!("Accessible {} section.", region.kind),
        String::new(),
        "Accessibility contract:".to_string(),
    ];
    match landmark_role(region.kind) {
        Some(role) => lines.push(format!("- Landmark: {landmark} element with role {role}")),
        None => lines.push(format!("- Landmark: labelled {landmark} element")),
    }
    match heading {
        Some(id) => lines.push(format!("- Exactly one top-level heading, referenced as {id}")),
        None => lines.push("- No top-level heading; the landmark carries an aria-label".to_string()),
    }
    lines.push("- Lists keep list semantics (role list)".to_string());
    lines.push("- Images without alt text are presentational".to_string());
    lines.push("- Wrapped in memo to skip re-renders with unchanged props".to_string());
    lines.join("\n")
}

pub(crate) fn render(region: &Region, options: &SynthesisOptions) -> Result<Variant, SynthesisError> {
    let content = region.effective_content();
    let slots = Slots::from_content(region.kind, &content);
    let mut tree = templates::build(region.kind, &slots, &options.tokens());

    let heading = annotate(&mut tree, region);
    if let Some(role) = landmark_role(region.kind) {
        tree.set_attr("role", role);
    }
    match &heading {
        Some(id) => tree.set_attr("aria-labelledby", id.as_str()),
        None => tree.set_attr("aria-label", slots.headline.as_str()),
    }

    let doc = contract(region, heading.as_deref());
    let name = component_name(region, StrategyKind::Accessible);
    let code = render_module(&name, Some(&doc), &tree.render(), ExportStyle::Memo);
    validate_source(&code, options.max_source_bytes, true)?;

    Ok(Variant::new(StrategyKind::Accessible, doc, code))
}
