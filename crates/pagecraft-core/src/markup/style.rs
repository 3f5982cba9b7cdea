//! Inline CSS → JSX style-object conversion.

use crate::domain::StyleMap;
use crate::normalize::split_declarations;

/// Properties React cannot express or that only carry legacy script hooks.
const UNSUPPORTED_PROPERTIES: [&str; 3] = ["behavior", "-ms-behavior", "expression"];

/// `background-color` → `backgroundColor`.
pub fn camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut upper = false;
    for c in property.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn valid_property_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c == '-')
        && !name.ends_with('-')
}

fn unsafe_value(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("expression(") || lower.contains("javascript:") || lower.contains("progid:")
}

/// Validate and normalize one declaration. Returns `None` for vendor-prefixed,
/// custom, invalid, unsafe or unsupported declarations.
pub fn convert_declaration(name: &str, value: &str) -> Option<(String, String)> {
    let name = name.trim().to_ascii_lowercase();
    let value = value
        .trim()
        .trim_end_matches("!important")
        .trim_end()
        .to_string();

    if name.is_empty() || value.is_empty() {
        return None;
    }
    if name.starts_with('-') || !valid_property_name(&name) {
        return None;
    }
    if UNSUPPORTED_PROPERTIES.contains(&name.as_str()) || unsafe_value(&value) {
        return None;
    }
    if value.matches('"').count() % 2 != 0 || value.matches('\'').count() % 2 != 0 {
        return None;
    }
    Some((camel_case(&name), value))
}

/// Convert an inline `style` attribute value into ordered JSX entries.
pub fn style_to_entries(block: &str) -> Vec<(String, String)> {
    split_declarations(block)
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            convert_declaration(name, value)
        })
        .collect()
}

/// Convert a captured style map into JSX entries, applying the same filters.
pub fn style_map_to_entries(styles: &StyleMap) -> Vec<(String, String)> {
    styles
        .iter()
        .filter_map(|(name, value)| convert_declaration(name, value))
        .collect()
}

fn quote_js(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('{', "\\u007b")
        .replace('}', "\\u007d")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('\n', " ");
    format!("'{escaped}'")
}

/// Render entries as an object literal: `{ color: 'red', fontSize: '12px' }`.
pub fn render_style_object(entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let body = entries
        .iter()
        .map(|(k, v)| format!("{k}: {}", render_style_value(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {body} }}")
}

/// Numbers are emitted bare (`zIndex: 1`), everything else quoted.
fn render_style_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        value.to_string()
    } else {
        quote_js(value)
    }
}

/// Render a JSX `style={{ ... }}` attribute, or nothing for an empty object.
pub fn render_style_attr(entries: &[(String, String)]) -> Option<String> {
    if entries.is_empty() {
        None
    } else {
        Some(format!("style={{{}}}", render_style_object(entries)))
    }
}
