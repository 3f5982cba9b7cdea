//! Component module assembly and validation of generated source.

use std::sync::OnceLock;

use regex::Regex;

use super::SynthesisError;

/// Default size limit for one generated component module.
pub const DEFAULT_SOURCE_BUDGET: usize = 96 * 1024;

/// How the default export is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStyle {
    Plain,
    /// `export default memo(Name)`.
    Memo,
}

/// Assemble a function component module around a JSX body.
pub fn render_module(name: &str, doc: Option<&str>, body: &str, export: ExportStyle) -> String {
    let mut out = String::new();
    match export {
        ExportStyle::Plain => out.push_str("import React from 'react';\n\n"),
        ExportStyle::Memo => out.push_str("import React, { memo } from 'react';\n\n"),
    }
    if let Some(doc) = doc {
        out.push_str("/**\n");
        for line in doc.lines() {
            if line.is_empty() {
                out.push_str(" *\n");
            } else {
                out.push_str(&format!(" * {}\n", line.replace("*/", "* /")));
            }
        }
        out.push_str(" */\n");
    }

    let export_prefix = match export {
        ExportStyle::Plain => "export default ",
        ExportStyle::Memo => "",
    };
    out.push_str(&format!("{export_prefix}function {name}() {{\n"));
    out.push_str("  return (\n");
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("  );\n}\n");
    if export == ExportStyle::Memo {
        out.push_str(&format!("\nexport default memo({name});\n"));
    }
    out
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(/)?([a-z][a-zA-Z0-9-]*)([^<>]*?)(/)?>").expect("valid regex")
    })
}

fn check_braces(code: &str) -> Result<(), SynthesisError> {
    let mut depth = 0i64;
    for c in code.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(SynthesisError::InvalidSource(
                "closing brace without opener".to_string(),
            ));
        }
    }
    if depth != 0 {
        return Err(SynthesisError::InvalidSource(format!(
            "{depth} unclosed brace(s)"
        )));
    }
    Ok(())
}

fn check_tags(code: &str) -> Result<(), SynthesisError> {
    let mut stack: Vec<&str> = Vec::new();
    for caps in tag_re().captures_iter(code) {
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let closing = caps.get(1).is_some();
        let self_closing = caps.get(4).is_some();
        if closing {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => {
                    return Err(SynthesisError::InvalidSource(format!(
                        "</{name}> closes <{open}>"
                    )))
                }
                None => {
                    return Err(SynthesisError::InvalidSource(format!(
                        "</{name}> without opener"
                    )))
                }
            }
        } else if !self_closing {
            stack.push(name);
        }
    }
    match stack.last() {
        Some(open) => Err(SynthesisError::InvalidSource(format!("<{open}> left open"))),
        None => Ok(()),
    }
}

/// Reject empty, oversized, unbalanced or export-less source. `check_markup`
/// additionally verifies that intrinsic elements nest correctly; it is off
/// for externally generated code that may use type parameters.
pub fn validate_source(code: &str, max_bytes: usize, check_markup: bool) -> Result<(), SynthesisError> {
    if code.trim().is_empty() {
        return Err(SynthesisError::InvalidSource("empty source".to_string()));
    }
    if code.len() > max_bytes {
        return Err(SynthesisError::SourceTooLarge {
            size: code.len(),
            limit: max_bytes,
        });
    }
    if !code.contains("export default") {
        return Err(SynthesisError::InvalidSource(
            "missing default export".to_string(),
        ));
    }
    check_braces(code)?;
    if check_markup {
        check_tags(code)?;
    }
    Ok(())
}
