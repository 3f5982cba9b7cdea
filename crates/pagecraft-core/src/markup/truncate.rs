//! Byte-budget truncation that keeps the markup well-formed.

use super::tokenizer::{is_void, tokenize, Token};

/// Outcome of [`truncate_markup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub markup: String,
    pub truncated: bool,
    /// Tags re-closed after the cut, innermost first.
    pub reclosed: Vec<String>,
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Cut `markup` to at most `budget` bytes (plus the closing tags appended),
/// never inside a tag, and close every element the cut left open.
pub fn truncate_markup(markup: &str, budget: usize) -> Truncated {
    if markup.len() <= budget {
        return Truncated {
            markup: markup.to_string(),
            truncated: false,
            reclosed: Vec::new(),
        };
    }

    let mut cut = floor_char_boundary(markup, budget);
    let prefix = &markup[..cut];
    if let Some(lt) = prefix.rfind('<') {
        let closed_after = prefix[lt..].contains('>');
        if !closed_after {
            cut = lt;
        }
    }
    let prefix = &markup[..cut];

    let mut stack: Vec<String> = Vec::new();
    for token in tokenize(prefix) {
        match token {
            Token::StartTag {
                name, self_closing, ..
            } => {
                if !self_closing && !is_void(&name) {
                    stack.push(name);
                }
            }
            Token::EndTag { name } => {
                if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                    stack.truncate(pos);
                }
            }
            _ => {}
        }
    }

    let mut out = prefix.to_string();
    let reclosed: Vec<String> = stack.into_iter().rev().collect();
    for name in &reclosed {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    Truncated {
        markup: out,
        truncated: true,
        reclosed,
    }
}
