//! A small CSS selector subset for structural queries.
//!
//! Supported: type selectors, `*`, `.class`, `#id`, attribute selectors
//! (`[a]`, `[a=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`) and comma lists.
//! Combinators and pseudo-classes are rejected.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported syntax `{found}` in selector `{selector}`")]
    Unsupported { selector: String, found: String },

    #[error("unterminated attribute selector in `{0}`")]
    Unterminated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Class(String),
    Id(String),
    Attr {
        name: String,
        op: AttrOp,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_ident_char(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn parse_compound(src: &str, full: &str) -> Result<Compound, SelectorError> {
    let chars: Vec<char> = src.trim().chars().collect();
    if chars.is_empty() {
        return Err(SelectorError::Empty);
    }
    let unsupported = |found: &str| SelectorError::Unsupported {
        selector: full.to_string(),
        found: found.to_string(),
    };

    let mut i = 0;
    let mut tag = None;
    if chars[0] == '*' {
        i = 1;
    } else if chars[0].is_ascii_alphabetic() {
        tag = Some(take_ident(&chars, &mut i).to_ascii_lowercase());
    }

    let mut conditions = Vec::new();
    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let ident = take_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(unsupported("."));
                }
                conditions.push(Condition::Class(ident));
            }
            '#' => {
                i += 1;
                let ident = take_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(unsupported("#"));
                }
                conditions.push(Condition::Id(ident));
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|p| i + p)
                    .ok_or_else(|| SelectorError::Unterminated(full.to_string()))?;
                let inner: String = chars[i + 1..close].iter().collect();
                conditions.push(parse_attr(&inner, full)?);
                i = close + 1;
            }
            c => return Err(unsupported(&c.to_string())),
        }
    }

    Ok(Compound { tag, conditions })
}

fn parse_attr(inner: &str, full: &str) -> Result<Condition, SelectorError> {
    let ops = [
        ("*=", AttrOp::Contains),
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("~=", AttrOp::Word),
        ("=", AttrOp::Equals),
    ];
    for (token, op) in ops {
        if let Some((name, value)) = inner.split_once(token) {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return Err(SelectorError::Unsupported {
                    selector: full.to_string(),
                    found: inner.to_string(),
                });
            }
            return Ok(Condition::Attr {
                name,
                op,
                value: value.to_string(),
            });
        }
    }
    let name = inner.trim().to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(SelectorError::Unsupported {
            selector: full.to_string(),
            found: inner.to_string(),
        });
    }
    Ok(Condition::Attr {
        name,
        op: AttrOp::Exists,
        value: String::new(),
    })
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let alternatives = source
            .split(',')
            .map(|part| {
                if part.trim().contains(char::is_whitespace) || part.contains('>') {
                    return Err(SelectorError::Unsupported {
                        selector: source.to_string(),
                        found: "combinator".to_string(),
                    });
                }
                parse_compound(part, source)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match against an element's tag name and attribute map.
    pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound_matches(compound, tag, attributes))
    }
}

fn compound_matches(compound: &Compound, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
    if let Some(expected) = &compound.tag {
        if !expected.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    compound.conditions.iter().all(|cond| match cond {
        Condition::Class(class) => attributes
            .get("class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class)),
        Condition::Id(id) => attributes.get("id").is_some_and(|v| v == id),
        Condition::Attr { name, op, value } => {
            let Some(actual) = attributes.get(name) else {
                return false;
            };
            match op {
                AttrOp::Exists => true,
                AttrOp::Equals => actual == value,
                AttrOp::Contains => !value.is_empty() && actual.contains(value.as_str()),
                AttrOp::Prefix => !value.is_empty() && actual.starts_with(value.as_str()),
                AttrOp::Suffix => !value.is_empty() && actual.ends_with(value.as_str()),
                AttrOp::Word => actual.split_whitespace().any(|w| w == value),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matches_tags_classes_and_ids() {
        let sel = Selector::parse("section.hero, #top").unwrap();
        assert!(sel.matches("section", &attrs(&[("class", "hero dark")])));
        assert!(!sel.matches("div", &attrs(&[("class", "hero")])));
        assert!(sel.matches("div", &attrs(&[("id", "top")])));
    }

    #[test]
    fn attribute_operators() {
        let el = attrs(&[("class", "pricing-table wide"), ("role", "banner")]);
        assert!(Selector::parse(r#"[class*="pricing"]"#).unwrap().matches("div", &el));
        assert!(Selector::parse("[class^=pricing]").unwrap().matches("div", &el));
        assert!(Selector::parse("[class$='wide']").unwrap().matches("div", &el));
        assert!(Selector::parse("[class~=wide]").unwrap().matches("div", &el));
        assert!(Selector::parse(r#"[role="banner"]"#).unwrap().matches("div", &el));
        assert!(Selector::parse("[role]").unwrap().matches("div", &el));
        assert!(!Selector::parse("[class*=hero]").unwrap().matches("div", &el));
    }

    #[test]
    fn rejects_combinators_and_pseudo_classes() {
        assert!(Selector::parse("main > div").is_err());
        assert!(Selector::parse("main div").is_err());
        assert!(Selector::parse("section:first-child").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("[class*=x").is_err());
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let sel = Selector::parse("HEADER").unwrap();
        assert!(sel.matches("header", &BTreeMap::new()));
    }
}
