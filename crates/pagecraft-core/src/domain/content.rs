//! Structured text content pulled out of a region.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// A clickable element: button or anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// Headings, paragraphs, calls to action, links and images of a region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<Link>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub images: Vec<Image>,
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex"))
}

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid regex"))
}

fn button_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<button\b[^>]*>(.*?)</button\s*>").expect("valid regex"))
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"))
}

fn img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<img\b([^>]*)/?>").expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"(?i)\b{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#, name)).ok()?;
    let caps = re.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Strip tags, decode the common entities and collapse whitespace.
pub fn plain_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
            && self.paragraphs.is_empty()
            && self.buttons.is_empty()
            && self.links.is_empty()
            && self.images.is_empty()
    }

    /// Best-effort extraction from a raw markup snapshot.
    ///
    /// Anchors whose class mentions `btn`/`button` count as buttons.
    pub fn from_markup(markup: &str) -> Self {
        let mut content = ExtractedContent::default();
        if markup.trim().is_empty() {
            return content;
        }

        for caps in heading_re().captures_iter(markup) {
            let level = caps[1].parse::<u8>().unwrap_or(2);
            let text = plain_text(&caps[2]);
            if !text.is_empty() {
                content.headings.push(Heading { level, text });
            }
        }

        for caps in paragraph_re().captures_iter(markup) {
            let text = plain_text(&caps[1]);
            if !text.is_empty() {
                content.paragraphs.push(text);
            }
        }

        for caps in button_re().captures_iter(markup) {
            let text = plain_text(&caps[1]);
            if !text.is_empty() {
                content.buttons.push(Link { text, href: None });
            }
        }

        for caps in anchor_re().captures_iter(markup) {
            let attrs = &caps[1];
            let text = plain_text(&caps[2]);
            if text.is_empty() {
                continue;
            }
            let link = Link {
                text,
                href: attr_value(attrs, "href"),
            };
            let class = attr_value(attrs, "class").unwrap_or_default().to_lowercase();
            if class.contains("btn") || class.contains("button") {
                content.buttons.push(link);
            } else {
                content.links.push(link);
            }
        }

        for caps in img_re().captures_iter(markup) {
            if let Some(src) = attr_value(&caps[1], "src") {
                content.images.push(Image {
                    src,
                    alt: attr_value(&caps[1], "alt").unwrap_or_default(),
                });
            }
        }

        content
    }

    /// The most prominent heading (lowest level, first in document order).
    pub fn headline(&self) -> Option<&str> {
        self.headings
            .iter()
            .min_by_key(|h| h.level)
            .map(|h| h.text.as_str())
    }

    /// Headings other than the headline, in document order.
    pub fn subheadings(&self) -> Vec<&str> {
        let headline = self.headings.iter().min_by_key(|h| h.level);
        self.headings
            .iter()
            .filter(|h| !headline.is_some_and(|top| std::ptr::eq(*h, top)))
            .map(|h| h.text.as_str())
            .collect()
    }

    pub fn primary_cta(&self) -> Option<&Link> {
        self.buttons.first()
    }

    pub fn secondary_cta(&self) -> Option<&Link> {
        self.buttons.get(1)
    }
}
