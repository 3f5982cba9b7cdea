//! Raw markup → JSX conversion shared by the synthesis strategies.

use tracing::debug;

use super::style::{render_style_attr, style_to_entries};
use super::tokenizer::{is_void, tokenize, Attribute, Token};
use super::truncate::truncate_markup;

/// Default byte budget for a single region's markup.
pub const DEFAULT_MARKUP_BUDGET: usize = 48 * 1024;

/// Placeholder emitted in place of an elided `<svg>` subtree.
pub const SVG_PLACEHOLDER: &str = r#"<span data-svg-placeholder="" aria-hidden="true" />"#;

/// Elements dropped together with their content.
const DROPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "template", "iframe", "object"];

/// Attributes that can smuggle script or documents.
const UNSAFE_ATTRIBUTES: [&str; 4] = ["srcdoc", "formaction", "ping", "xmlns"];

const URL_ATTRIBUTES: [&str; 5] = ["href", "src", "action", "poster", "xlink:href"];

/// HTML attribute → JSX prop names that differ from the lowercase HTML name.
const ATTRIBUTE_NAMES: [(&str, &str); 32] = [
    ("class", "className"),
    ("for", "htmlFor"),
    ("tabindex", "tabIndex"),
    ("readonly", "readOnly"),
    ("maxlength", "maxLength"),
    ("minlength", "minLength"),
    ("colspan", "colSpan"),
    ("rowspan", "rowSpan"),
    ("cellpadding", "cellPadding"),
    ("cellspacing", "cellSpacing"),
    ("crossorigin", "crossOrigin"),
    ("autocomplete", "autoComplete"),
    ("autofocus", "autoFocus"),
    ("autoplay", "autoPlay"),
    ("enctype", "encType"),
    ("srcset", "srcSet"),
    ("usemap", "useMap"),
    ("frameborder", "frameBorder"),
    ("allowfullscreen", "allowFullScreen"),
    ("contenteditable", "contentEditable"),
    ("spellcheck", "spellCheck"),
    ("accept-charset", "acceptCharset"),
    ("http-equiv", "httpEquiv"),
    ("datetime", "dateTime"),
    ("playsinline", "playsInline"),
    ("novalidate", "noValidate"),
    ("referrerpolicy", "referrerPolicy"),
    ("inputmode", "inputMode"),
    ("viewbox", "viewBox"),
    ("xlink:href", "xlinkHref"),
    ("xml:lang", "xmlLang"),
    ("fill-rule", "fillRule"),
];

/// Conversion knobs.
#[derive(Debug, Clone)]
pub struct JsxOptions {
    /// Markup beyond this many bytes is cut and re-closed.
    pub max_bytes: usize,
    /// Replace `<svg>` subtrees with [`SVG_PLACEHOLDER`].
    pub elide_svg: bool,
}

impl Default for JsxOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MARKUP_BUDGET,
            elide_svg: true,
        }
    }
}

/// Result of [`to_jsx`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsxConversion {
    pub source: String,
    pub truncated: bool,
    pub svg_elided: usize,
    pub dropped_attributes: usize,
    pub root_elements: usize,
}

/// Translate an HTML attribute name into its JSX prop name.
pub fn jsx_attribute_name(name: &str) -> String {
    if let Some((_, jsx)) = ATTRIBUTE_NAMES.iter().find(|(html, _)| *html == name) {
        return (*jsx).to_string();
    }
    name.to_string()
}

/// Escape decoded text for placement between JSX tags.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape already-encoded HTML text (entities are kept as-is).
fn escape_html_text(text: &str) -> String {
    text.replace('{', "&#123;")
        .replace('}', "&#125;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
}

/// Escape a value for a double-quoted JSX attribute string.
pub fn escape_attr(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
        .replace('\n', " ")
}

/// URLs that would execute script when followed or loaded.
pub(crate) fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:")
        || compact.starts_with("vbscript:")
        || compact.starts_with("data:text/html")
}

struct Emitter {
    out: String,
    stack: Vec<String>,
    dropped_attributes: usize,
    root_elements: usize,
}

impl Emitter {
    fn render_attrs(&mut self, attrs: &[Attribute]) -> String {
        let mut rendered = Vec::new();
        for attr in attrs {
            let name = attr.name.as_str();
            if name.starts_with("on") || UNSAFE_ATTRIBUTES.contains(&name) {
                self.dropped_attributes += 1;
                continue;
            }
            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '_'))
            {
                self.dropped_attributes += 1;
                continue;
            }

            if name == "style" {
                let entries = attr
                    .value
                    .as_deref()
                    .map(style_to_entries)
                    .unwrap_or_default();
                match render_style_attr(&entries) {
                    Some(style) => rendered.push(style),
                    None => self.dropped_attributes += 1,
                }
                continue;
            }

            let jsx_name = jsx_attribute_name(name);
            match &attr.value {
                None if name == "class" => self.dropped_attributes += 1,
                None => rendered.push(jsx_name),
                Some(value) if URL_ATTRIBUTES.contains(&name) && is_script_url(value) => {
                    self.dropped_attributes += 1;
                    if name == "href" {
                        rendered.push(format!("{jsx_name}=\"#\""));
                    }
                }
                Some(value) => rendered.push(format!("{jsx_name}=\"{}\"", escape_attr(value))),
            }
        }
        if rendered.is_empty() {
            String::new()
        } else {
            format!(" {}", rendered.join(" "))
        }
    }

    fn open(&mut self, name: &str, attrs: &[Attribute], self_closing: bool) {
        if self.stack.is_empty() {
            self.root_elements += 1;
        }
        let attrs = self.render_attrs(attrs);
        if self_closing || is_void(name) {
            self.out.push_str(&format!("<{name}{attrs} />"));
        } else {
            self.out.push_str(&format!("<{name}{attrs}>"));
            self.stack.push(name.to_string());
        }
    }

    fn close(&mut self, name: &str) {
        if is_void(name) {
            return;
        }
        let Some(pos) = self.stack.iter().rposition(|open| open == name) else {
            return;
        };
        while self.stack.len() > pos {
            if let Some(open) = self.stack.pop() {
                self.out.push_str(&format!("</{open}>"));
            }
        }
    }

    fn close_all(&mut self) {
        while let Some(open) = self.stack.pop() {
            self.out.push_str(&format!("</{open}>"));
        }
    }
}

/// Convert raw section markup into a JSX fragment body.
///
/// The output is balanced (every element closed) even when the input is not.
pub fn to_jsx(markup: &str, options: &JsxOptions) -> JsxConversion {
    let cut = truncate_markup(markup, options.max_bytes);
    if cut.truncated {
        debug!(
            budget = options.max_bytes,
            reclosed = cut.reclosed.len(),
            "markup truncated before conversion"
        );
    }

    let mut emitter = Emitter {
        out: String::with_capacity(cut.markup.len()),
        stack: Vec::new(),
        dropped_attributes: 0,
        root_elements: 0,
    };
    let mut svg_elided = 0usize;
    // Element being skipped and its nesting depth.
    let mut skipping: Option<(String, usize)> = None;

    for token in tokenize(&cut.markup) {
        if let Some((skip_name, depth)) = skipping.as_mut() {
            match &token {
                Token::StartTag {
                    name, self_closing, ..
                } if name == skip_name && !self_closing => *depth += 1,
                Token::EndTag { name } if name == skip_name => {
                    *depth -= 1;
                    if *depth == 0 {
                        skipping = None;
                    }
                }
                _ => {}
            }
            continue;
        }

        match token {
            Token::Text(text) => {
                if !text.trim().is_empty() || !emitter.stack.is_empty() {
                    emitter.out.push_str(&escape_html_text(text));
                }
            }
            Token::Comment(_) | Token::Doctype(_) => {}
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if name == "svg" && options.elide_svg {
                    svg_elided += 1;
                    if emitter.stack.is_empty() {
                        emitter.root_elements += 1;
                    }
                    emitter.out.push_str(SVG_PLACEHOLDER);
                    if !self_closing {
                        skipping = Some((name, 1));
                    }
                } else if DROPPED_ELEMENTS.contains(&name.as_str()) {
                    if !self_closing {
                        skipping = Some((name, 1));
                    }
                } else {
                    emitter.open(&name, &attrs, self_closing);
                }
            }
            Token::EndTag { name } => emitter.close(&name),
        }
    }
    emitter.close_all();

    JsxConversion {
        source: emitter.out,
        truncated: cut.truncated,
        svg_elided,
        dropped_attributes: emitter.dropped_attributes,
        root_elements: emitter.root_elements,
    }
}
