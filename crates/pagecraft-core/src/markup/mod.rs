//! Captured markup handling: tokenizing, truncation and JSX conversion.

pub mod jsx;
pub mod style;
pub mod tokenizer;
pub mod truncate;

pub use jsx::{
    escape_attr, escape_text, jsx_attribute_name, to_jsx, JsxConversion, JsxOptions,
    DEFAULT_MARKUP_BUDGET, SVG_PLACEHOLDER,
};
pub use style::{render_style_attr, render_style_object, style_map_to_entries, style_to_entries};
pub use tokenizer::{tokenize, Attribute, Token};
pub use truncate::{truncate_markup, Truncated};
