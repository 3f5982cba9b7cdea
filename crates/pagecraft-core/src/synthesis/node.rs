//! A tiny JSX element tree used by the template strategies.

use crate::markup::style::convert_declaration;
use crate::markup::{escape_attr, escape_text, render_style_attr};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Pre-rendered JSX, emitted verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub style: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("className", value)
    }

    /// Add a CSS declaration; `None` and invalid declarations are skipped.
    pub fn style(mut self, property: &str, value: Option<&str>) -> Self {
        if let Some(entry) = value.and_then(|v| convert_declaration(property, v)) {
            self.style.push(entry);
        }
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(Node::Text(text.to_string()))
    }

    /// Depth-first mutable walk over this element and its descendants.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element, usize), depth: usize) {
        f(self, depth);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.walk_mut(f, depth + 1);
            }
        }
    }

    fn open_tag(&self) -> String {
        let mut parts = vec![self.tag.clone()];
        for (name, value) in &self.attrs {
            parts.push(format!("{name}=\"{}\"", escape_attr(value)));
        }
        if let Some(style) = render_style_attr(&self.style) {
            parts.push(style);
        }
        parts.join(" ")
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        let open = self.open_tag();
        if self.children.is_empty() {
            out.push_str(&format!("{pad}<{open} />\n"));
            return;
        }
        if let [Node::Text(text)] = self.children.as_slice() {
            out.push_str(&format!(
                "{pad}<{open}>{}</{}>\n",
                escape_text(text),
                self.tag
            ));
            return;
        }
        out.push_str(&format!("{pad}<{open}>\n"));
        for child in &self.children {
            match child {
                Node::Element(el) => el.render_into(out, indent + 1),
                Node::Text(text) => {
                    out.push_str(&format!("{pad}  {}\n", escape_text(text)));
                }
                Node::Raw(jsx) => {
                    for line in jsx.lines().filter(|l| !l.trim().is_empty()) {
                        out.push_str(&format!("{pad}  {line}\n"));
                    }
                }
            }
        }
        out.push_str(&format!("{pad}</{}>\n", self.tag));
    }

    /// Render as indented JSX.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements() {
        let tree = Element::new("section")
            .class("hero")
            .child(Element::new("h1").text("Hi {there}"))
            .child(Element::new("img").attr("src", "a.png").attr("alt", ""));
        assert_eq!(
            tree.render(),
            "<section className=\"hero\">\n  <h1>Hi &#123;there&#125;</h1>\n  <img src=\"a.png\" alt=\"\" />\n</section>\n"
        );
    }

    #[test]
    fn renders_style_objects() {
        let el = Element::new("div")
            .style("background-color", Some("#000"))
            .style("color", None)
            .text("x");
        assert_eq!(el.render(), "<div style={{ backgroundColor: '#000' }}>x</div>\n");
    }

    #[test]
    fn raw_children_are_indented_verbatim() {
        let el = Element::new("div").child(Node::Raw("<p>{a}</p>".to_string()));
        assert_eq!(el.render(), "<div>\n  <p>{a}</p>\n</div>\n");
    }

    #[test]
    fn set_attr_replaces() {
        let mut el = Element::new("h2").attr("id", "a");
        el.set_attr("id", "b");
        assert_eq!(el.get_attr("id"), Some("b"));
        assert_eq!(el.attrs.len(), 1);
    }
}
