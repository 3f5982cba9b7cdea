//! Per-type layout templates shared by the semantic and accessible strategies.
//!
//! Each semantic type has its own template. Slots are filled from the
//! region's extracted content; anything missing gets a structural
//! placeholder so an empty region still renders.

use super::node::{Element, Node};
use crate::markup::jsx::is_script_url;
use crate::domain::{DesignTokens, ExtractedContent, Image, Link, SemanticType};

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400";

/// A repeated entry: feature, plan, quote, question, member, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub body: Option<String>,
}

/// Content slots for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots {
    pub headline: String,
    pub lead: Option<String>,
    pub items: Vec<Item>,
    pub primary: Option<Link>,
    pub secondary: Option<Link>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    /// True when at least the headline came from the page.
    pub from_content: bool,
}

fn placeholder_headline(kind: SemanticType) -> &'static str {
    match kind {
        SemanticType::Header | SemanticType::Footer => "Brand",
        SemanticType::Hero => "Your headline here",
        SemanticType::Features => "Features",
        SemanticType::Testimonials => "What our customers say",
        SemanticType::Pricing => "Simple, transparent pricing",
        SemanticType::Cta => "Ready to get started?",
        SemanticType::Cards => "Highlights",
        SemanticType::Gallery => "Gallery",
        SemanticType::Contact => "Get in touch",
        SemanticType::Faq => "Frequently asked questions",
        SemanticType::Stats => "By the numbers",
        SemanticType::Team => "Meet the team",
        SemanticType::Logos => "Trusted by",
    }
}

fn placeholder_item(kind: SemanticType, n: usize) -> Item {
    let (title, body) = match kind {
        SemanticType::Testimonials => (
            format!("Customer {n}"),
            Some("Share a short testimonial here.".to_string()),
        ),
        SemanticType::Pricing => (format!("Plan {n}"), Some("Describe what is included.".to_string())),
        SemanticType::Faq => (format!("Question {n}"), Some("Answer goes here.".to_string())),
        SemanticType::Stats => (format!("{}0+", n * 10), Some(format!("Metric {n}"))),
        SemanticType::Team => (format!("Team member {n}"), Some("Role".to_string())),
        SemanticType::Logos => (format!("Partner {n}"), None),
        SemanticType::Cards => (format!("Card {n}"), Some("Short description.".to_string())),
        _ => (format!("Feature {n}"), Some("Describe this feature.".to_string())),
    };
    Item { title, body }
}

fn placeholder_links(kind: SemanticType) -> Vec<Link> {
    let labels: &[&str] = match kind {
        SemanticType::Header => &["Home", "Features", "Pricing", "Contact"],
        SemanticType::Footer => &["Privacy", "Terms", "Contact"],
        _ => &[],
    };
    labels
        .iter()
        .map(|label| Link {
            text: (*label).to_string(),
            href: Some("#".to_string()),
        })
        .collect()
}

impl Slots {
    pub fn from_content(kind: SemanticType, content: &ExtractedContent) -> Self {
        let headline = content.headline().map(str::to_string);
        let from_content = headline.is_some();
        let subheadings = content.subheadings();

        let mut items: Vec<Item> = subheadings
            .iter()
            .enumerate()
            .map(|(i, title)| Item {
                title: (*title).to_string(),
                body: content.paragraphs.get(i + 1).cloned(),
            })
            .collect();
        if items.is_empty() && content.paragraphs.len() > 1 {
            items = content.paragraphs[1..]
                .iter()
                .enumerate()
                .map(|(i, p)| Item {
                    title: placeholder_item(kind, i + 1).title,
                    body: Some(p.clone()),
                })
                .collect();
        }
        if items.is_empty() {
            items = (1..=3).map(|n| placeholder_item(kind, n)).collect();
        }

        let links = if content.links.is_empty() {
            placeholder_links(kind)
        } else {
            content.links.clone()
        };

        Self {
            headline: headline.unwrap_or_else(|| placeholder_headline(kind).to_string()),
            lead: content.paragraphs.first().cloned(),
            items,
            primary: content.primary_cta().cloned(),
            secondary: content.secondary_cta().cloned(),
            links,
            images: content.images.clone(),
            from_content,
        }
    }
}

fn heading_tag(kind: SemanticType) -> &'static str {
    if kind == SemanticType::Hero {
        "h1"
    } else {
        "h2"
    }
}

fn href(link: &Link) -> String {
    match link.href.as_deref() {
        Some(url) if !is_script_url(url) => url.to_string(),
        _ => "#".to_string(),
    }
}

fn button(link: &Link, class: &str, tokens: &DesignTokens, primary: bool) -> Node {
    let mut el = Element::new("a")
        .class(class)
        .attr("href", href(link))
        .style("border-radius", tokens.radius());
    if primary {
        el = el
            .style("background-color", tokens.primary_color())
            .style("color", tokens.background_color());
    } else {
        el = el
            .style("border-color", tokens.primary_color())
            .style("color", tokens.primary_color());
    }
    el.text(&link.text).into()
}

fn actions(slots: &Slots, tokens: &DesignTokens, fallback: &str) -> Element {
    let primary = slots.primary.clone().unwrap_or_else(|| Link {
        text: fallback.to_string(),
        href: Some("#".to_string()),
    });
    let mut el = Element::new("div")
        .class("actions")
        .child(button(&primary, "button button-primary", tokens, true));
    if let Some(secondary) = &slots.secondary {
        el = el.child(button(secondary, "button button-secondary", tokens, false));
    }
    el
}

fn heading(kind: SemanticType, slots: &Slots, class: &str) -> Node {
    Element::new(heading_tag(kind))
        .class(class)
        .text(&slots.headline)
        .into()
}

fn lead(slots: &Slots, class: &str) -> Option<Node> {
    slots
        .lead
        .as_ref()
        .map(|p| Element::new("p").class(class).text(p).into())
}

fn image(img: &Image) -> Node {
    let src = if is_script_url(&img.src) {
        PLACEHOLDER_IMAGE
    } else {
        img.src.as_str()
    };
    Element::new("img")
        .attr("src", src)
        .attr("alt", img.alt.as_str())
        .attr("loading", "lazy")
        .into()
}

fn item_body(item: &Item) -> Option<Node> {
    item.body
        .as_ref()
        .map(|b| Element::new("p").text(b).into())
}

fn link_list(links: &[Link]) -> Element {
    Element::new("ul").children(links.iter().map(|l| {
        Element::new("li")
            .child(Element::new("a").attr("href", href(l)).text(&l.text))
            .into()
    }))
}

/// Root element with section-level token styling.
fn root(tag: &str, class: &str, tokens: &DesignTokens) -> Element {
    Element::new(tag)
        .class(class)
        .style("background-color", tokens.background_color())
        .style("color", tokens.text_color())
        .style("font-family", tokens.font_family())
        .style("padding", tokens.section_padding())
}

fn header(slots: &Slots, tokens: &DesignTokens) -> Element {
    let mut el = root("header", "site-header", tokens)
        .child(
            Element::new("a")
                .class("brand")
                .attr("href", "/")
                .text(&slots.headline),
        )
        .child(Element::new("nav").child(link_list(&slots.links)));
    if let Some(primary) = &slots.primary {
        el = el.child(button(primary, "button button-primary", tokens, true));
    }
    el
}

fn hero(slots: &Slots, tokens: &DesignTokens) -> Element {
    let mut el = root("section", "hero", tokens).child(heading(SemanticType::Hero, slots, "hero-title"));
    if let Some(p) = lead(slots, "hero-subtitle") {
        el = el.child(p);
    }
    el = el.child(actions(slots, tokens, "Get started"));
    if let Some(img) = slots.images.first() {
        el = el.child(Element::new("div").class("hero-media").child(image(img)));
    }
    el
}

fn features(slots: &Slots, tokens: &DesignTokens) -> Element {
    let mut el = root("section", "features", tokens).child(heading(SemanticType::Features, slots, "section-title"));
    if let Some(p) = lead(slots, "section-lead") {
        el = el.child(p);
    }
    el.child(
        Element::new("ul").class("feature-list").children(slots.items.iter().map(|item| {
            Element::new("li")
                .class("feature")
                .child(Element::new("h3").text(&item.title))
                .children(item_body(item))
                .into()
        })),
    )
}

fn testimonials(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("section", "testimonials", tokens)
        .child(heading(SemanticType::Testimonials, slots, "section-title"))
        .child(
            Element::new("div").class("testimonial-list").children(slots.items.iter().map(|item| {
                Element::new("figure")
                    .class("testimonial")
                    .child(
                        Element::new("blockquote").child(
                            Element::new("p").text(item.body.as_deref().unwrap_or(&item.title)),
                        ),
                    )
                    .child(Element::new("figcaption").text(&item.title))
                    .into()
            })),
        )
}

fn pricing(slots: &Slots, tokens: &DesignTokens) -> Element {
    let cta = slots.primary.clone().unwrap_or_else(|| Link {
        text: "Choose plan".to_string(),
        href: Some("#".to_string()),
    });
    let mut el = root("section", "pricing", tokens).child(heading(SemanticType::Pricing, slots, "section-title"));
    if let Some(p) = lead(slots, "section-lead") {
        el = el.child(p);
    }
    el.child(
        Element::new("div").class("plans").children(slots.items.iter().map(|item| {
            Element::new("article")
                .class("plan")
                .style("border-radius", tokens.radius())
                .child(Element::new("h3").text(&item.title))
                .children(item_body(item))
                .child(button(&cta, "button button-primary", tokens, true))
                .into()
        })),
    )
}

fn cta(slots: &Slots, tokens: &DesignTokens) -> Element {
    let mut el = root("section", "cta", tokens).child(heading(SemanticType::Cta, slots, "cta-title"));
    if let Some(p) = lead(slots, "cta-text") {
        el = el.child(p);
    }
    el.child(actions(slots, tokens, "Get started"))
}

fn footer(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("footer", "site-footer", tokens)
        .child(Element::new("p").class("brand").text(&slots.headline))
        .child(Element::new("nav").child(link_list(&slots.links)))
        .child(
            Element::new("small")
                .class("legal")
                .text(slots.lead.as_deref().unwrap_or("All rights reserved.")),
        )
}

fn cards(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("section", "cards", tokens)
        .child(heading(SemanticType::Cards, slots, "section-title"))
        .child(
            Element::new("div").class("card-grid").children(slots.items.iter().enumerate().map(
                |(i, item)| {
                    Element::new("article")
                        .class("card")
                        .style("border-radius", tokens.radius())
                        .children(slots.images.get(i).map(image))
                        .child(Element::new("h3").text(&item.title))
                        .children(item_body(item))
                        .into()
                },
            )),
        )
}

fn gallery(slots: &Slots, tokens: &DesignTokens) -> Element {
    let images: Vec<Image> = if slots.images.is_empty() {
        (1..=6)
            .map(|n| Image {
                src: PLACEHOLDER_IMAGE.to_string(),
                alt: format!("Gallery image {n}"),
            })
            .collect()
    } else {
        slots.images.clone()
    };
    root("section", "gallery", tokens)
        .child(heading(SemanticType::Gallery, slots, "section-title"))
        .child(Element::new("div").class("gallery-grid").children(images.iter().map(|img| {
            let mut figure = Element::new("figure").child(image(img));
            if !img.alt.is_empty() {
                figure = figure.child(Element::new("figcaption").text(&img.alt));
            }
            figure.into()
        })))
}

fn field(id: &str, label: &str, control: Element) -> Node {
    Element::new("div")
        .class("field")
        .child(Element::new("label").attr("htmlFor", id).text(label))
        .child(control.attr("id", id).attr("name", id))
        .into()
}

fn contact(slots: &Slots, tokens: &DesignTokens) -> Element {
    let submit = slots
        .primary
        .as_ref()
        .map(|l| l.text.clone())
        .unwrap_or_else(|| "Send message".to_string());
    let mut el = root("section", "contact", tokens).child(heading(SemanticType::Contact, slots, "section-title"));
    if let Some(p) = lead(slots, "section-lead") {
        el = el.child(p);
    }
    el.child(
        Element::new("form")
            .class("contact-form")
            .child(field("name", "Name", Element::new("input").attr("type", "text")))
            .child(field("email", "Email", Element::new("input").attr("type", "email")))
            .child(field("message", "Message", Element::new("textarea").attr("rows", "4")))
            .child(
                Element::new("button")
                    .class("button button-primary")
                    .attr("type", "submit")
                    .style("background-color", tokens.primary_color())
                    .style("border-radius", tokens.radius())
                    .text(&submit),
            ),
    )
}

fn faq(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("section", "faq", tokens)
        .child(heading(SemanticType::Faq, slots, "section-title"))
        .child(Element::new("div").class("faq-list").children(slots.items.iter().map(|item| {
            Element::new("details")
                .child(Element::new("summary").text(&item.title))
                .children(item_body(item))
                .into()
        })))
}

fn stats(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("section", "stats", tokens)
        .child(heading(SemanticType::Stats, slots, "section-title"))
        .child(Element::new("dl").class("stat-list").children(slots.items.iter().map(|item| {
            Element::new("div")
                .class("stat")
                .child(Element::new("dt").text(item.body.as_deref().unwrap_or("Metric")))
                .child(Element::new("dd").text(&item.title))
                .into()
        })))
}

fn team(slots: &Slots, tokens: &DesignTokens) -> Element {
    root("section", "team", tokens)
        .child(heading(SemanticType::Team, slots, "section-title"))
        .child(Element::new("ul").class("team-list").children(slots.items.iter().enumerate().map(
            |(i, item)| {
                Element::new("li")
                    .class("member")
                    .children(slots.images.get(i).map(image))
                    .child(Element::new("h3").text(&item.title))
                    .children(item_body(item))
                    .into()
            },
        )))
}

fn logos(slots: &Slots, tokens: &DesignTokens) -> Element {
    let entries: Vec<Node> = if slots.images.is_empty() {
        slots
            .items
            .iter()
            .map(|item| {
                Element::new("li")
                    .child(Element::new("span").class("logo").text(&item.title))
                    .into()
            })
            .collect()
    } else {
        slots
            .images
            .iter()
            .map(|img| Element::new("li").child(image(img)).into())
            .collect()
    };
    root("section", "logos", tokens)
        .child(heading(SemanticType::Logos, slots, "section-title"))
        .child(Element::new("ul").class("logo-list").children(entries))
}

/// Build the template tree for `kind`.
pub fn build(kind: SemanticType, slots: &Slots, tokens: &DesignTokens) -> Element {
    match kind {
        SemanticType::Header => header(slots, tokens),
        SemanticType::Hero => hero(slots, tokens),
        SemanticType::Features => features(slots, tokens),
        SemanticType::Testimonials => testimonials(slots, tokens),
        SemanticType::Pricing => pricing(slots, tokens),
        SemanticType::Cta => cta(slots, tokens),
        SemanticType::Footer => footer(slots, tokens),
        SemanticType::Cards => cards(slots, tokens),
        SemanticType::Gallery => gallery(slots, tokens),
        SemanticType::Contact => contact(slots, tokens),
        SemanticType::Faq => faq(slots, tokens),
        SemanticType::Stats => stats(slots, tokens),
        SemanticType::Team => team(slots, tokens),
        SemanticType::Logos => logos(slots, tokens),
    }
}

/// Landmark element each template is rooted in.
pub fn landmark(kind: SemanticType) -> &'static str {
    match kind {
        SemanticType::Header => "header",
        SemanticType::Footer => "footer",
        _ => "section",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Heading;

    fn content() -> ExtractedContent {
        ExtractedContent {
            headings: vec![
                Heading { level: 2, text: "Fast".into() },
                Heading { level: 1, text: "Welcome".into() },
                Heading { level: 3, text: "Secure".into() },
            ],
            paragraphs: vec!["Lead text".into(), "Fast body".into(), "Secure body".into()],
            buttons: vec![Link { text: "Start".into(), href: Some("/start".into()) }],
            ..Default::default()
        }
    }

    #[test]
    fn slots_pair_subheadings_with_paragraphs() {
        let slots = Slots::from_content(SemanticType::Features, &content());
        assert_eq!(slots.headline, "Welcome");
        assert_eq!(slots.lead.as_deref(), Some("Lead text"));
        assert_eq!(slots.items[0].title, "Fast");
        assert_eq!(slots.items[0].body.as_deref(), Some("Fast body"));
        assert_eq!(slots.items[1].title, "Secure");
        assert!(slots.from_content);
    }

    #[test]
    fn empty_content_uses_placeholders() {
        let slots = Slots::from_content(SemanticType::Pricing, &ExtractedContent::default());
        assert_eq!(slots.headline, "Simple, transparent pricing");
        assert_eq!(slots.items.len(), 3);
        assert!(!slots.from_content);
    }

    #[test]
    fn every_kind_renders_its_landmark() {
        let tokens = DesignTokens::default();
        for kind in SemanticType::ALL {
            let slots = Slots::from_content(kind, &ExtractedContent::default());
            let tree = build(kind, &slots, &tokens);
            assert_eq!(tree.tag, landmark(kind), "{kind}");
            assert!(!tree.render().is_empty());
        }
    }

    #[test]
    fn hero_headline_is_h1() {
        let slots = Slots::from_content(SemanticType::Hero, &content());
        let jsx = build(SemanticType::Hero, &slots, &DesignTokens::default()).render();
        assert!(jsx.contains("<h1 className=\"hero-title\">Welcome</h1>"));
        assert!(jsx.contains("href=\"/start\""));
    }

    #[test]
    fn script_urls_never_reach_the_template() {
        let content = ExtractedContent {
            headings: vec![Heading { level: 1, text: "Welcome".into() }],
            buttons: vec![Link {
                text: "Go".into(),
                href: Some("javascript:alert(document.cookie)".into()),
            }],
            links: vec![Link { text: "Docs".into(), href: Some(" VBScript:msgbox".into()) }],
            images: vec![Image { src: "data:text/html,<script>x</script>".into(), alt: "".into() }],
            ..Default::default()
        };
        let tokens = DesignTokens::default();
        for kind in [SemanticType::Hero, SemanticType::Header, SemanticType::Gallery] {
            let slots = Slots::from_content(kind, &content);
            let jsx = build(kind, &slots, &tokens).render().to_ascii_lowercase();
            assert!(!jsx.contains("javascript:"), "{kind}");
            assert!(!jsx.contains("vbscript:"), "{kind}");
            assert!(!jsx.contains("data:text/html"), "{kind}");
        }
    }

    #[test]
    fn contact_form_labels_every_field() {
        let slots = Slots::from_content(SemanticType::Contact, &ExtractedContent::default());
        let jsx = build(SemanticType::Contact, &slots, &DesignTokens::default()).render();
        for id in ["name", "email", "message"] {
            assert!(jsx.contains(&format!("htmlFor=\"{id}\"")), "{id}");
        }
        assert!(jsx.contains("Send message"));
    }
}
