//! Structural queries tried for each semantic type, most specific first.

use crate::domain::SemanticType;

/// Generic block containers scanned by the first fallback.
pub const GENERIC_CONTAINER_QUERIES: [&str; 7] = [
    "section",
    "article",
    "main",
    "[class*=section]",
    "[class*=container]",
    "[class*=wrapper]",
    "[class*=block]",
];

/// Ordered selector list for `kind`.
pub fn queries_for(kind: SemanticType) -> &'static [&'static str] {
    match kind {
        SemanticType::Header => &[
            "header",
            "[role=banner]",
            "#header",
            ".header",
            ".site-header",
            "[class*=navbar]",
            "nav",
        ],
        SemanticType::Hero => &[
            "section.hero",
            ".hero",
            "#hero",
            "[class*=hero]",
            "[class*=jumbotron]",
            "[class*=masthead]",
            "[class*=banner]",
        ],
        SemanticType::Features => &[
            "#features",
            ".features",
            "[class*=feature]",
            "[id*=feature]",
            "[class*=benefit]",
        ],
        SemanticType::Testimonials => &[
            "#testimonials",
            "[class*=testimonial]",
            "[id*=testimonial]",
            "[class*=review]",
        ],
        SemanticType::Pricing => &[
            "#pricing",
            "[class*=pricing]",
            "[id*=pricing]",
            "[class*=plans]",
        ],
        SemanticType::Cta => &[
            "#cta",
            "[class*=cta]",
            "[id*=cta]",
            "[class*=call-to-action]",
        ],
        SemanticType::Footer => &[
            "footer",
            "[role=contentinfo]",
            "#footer",
            "[class*=footer]",
        ],
        SemanticType::Cards => &[
            "[class*=cards]",
            "[class*=card-grid]",
            "[class*=card-list]",
        ],
        SemanticType::Gallery => &[
            "#gallery",
            "[class*=gallery]",
            "[id*=gallery]",
            "[class*=portfolio]",
        ],
        SemanticType::Contact => &[
            "#contact",
            "[id*=contact]",
            "[class*=contact]",
        ],
        SemanticType::Faq => &[
            "#faq",
            "[class*=faq]",
            "[id*=faq]",
            "[class*=accordion]",
        ],
        SemanticType::Stats => &[
            "[class*=stats]",
            "[class*=statistics]",
            "[class*=metrics]",
            "[class*=counters]",
        ],
        SemanticType::Team => &["#team", "[class*=team]", "[id*=team]"],
        SemanticType::Logos => &[
            "[class*=logos]",
            "[class*=clients]",
            "[class*=partners]",
            "[class*=brands]",
        ],
    }
}
