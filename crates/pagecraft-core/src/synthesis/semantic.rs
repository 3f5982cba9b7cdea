//! Semantic strategy: a clean per-type template filled with extracted text.

use super::source::{render_module, validate_source, ExportStyle};
use super::templates::{self, Slots};
use super::{component_name, SynthesisError, SynthesisOptions};
use crate::domain::{Region, StrategyKind, Variant};

pub(crate) fn render(region: &Region, options: &SynthesisOptions) -> Result<Variant, SynthesisError> {
    let content = region.effective_content();
    let slots = Slots::from_content(region.kind, &content);
    let tree = templates::build(region.kind, &slots, &options.tokens())
        .attr("data-region", region.id.as_str());

    let name = component_name(region, StrategyKind::Semantic);
    let code = render_module(&name, None, &tree.render(), ExportStyle::Plain);
    validate_source(&code, options.max_source_bytes, true)?;

    let source = if slots.from_content {
        "populated from page content"
    } else {
        "with placeholder content"
    };
    Ok(Variant::new(
        StrategyKind::Semantic,
        format!("Semantic {} template {source}", region.kind),
        code,
    ))
}
