use formgen_core::FormGenerator;
use formgen_core::error::FormError;
use formgen_core::model::SchemaLibrary;
use heck::ToKebabCase;
use log::debug;
use minijinja::{Value, context};
use serde_json::Value as Json;

use crate::renderer::HtmlRenderer;

/// Render the form for `fqn` over `instance` as a complete `<form>` element.
pub fn emit_form<L: SchemaLibrary>(
    generator: &FormGenerator<L>,
    fqn: &str,
    instance: &Json,
) -> Result<String, FormError> {
    let renderer = HtmlRenderer::new();
    let body = generator.generate_form(fqn, instance, &renderer)?;
    let html = renderer
        .render(
            "form.html.j2",
            context! {
                id => format!("formgen-{}", fqn.to_kebab_case()),
                type_name => fqn,
                body => Value::from_safe_string(body),
            },
        )
        .map_err(|e| FormError::Render(e.to_string()))?;
    debug!("rendered {} bytes of HTML for {fqn}", html.len());
    Ok(html)
}
