use formgen_core::form::{
    ArrayElement, ArraySpec, CompositeSpec, ContainerSpec, FieldAction, InputSpec, InputType,
    Renderer, SelectSpec,
};
use formgen_core::path::{JsonPath, PathSegment};
use minijinja::{Environment, Value, context};
use serde_json::Value as Json;

use crate::error::HtmlError;

/// Renders form widgets to HTML fragments.
///
/// Every control carries a `data-action` attribute holding its [`FieldAction`]
/// as JSON, so a page script can post edits back to a session.
pub struct HtmlRenderer {
    env: Environment<'static>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        for (name, source) in [
            ("container.html.j2", include_str!("../templates/container.html.j2")),
            ("input.html.j2", include_str!("../templates/input.html.j2")),
            ("select.html.j2", include_str!("../templates/select.html.j2")),
            ("array.html.j2", include_str!("../templates/array.html.j2")),
            ("composite.html.j2", include_str!("../templates/composite.html.j2")),
            ("form.html.j2", include_str!("../templates/form.html.j2")),
        ] {
            env.add_template(name, source)
                .expect("template should be valid");
        }
        Self { env }
    }

    pub(crate) fn render(&self, template: &str, ctx: Value) -> Result<String, HtmlError> {
        let tmpl = self.env.get_template(template)?;
        Ok(tmpl.render(ctx)?)
    }

    fn composite(
        &self,
        kind: &str,
        spec: CompositeSpec,
        parts: Vec<String>,
    ) -> Result<String, HtmlError> {
        self.render(
            "composite.html.j2",
            context! {
                id => element_id(&spec.path),
                label => spec.label,
                type_name => spec.type_name,
                style => spec.style,
                kind => kind,
                parts => safe(parts),
            },
        )
    }
}

/// A stable element id for the widget bound to `path`.
///
/// Segments are joined with `-`. Key characters outside `[A-Za-z0-9]`, and a
/// leading digit, are written as `_<hex>_`, so distinct paths never share an id.
pub fn element_id(path: &JsonPath) -> String {
    let mut id = String::from("form");
    for segment in path.segments() {
        id.push('-');
        match segment {
            PathSegment::Index(index) => id.push_str(&index.to_string()),
            PathSegment::Key(key) => {
                for (i, c) in key.chars().enumerate() {
                    if c.is_ascii_alphabetic() || (c.is_ascii_digit() && i > 0) {
                        id.push(c);
                    } else {
                        id.push_str(&format!("_{:x}_", u32::from(c)));
                    }
                }
            }
        }
    }
    id
}

/// The text shown in an input for `value`.
fn display_value(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn encode(action: &FieldAction) -> Result<String, HtmlError> {
    Ok(serde_json::to_string(action)?)
}

fn safe(fragments: Vec<String>) -> Vec<Value> {
    fragments.into_iter().map(Value::from_safe_string).collect()
}

impl Renderer for HtmlRenderer {
    type Output = String;
    type Error = HtmlError;

    fn render_container(
        &self,
        spec: ContainerSpec,
        children: Vec<String>,
    ) -> Result<String, HtmlError> {
        self.render(
            "container.html.j2",
            context! {
                id => element_id(&spec.path),
                label => spec.label,
                type_name => spec.type_name,
                name => spec.name,
                style => spec.style,
                header_style => spec.header_style,
                body_style => spec.body_style,
                children => safe(children),
            },
        )
    }

    fn render_primitive_input(&self, spec: InputSpec) -> Result<String, HtmlError> {
        let checkbox = spec.input_type == InputType::Checkbox;
        self.render(
            "input.html.j2",
            context! {
                id => element_id(&spec.path),
                path => spec.path.to_string(),
                label => spec.label,
                input_type => spec.input_type.as_html(),
                checkbox => checkbox,
                checked => spec.value.as_bool().unwrap_or(false),
                value => display_value(&spec.value),
                required => spec.required,
                disabled => spec.disabled,
                style => spec.style,
                input_style => spec.input_style,
                action => encode(&spec.on_change)?,
            },
        )
    }

    fn render_enum_select(&self, spec: SelectSpec) -> Result<String, HtmlError> {
        self.render(
            "select.html.j2",
            context! {
                id => element_id(&spec.path),
                path => spec.path.to_string(),
                label => spec.label,
                options => spec.options,
                value => spec.value,
                required => spec.required,
                disabled => spec.disabled,
                style => spec.style,
                select_style => spec.select_style,
                action => encode(&spec.on_change)?,
            },
        )
    }

    fn render_array_controls(
        &self,
        spec: ArraySpec,
        elements: Vec<ArrayElement<String>>,
    ) -> Result<String, HtmlError> {
        let elements = elements
            .into_iter()
            .map(|element| {
                Ok(context! {
                    index => element.index,
                    html => Value::from_safe_string(element.node),
                    action => encode(&element.on_remove)?,
                })
            })
            .collect::<Result<Vec<_>, HtmlError>>()?;
        self.render(
            "array.html.j2",
            context! {
                id => element_id(&spec.path),
                label => spec.label,
                disabled => spec.disabled,
                style => spec.style,
                element_style => spec.element_style,
                button_style => spec.button_style,
                add_action => encode(&spec.on_add)?,
                elements => elements,
            },
        )
    }

    fn render_composite_amount(
        &self,
        spec: CompositeSpec,
        parts: Vec<String>,
    ) -> Result<String, HtmlError> {
        self.composite("monetary-amount", spec, parts)
    }

    fn render_composite_duration(
        &self,
        spec: CompositeSpec,
        parts: Vec<String>,
    ) -> Result<String, HtmlError> {
        self.composite("duration", spec, parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgen_core::form::ChangeKind;
    use serde_json::json;

    fn path(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    fn text_input(p: &str, value: Json) -> InputSpec {
        InputSpec {
            path: path(p),
            label: Some("Title".to_string()),
            input_type: InputType::Text,
            value,
            required: true,
            disabled: false,
            style: "ui field ui required".to_string(),
            input_style: String::new(),
            on_change: FieldAction::Change {
                path: path(p),
                kind: ChangeKind::Text,
            },
        }
    }

    #[test]
    fn test_element_id() {
        assert_eq!(element_id(&JsonPath::root()), "form");
        assert_eq!(element_id(&path("$.businessDays")), "form-businessDays");
        assert_eq!(element_id(&path("$.ss[0]")), "form-ss-0");
        assert_eq!(element_id(&path("$.foo_bar")), "form-foo_5f_bar");
    }

    #[test]
    fn test_element_ids_are_distinct() {
        let ids = [
            "$.fooBar",
            "$.foo_bar",
            "$.foobar",
            "$.foo.bar",
            "$.foo[0]",
            "$.foo.a0",
            "$.ss[1]",
            "$.ss[1].x",
        ]
        .map(|p| element_id(&path(p)));
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_input_escapes_value() {
        let html = HtmlRenderer::new()
            .render_primitive_input(text_input("$.title", json!("<b>&</b>")))
            .unwrap();
        assert!(html.contains("value=\"&lt;b&gt;&amp;"), "{html}");
        assert!(!html.contains("<b>"));
        assert!(html.contains("<label for=\"form-title\">Title</label>"));
        assert!(html.contains(" required data-action="));
        assert!(!html.contains(" disabled"));
        assert!(html.contains("data-action=\"{&quot;action&quot;:&quot;change&quot;"));
    }

    #[test]
    fn test_checkbox_uses_checked_not_value() {
        let mut spec = text_input("$.b", json!(true));
        spec.input_type = InputType::Checkbox;
        spec.label = None;
        let html = HtmlRenderer::new().render_primitive_input(spec).unwrap();
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains(" checked"));
        assert!(!html.contains("value="));
        assert!(!html.contains("<label"));
    }

    #[test]
    fn test_select_marks_current_option() {
        let spec = SelectSpec {
            path: path("$.n"),
            label: Some("N".to_string()),
            options: vec!["ONE".to_string(), "TWO".to_string()],
            value: "TWO".to_string(),
            required: true,
            disabled: true,
            style: "ui field".to_string(),
            select_style: "ui fluid dropdown".to_string(),
            on_change: FieldAction::Change {
                path: path("$.n"),
                kind: ChangeKind::Select,
            },
        };
        let html = HtmlRenderer::new().render_enum_select(spec).unwrap();
        assert!(html.contains("<option value=\"ONE\">ONE</option>"));
        assert!(html.contains("<option value=\"TWO\" selected>TWO</option>"));
        assert!(html.contains(" disabled"));
    }

    #[test]
    fn test_children_are_not_escaped() {
        let spec = ContainerSpec {
            path: JsonPath::root(),
            label: None,
            type_name: "org.example.Foo".to_string(),
            name: "Foo".to_string(),
            style: String::new(),
            header_style: Some("ui dividing header".to_string()),
            body_style: "classElement".to_string(),
        };
        let html = HtmlRenderer::new()
            .render_container(spec, vec!["<input id=\"x\">".to_string()])
            .unwrap();
        assert!(html.contains("<h4 class=\"ui dividing header\">Foo</h4>"));
        assert!(html.contains("<input id=\"x\">"));
    }
}
