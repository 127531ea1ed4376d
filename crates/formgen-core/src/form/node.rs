use serde::Serialize;
use serde_json::{Number, Value};

use crate::datetime::from_datetime_local;
use crate::path::JsonPath;

/// Input widget kind for a primitive value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Checkbox,
    Text,
    Number,
    DateTimeLocal,
    /// Unmapped type names pass through unchanged.
    Other(String),
}

impl InputType {
    /// The HTML `type` attribute.
    pub fn as_html(&self) -> &str {
        match self {
            InputType::Checkbox => "checkbox",
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::DateTimeLocal => "datetime-local",
            InputType::Other(name) => name,
        }
    }
}

/// How the raw value from an editor is turned into instance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Checkbox,
    Text,
    Integer,
    Double,
    DateTime,
    Select,
    Reference,
}

/// What an editor hands back on change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditValue {
    Checked(bool),
    Text(String),
}

impl ChangeKind {
    pub fn coerce(self, edit: EditValue) -> Value {
        let text = match edit {
            EditValue::Checked(checked) => return Value::Bool(checked),
            EditValue::Text(text) => text,
        };
        match self {
            ChangeKind::Checkbox => Value::Bool(matches!(text.trim(), "true" | "on" | "1")),
            ChangeKind::Integer => match text.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(text),
            },
            ChangeKind::Double => match text.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(text),
            },
            ChangeKind::DateTime => match from_datetime_local(text.trim()) {
                Some(stored) => Value::String(stored),
                None => Value::String(text),
            },
            ChangeKind::Text | ChangeKind::Select | ChangeKind::Reference => Value::String(text),
        }
    }
}

/// A handler attached to a node, expressed as data so the session can run it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FieldAction {
    /// Write the coerced edit value at `path`.
    Change { path: JsonPath, kind: ChangeKind },
    /// Append `seed` to the array at `path`.
    Add { path: JsonPath, seed: Value },
    /// Remove element `index` from the array at `path`.
    Remove { path: JsonPath, index: usize },
}

impl FieldAction {
    pub fn path(&self) -> &JsonPath {
        match self {
            FieldAction::Change { path, .. }
            | FieldAction::Add { path, .. }
            | FieldAction::Remove { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSpec {
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fully-qualified name of the rendered concrete class.
    pub type_name: String,
    pub name: String,
    pub style: String,
    /// Heading style of the root class; nested classes have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_style: Option<String>,
    pub body_style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub input_type: InputType,
    /// Value as displayed; date-times are already in local form.
    pub value: Value,
    pub required: bool,
    pub disabled: bool,
    pub style: String,
    pub input_style: String,
    pub on_change: FieldAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectSpec {
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub options: Vec<String>,
    pub value: String,
    pub required: bool,
    pub disabled: bool,
    pub style: String,
    pub select_style: String,
    pub on_change: FieldAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArraySpec {
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub style: String,
    pub element_style: String,
    pub button_style: String,
    pub on_add: FieldAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayElement<T> {
    pub index: usize,
    pub node: T,
    pub on_remove: FieldAction,
}

/// A two-field value type rendered as one compact widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSpec {
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub type_name: String,
    pub style: String,
}

/// One node of a form descriptor tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormNode {
    Container {
        #[serde(flatten)]
        spec: ContainerSpec,
        children: Vec<FormNode>,
    },
    Input(InputSpec),
    Select(SelectSpec),
    Array {
        #[serde(flatten)]
        spec: ArraySpec,
        elements: Vec<ArrayElement<FormNode>>,
    },
    MonetaryAmount {
        #[serde(flatten)]
        spec: CompositeSpec,
        parts: Vec<FormNode>,
    },
    Duration {
        #[serde(flatten)]
        spec: CompositeSpec,
        parts: Vec<FormNode>,
    },
}

impl FormNode {
    pub fn path(&self) -> &JsonPath {
        match self {
            FormNode::Container { spec, .. } => &spec.path,
            FormNode::Input(spec) => &spec.path,
            FormNode::Select(spec) => &spec.path,
            FormNode::Array { spec, .. } => &spec.path,
            FormNode::MonetaryAmount { spec, .. } | FormNode::Duration { spec, .. } => &spec.path,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            FormNode::Container { spec, .. } => spec.label.as_deref(),
            FormNode::Input(spec) => spec.label.as_deref(),
            FormNode::Select(spec) => spec.label.as_deref(),
            FormNode::Array { spec, .. } => spec.label.as_deref(),
            FormNode::MonetaryAmount { spec, .. } | FormNode::Duration { spec, .. } => {
                spec.label.as_deref()
            }
        }
    }

    pub fn children(&self) -> Vec<&FormNode> {
        match self {
            FormNode::Container { children, .. } => children.iter().collect(),
            FormNode::Array { elements, .. } => elements.iter().map(|e| &e.node).collect(),
            FormNode::MonetaryAmount { parts, .. } | FormNode::Duration { parts, .. } => {
                parts.iter().collect()
            }
            FormNode::Input(_) | FormNode::Select(_) => Vec::new(),
        }
    }

    /// Every node, depth-first in render order.
    pub fn walk(&self) -> Vec<&FormNode> {
        let mut out = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            out.push(node);
            pending.extend(node.children().into_iter().rev());
        }
        out
    }

    /// The outermost node bound to `path`.
    pub fn find(&self, path: &JsonPath) -> Option<&FormNode> {
        self.walk().into_iter().find(|n| n.path() == path)
    }

    /// Handlers attached to this node only, not its descendants.
    pub fn actions(&self) -> Vec<&FieldAction> {
        match self {
            FormNode::Input(spec) => vec![&spec.on_change],
            FormNode::Select(spec) => vec![&spec.on_change],
            FormNode::Array { spec, elements } => std::iter::once(&spec.on_add)
                .chain(elements.iter().map(|e| &e.on_remove))
                .collect(),
            FormNode::Container { .. }
            | FormNode::MonetaryAmount { .. }
            | FormNode::Duration { .. } => Vec::new(),
        }
    }

    /// The change handler of the input or select bound to `path`.
    pub fn change_action(&self, path: &JsonPath) -> Option<&FieldAction> {
        self.walk().into_iter().find_map(|n| match n {
            FormNode::Input(spec) if spec.path == *path => Some(&spec.on_change),
            FormNode::Select(spec) if spec.path == *path => Some(&spec.on_change),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(path: &str, value: Value) -> FormNode {
        let path: JsonPath = path.parse().unwrap();
        FormNode::Input(InputSpec {
            label: None,
            input_type: InputType::Text,
            value,
            required: true,
            disabled: false,
            style: String::new(),
            input_style: String::new(),
            on_change: FieldAction::Change {
                path: path.clone(),
                kind: ChangeKind::Text,
            },
            path,
        })
    }

    fn tree() -> FormNode {
        FormNode::Container {
            spec: ContainerSpec {
                path: JsonPath::root(),
                label: None,
                type_name: "org.example.Foo".to_string(),
                name: "Foo".to_string(),
                style: String::new(),
                header_style: None,
                body_style: String::new(),
            },
            children: vec![
                input("$.s", json!("x")),
                FormNode::Array {
                    spec: ArraySpec {
                        path: "$.ss".parse().unwrap(),
                        label: Some("Ss".to_string()),
                        required: true,
                        disabled: false,
                        style: String::new(),
                        element_style: String::new(),
                        button_style: String::new(),
                        on_add: FieldAction::Add {
                            path: "$.ss".parse().unwrap(),
                            seed: json!(""),
                        },
                    },
                    elements: vec![ArrayElement {
                        index: 0,
                        node: input("$.ss[0]", json!("a")),
                        on_remove: FieldAction::Remove {
                            path: "$.ss".parse().unwrap(),
                            index: 0,
                        },
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_walk_is_depth_first_in_order() {
        let t = tree();
        let paths: Vec<String> = t.walk().iter().map(|n| n.path().to_string()).collect();
        assert_eq!(paths, vec!["$", "$.s", "$.ss", "$.ss[0]"]);
    }

    #[test]
    fn test_find_and_actions() {
        let t = tree();
        let ss = t.find(&"$.ss".parse().unwrap()).unwrap();
        assert_eq!(ss.label(), Some("Ss"));
        assert_eq!(ss.actions().len(), 2);
        assert!(t.find(&"$.nope".parse().unwrap()).is_none());
        assert!(matches!(
            t.change_action(&"$.ss[0]".parse().unwrap()),
            Some(FieldAction::Change { kind: ChangeKind::Text, .. })
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let node = input("$.s", json!("x"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["kind"], json!("input"));
        assert_eq!(value["path"], json!("$.s"));
        assert_eq!(value["input_type"], json!("text"));
        assert_eq!(
            value["on_change"],
            json!({"action": "change", "path": "$.s", "kind": "text"})
        );
        let array = serde_json::to_value(tree()).unwrap();
        assert_eq!(array["children"][1]["kind"], json!("array"));
        assert_eq!(array["children"][1]["on_add"]["seed"], json!(""));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(ChangeKind::Checkbox.coerce(EditValue::Checked(true)), json!(true));
        assert_eq!(ChangeKind::Checkbox.coerce(EditValue::Text("on".into())), json!(true));
        assert_eq!(ChangeKind::Text.coerce(EditValue::Text("42".into())), json!("42"));
        assert_eq!(ChangeKind::Integer.coerce(EditValue::Text("42".into())), json!(42));
        assert_eq!(ChangeKind::Integer.coerce(EditValue::Text("4x".into())), json!("4x"));
        assert_eq!(ChangeKind::Double.coerce(EditValue::Text("2.5".into())), json!(2.5));
        assert_eq!(
            ChangeKind::DateTime.coerce(EditValue::Text("soon".into())),
            json!("soon")
        );
        let stored = ChangeKind::DateTime.coerce(EditValue::Text("2024-03-01T12:30:45".into()));
        assert!(stored.as_str().unwrap().ends_with(".000Z"));
    }

    #[test]
    fn test_input_type_html() {
        assert_eq!(InputType::DateTimeLocal.as_html(), "datetime-local");
        assert_eq!(InputType::Other("Foo".into()).as_html(), "Foo");
    }
}
