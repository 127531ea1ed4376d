use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::model::Property;

/// Top-level project configuration loaded from `.formgen.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormgenConfig {
    /// Model documents to load, in order.
    pub models: Vec<String>,
    /// Fully-qualified name of the type to edit.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// JSON instance to start from.
    pub instance: Option<String>,
    /// Where `render` writes the HTML form.
    pub output: Option<String>,
    pub form: FormOptions,
}

/// How default instances are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Well-typed placeholder values.
    Sample,
    /// Minimal values: empty strings, zeroes, `false`, empty arrays.
    Empty,
}

/// Options controlling instance synthesis and form rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    #[serde(alias = "includeOptionalFields")]
    pub include_optional_fields: bool,
    /// `None` disables generating default instances altogether.
    #[serde(alias = "includeSampleData")]
    pub include_sample_data: Option<GenerationMode>,
    #[serde(alias = "read_only", alias = "readOnly")]
    pub disabled: bool,
    #[serde(alias = "hideIdentifiers")]
    pub hide_identifiers: bool,
    #[serde(alias = "hiddenFields")]
    pub hidden_fields: Vec<HiddenField>,
    #[serde(alias = "customClasses")]
    pub custom_classes: CustomClasses,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            include_optional_fields: true,
            include_sample_data: Some(GenerationMode::Sample),
            disabled: false,
            hide_identifiers: false,
            hidden_fields: Vec::new(),
            custom_classes: CustomClasses::default(),
        }
    }
}

impl FormOptions {
    /// True when a configured entry hides `property`.
    pub fn hides(&self, property: &Property) -> bool {
        self.hidden_fields.iter().any(|f| f.matches(property))
    }
}

pub type HiddenPredicate = Arc<dyn Fn(&Property) -> bool + Send + Sync>;

/// A property excluded from rendering: by FQN, or by predicate.
#[derive(Clone)]
pub enum HiddenField {
    Name(String),
    Predicate(HiddenPredicate),
}

impl HiddenField {
    pub fn predicate(f: impl Fn(&Property) -> bool + Send + Sync + 'static) -> Self {
        HiddenField::Predicate(Arc::new(f))
    }

    pub fn matches(&self, property: &Property) -> bool {
        match self {
            HiddenField::Name(fqn) => *fqn == property.fully_qualified_name(),
            HiddenField::Predicate(f) => f(property),
        }
    }
}

impl fmt::Debug for HiddenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiddenField::Name(name) => f.debug_tuple("Name").field(name).finish(),
            HiddenField::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for HiddenField {
    fn from(fqn: &str) -> Self {
        HiddenField::Name(fqn.to_string())
    }
}

impl<'de> Deserialize<'de> for HiddenField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(HiddenField::Name)
    }
}

/// Style tags per widget category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomClasses {
    pub field: String,
    pub declaration: String,
    #[serde(alias = "declarationHeader")]
    pub declaration_header: String,
    pub enumeration: String,
    pub required: String,
    pub boolean: String,
    pub button: String,
    #[serde(alias = "arrayElement")]
    pub array_element: String,
    #[serde(alias = "classElement")]
    pub class_element: String,
    pub input: String,
}

impl Default for CustomClasses {
    fn default() -> Self {
        Self {
            field: "ui field".to_string(),
            declaration: "ui field".to_string(),
            declaration_header: "ui dividing header".to_string(),
            enumeration: "ui fluid dropdown".to_string(),
            required: "ui required".to_string(),
            boolean: "ui toggle checkbox".to_string(),
            button: "ui fluid button basic fullHeight".to_string(),
            array_element: "arrayElement".to_string(),
            class_element: "classElement".to_string(),
            input: String::new(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".formgen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<FormgenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# formgen configuration
models:
  - model.yaml
# type: org.example.Order     # defaults to the first concrete type
# instance: order.json        # defaults to a synthesized instance
output: form.html

form:
  include_optional_fields: true
  include_sample_data: sample   # sample | empty | ~ (never synthesize)
  disabled: false
  hide_identifiers: false
  hidden_fields: []
    # - org.example.Order.internalNote
  custom_classes:
    field: ui field
    declaration: ui field
    declaration_header: ui dividing header
    enumeration: ui fluid dropdown
    required: ui required
    boolean: ui toggle checkbox
    button: ui fluid button basic fullHeight
    array_element: arrayElement
    class_element: classElement
    input: ""
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrimitiveKind, PropertyKind, TypeRef};

    fn property(declaring: &str, name: &str) -> Property {
        Property {
            name: name.to_string(),
            type_ref: TypeRef::Primitive(PrimitiveKind::String),
            array: false,
            optional: false,
            kind: PropertyKind::Field,
            declaring_type: declaring.to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = FormgenConfig::default();
        assert!(config.models.is_empty());
        assert!(config.type_name.is_none());
        assert!(config.form.include_optional_fields);
        assert_eq!(config.form.include_sample_data, Some(GenerationMode::Sample));
        assert!(!config.form.disabled);
        assert_eq!(config.form.custom_classes.field, "ui field");
        assert_eq!(config.form.custom_classes.input, "");
    }

    #[test]
    fn test_default_content_parses() {
        let config: FormgenConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.models, vec!["model.yaml".to_string()]);
        assert_eq!(config.output.as_deref(), Some("form.html"));
        assert_eq!(config.form.custom_classes, CustomClasses::default());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
models: [a.yaml, b.yaml]
type: org.example.Foo
form:
  include_sample_data: empty
  readOnly: true
  hide_identifiers: true
  hidden_fields:
    - org.example.Foo.secret
  custom_classes:
    field: my-field
"#;
        let config: FormgenConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.type_name.as_deref(), Some("org.example.Foo"));
        assert_eq!(config.form.include_sample_data, Some(GenerationMode::Empty));
        assert!(config.form.disabled);
        assert!(config.form.hide_identifiers);
        assert!(config.form.hides(&property("org.example.Foo", "secret")));
        assert!(!config.form.hides(&property("org.example.Foo", "public")));
        assert_eq!(config.form.custom_classes.field, "my-field");
        // untouched classes keep their defaults
        assert_eq!(config.form.custom_classes.button, "ui fluid button basic fullHeight");
    }

    #[test]
    fn test_null_sample_data_disables_synthesis() {
        let options: FormOptions = serde_yaml_ng::from_str("include_sample_data: ~\n").unwrap();
        assert_eq!(options.include_sample_data, None);
    }

    #[test]
    fn test_predicate_hidden_field() {
        let options = FormOptions {
            hidden_fields: vec![HiddenField::predicate(|p| p.name.starts_with('_'))],
            ..FormOptions::default()
        };
        assert!(options.hides(&property("org.example.Foo", "_internal")));
        assert!(!options.hides(&property("org.example.Foo", "visible")));
    }

    #[test]
    fn test_load_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(load_config(&path).unwrap().is_none());

        fs::write(&path, "models: [m.yaml]\nform:\n  disabled: true\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.models, vec!["m.yaml".to_string()]);
        assert!(config.form.disabled);

        fs::write(&path, "models: {").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
