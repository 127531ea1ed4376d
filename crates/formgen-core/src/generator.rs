use std::fmt::Display;

use log::debug;
use serde_json::Value;

use crate::config::FormOptions;
use crate::error::{FormError, ModelError};
use crate::form::{Cursor, DescriptorRenderer, FormBuilder, FormNode, Node, Renderer};
use crate::model::{ClassDeclaration, Declaration, ModelManager, SchemaLibrary, SynthesisOptions};

/// Entry point for generating default instances and forms from a loaded schema.
#[derive(Debug, Clone)]
pub struct FormGenerator<L = ModelManager> {
    library: Option<L>,
    options: FormOptions,
}

impl<L> Default for FormGenerator<L> {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl<L> FormGenerator<L> {
    /// A generator with no schema loaded.
    pub fn new(options: FormOptions) -> Self {
        Self {
            library: None,
            options,
        }
    }

    pub fn with_library(library: L, options: FormOptions) -> Self {
        Self {
            library: Some(library),
            options,
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: FormOptions) {
        self.options = options;
    }

    pub fn library(&self) -> Option<&L> {
        self.library.as_ref()
    }

    pub fn set_library(&mut self, library: Option<L>) {
        self.library = library;
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl FormGenerator<ModelManager> {
    pub fn load_from_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.load_from_texts(&[text])
    }

    /// Replace the schema. On failure the generator is left unloaded.
    pub fn load_from_texts<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<(), ModelError> {
        match ModelManager::from_texts(texts) {
            Ok(manager) => {
                self.library = Some(manager);
                Ok(())
            }
            Err(e) => {
                self.library = None;
                Err(e)
            }
        }
    }
}

impl<L: SchemaLibrary> FormGenerator<L> {
    /// Types a form can be generated for, in declaration order.
    pub fn types(&self) -> Vec<&ClassDeclaration> {
        let Some(library) = self.library.as_ref() else {
            return Vec::new();
        };
        let graph = library.graph();
        graph
            .classes()
            .filter(|c| !c.is_abstract && !graph.is_system_type(c))
            .collect()
    }

    /// The validation message, or `None` for a valid instance.
    pub fn validate_instance(&self, instance: &Value) -> Option<String> {
        match self.library.as_ref() {
            Some(library) => library.validate_instance(instance).err().map(|e| e.0),
            None => Some(FormError::NotLoaded.to_string()),
        }
    }

    pub fn is_instance_of(&self, instance: &Value, fqn: &str) -> bool {
        self.library
            .as_ref()
            .is_some_and(|library| library.is_instance_of(instance, fqn))
    }

    /// A default instance of `fqn` in the configured generation mode.
    pub fn generate_json(&self, fqn: &str) -> Result<Value, FormError> {
        let (library, decl) = self.root(fqn, "JSON")?;
        let mode = self
            .options
            .include_sample_data
            .ok_or(FormError::SampleDataDisabled)?;
        let value = library.synthesize(
            decl,
            &SynthesisOptions {
                include_optional_fields: self.options.include_optional_fields,
                mode,
            },
        )?;
        debug!("generated {mode:?} instance of {fqn}");
        Ok(value)
    }

    /// Run one traversal of `fqn` over `instance` through `renderer`.
    pub fn generate_form<R>(
        &self,
        fqn: &str,
        instance: &Value,
        renderer: &R,
    ) -> Result<R::Output, FormError>
    where
        R: Renderer,
        R::Error: Display,
    {
        let (library, decl) = self.root(fqn, "forms")?;
        let mut cursor = Cursor::new();
        let built = FormBuilder::new(library, instance, &self.options, renderer)
            .build(Node::Class(decl), &mut cursor)?;
        built.ok_or_else(|| FormError::Unrenderable(fqn.to_string()))
    }

    pub fn generate_tree(&self, fqn: &str, instance: &Value) -> Result<FormNode, FormError> {
        self.generate_form(fqn, instance, &DescriptorRenderer)
    }

    fn root(&self, fqn: &str, target: &'static str) -> Result<(&L, &ClassDeclaration), FormError> {
        let library = self.library.as_ref().ok_or(FormError::NotLoaded)?;
        let decl = match library.graph().get(fqn) {
            Some(Declaration::Class(decl)) => decl,
            Some(Declaration::Enum(_)) => {
                return Err(FormError::EnumerationRoot {
                    target,
                    fqn: fqn.to_string(),
                });
            }
            None => return Err(FormError::TypeNotFound(fqn.to_string())),
        };
        if decl.is_abstract {
            return Err(FormError::AbstractRoot {
                target,
                fqn: fqn.to_string(),
            });
        }
        Ok((library, decl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMode;
    use serde_json::json;

    const MODEL: &str = r#"
namespace: org.example
declarations:
  - { kind: enum, name: Color, values: [RED, GREEN] }
  - { kind: concept, name: Shape, abstract: true }
  - kind: concept
    name: Square
    extends: Shape
    properties:
      - { name: side, type: Double }
      - { name: color, type: Color, optional: true }
"#;

    fn generator(options: FormOptions) -> FormGenerator {
        let mut generator: FormGenerator = FormGenerator::new(options);
        generator.load_from_text(MODEL).unwrap();
        generator
    }

    #[test]
    fn test_types_skip_enums_and_abstract() {
        let g = generator(FormOptions::default());
        let names: Vec<&str> = g.types().iter().map(|c| c.fqn.as_str()).collect();
        assert_eq!(names, vec!["org.example.Square"]);
    }

    #[test]
    fn test_failed_load_unloads() {
        let mut g = generator(FormOptions::default());
        assert!(g.load_from_text("declarations: [").is_err());
        assert!(!g.is_loaded());
        assert!(g.types().is_empty());
        assert!(matches!(g.generate_json("org.example.Square"), Err(FormError::NotLoaded)));
    }

    #[test]
    fn test_generate_json_modes() {
        let sample = generator(FormOptions::default());
        assert_eq!(
            sample.generate_json("org.example.Square").unwrap(),
            json!({"$class": "org.example.Square", "side": 1.0, "color": "RED"})
        );

        let empty = generator(FormOptions {
            include_optional_fields: false,
            include_sample_data: Some(GenerationMode::Empty),
            ..FormOptions::default()
        });
        assert_eq!(
            empty.generate_json("org.example.Square").unwrap(),
            json!({"$class": "org.example.Square", "side": 0.0})
        );
    }

    #[test]
    fn test_generate_json_errors() {
        let g = generator(FormOptions::default());
        assert_eq!(
            g.generate_json("org.example.Nope").unwrap_err().to_string(),
            "org.example.Nope not found"
        );
        assert!(g
            .generate_json("org.example.Color")
            .unwrap_err()
            .to_string()
            .starts_with("Cannot generate JSON for an enumerated type directly"));
        assert!(matches!(
            g.generate_json("org.example.Shape"),
            Err(FormError::AbstractRoot { target: "JSON", .. })
        ));

        let disabled = generator(FormOptions {
            include_sample_data: None,
            ..FormOptions::default()
        });
        assert_eq!(
            disabled.generate_json("org.example.Square").unwrap_err().to_string(),
            "Cannot generate form values when the component is configured not to generate sample data."
        );
    }

    #[test]
    fn test_generate_tree_root_checks() {
        let g = generator(FormOptions::default());
        let json = json!({"$class": "org.example.Square", "side": 2.0});
        assert!(g.generate_tree("org.example.Square", &json).is_ok());
        assert!(matches!(
            g.generate_tree("org.example.Color", &json),
            Err(FormError::EnumerationRoot { target: "forms", .. })
        ));
        assert!(matches!(
            g.generate_tree("org.example.Shape", &json),
            Err(FormError::AbstractRoot { target: "forms", .. })
        ));
    }

    #[test]
    fn test_validate_instance() {
        let g = generator(FormOptions::default());
        assert_eq!(
            g.validate_instance(&json!({"$class": "org.example.Square", "side": 2.0})),
            None
        );
        assert!(g.validate_instance(&json!({"$class": "org.example.Square"})).is_some());
        assert!(g.is_instance_of(&json!({"$class": "org.example.Square", "side": 2}), "org.example.Shape"));
        assert!(FormGenerator::<ModelManager>::default().validate_instance(&json!({})).is_some());
    }
}
