use serde_json::Value;

use crate::config::GenerationMode;
use crate::error::{ModelError, ValidationError};

use super::graph::TypeGraph;
use super::types::ClassDeclaration;

/// Parameters for default-instance synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub include_optional_fields: bool,
    pub mode: GenerationMode,
}

/// The query surface a schema/model library provides to form generation.
pub trait SchemaLibrary {
    fn graph(&self) -> &TypeGraph;

    /// Check that `instance` satisfies the schema.
    fn validate_instance(&self, instance: &Value) -> Result<(), ValidationError>;

    /// True when `instance` is valid and its `$class` is assignable to `fqn`.
    fn is_instance_of(&self, instance: &Value, fqn: &str) -> bool;

    /// A fresh instance of the concrete class `decl`.
    fn synthesize(
        &self,
        decl: &ClassDeclaration,
        options: &SynthesisOptions,
    ) -> Result<Value, ModelError>;
}
