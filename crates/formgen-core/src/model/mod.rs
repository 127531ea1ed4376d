pub mod file;
pub mod graph;
pub mod instance;
pub mod library;
pub mod manager;
pub mod types;

pub use file::ModelFile;
pub use graph::{SYSTEM_NAMESPACE, TypeGraph};
pub use library::{SchemaLibrary, SynthesisOptions};
pub use manager::ModelManager;
pub use types::{
    ClassDeclaration, ClassKind, Declaration, EnumDeclaration, PrimitiveKind, Property,
    PropertyKind, TypeRef,
};

use crate::error::ModelError;

/// Discriminator key naming an instance's concrete type.
pub const CLASS_KEY: &str = "$class";

/// Parse a model document from YAML.
pub fn from_yaml(input: &str) -> Result<ModelFile, ModelError> {
    Ok(serde_yaml_ng::from_str(input)?)
}

/// Parse a model document from JSON.
pub fn from_json(input: &str) -> Result<ModelFile, ModelError> {
    Ok(serde_json::from_str(input)?)
}

/// Parse a model document, choosing JSON when the text is a JSON object.
pub fn from_text(input: &str) -> Result<ModelFile, ModelError> {
    if input.trim_start().starts_with('{') {
        from_json(input)
    } else {
        from_yaml(input)
    }
}
