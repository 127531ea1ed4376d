use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    #[error("undeclared type {type_name} used by {property}")]
    UnknownType { type_name: String, property: String },

    #[error("could not find super type {super_type} of {declaration}")]
    UnknownSuperType {
        declaration: String,
        super_type: String,
    },

    #[error("{declaration} cannot extend {super_type}: not a class declaration")]
    InvalidSuperType {
        declaration: String,
        super_type: String,
    },

    #[error("cyclic inheritance detected at {0}")]
    CyclicInheritance(String),

    #[error("cannot synthesize an instance of recursive type {0}")]
    RecursiveType(String),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No concrete subclasses found for {0}")]
    NoConcreteSubclass(String),

    #[error("{0} not found")]
    TypeNotFound(String),

    #[error("{0} is not a class declaration")]
    NotAClass(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path {path}: {reason}")]
    Syntax { path: String, reason: String },

    #[error("parent of {0} does not exist")]
    MissingParent(String),

    #[error("value at {0} cannot hold children")]
    NotAContainer(String),

    #[error("value at {0} is not an array")]
    NotAnArray(String),

    #[error("index {index} out of bounds for array of length {len} at {path}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

/// An instance that no longer satisfies its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0} not found")]
    TypeNotFound(String),

    #[error(
        "Cannot generate {target} for an enumerated type directly, the type should be contained in Concept, Asset, Transaction or Event declaration: {fqn}"
    )]
    EnumerationRoot { target: &'static str, fqn: String },

    #[error("Cannot generate {target} for abstract types: {fqn}")]
    AbstractRoot { target: &'static str, fqn: String },

    #[error(
        "Cannot generate form values when the component is configured not to generate sample data."
    )]
    SampleDataDisabled,

    #[error("no schema is loaded")]
    NotLoaded,

    #[error("embedded value at {0} has no $class discriminator")]
    MissingDiscriminator(String),

    #[error("{0} produced no form")]
    Unrenderable(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no type selected")]
    NoTypeSelected,

    #[error("no instance to edit")]
    NoInstance,

    #[error("a change action needs an edit value")]
    MissingEditValue,

    #[error("path error: {0}")]
    Path(#[from] PathError),

    #[error("form error: {0}")]
    Form(#[from] FormError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml_ng::Error,
    },
}
