use serde::{Deserialize, Serialize};

/// A declarative model document: one namespace and its declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclarationDef>,
}

/// A declaration as written in a model document, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationDef {
    Concept(ClassDef),
    Asset(ClassDef),
    Participant(ClassDef),
    Transaction(ClassDef),
    Event(ClassDef),
    Enum(EnumDef),
}

impl DeclarationDef {
    pub fn name(&self) -> &str {
        match self {
            DeclarationDef::Concept(c)
            | DeclarationDef::Asset(c)
            | DeclarationDef::Participant(c)
            | DeclarationDef::Transaction(c)
            | DeclarationDef::Event(c) => &c.name,
            DeclarationDef::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,

    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,

    /// Short name within the same namespace, or a fully-qualified name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub array: bool,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub relationship: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}
