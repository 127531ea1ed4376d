use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::error::ModelError;

use super::file::{ClassDef, DeclarationDef, EnumDef, ModelFile, PropertyDef};
use super::types::{
    ClassDeclaration, ClassKind, Declaration, EnumDeclaration, PrimitiveKind, Property,
    PropertyKind, TypeRef,
};

/// Namespace of the framework base types every model implicitly imports.
pub const SYSTEM_NAMESPACE: &str = "org.accordproject.base";

/// The resolved schema: every declaration keyed by fully-qualified name, in load order.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    declarations: IndexMap<String, Declaration>,
}

impl TypeGraph {
    /// Build a graph from model documents. The system model is loaded first.
    pub fn from_files(files: &[ModelFile]) -> Result<Self, ModelError> {
        let system = system_model_file();
        let all: Vec<&ModelFile> = std::iter::once(&system).chain(files.iter()).collect();

        // Pass 1: collect names so references can point forward
        let mut known = HashSet::new();
        for file in &all {
            for decl in &file.declarations {
                let fqn = qualify(&file.namespace, decl.name());
                if !known.insert(fqn.clone()) {
                    return Err(ModelError::DuplicateDeclaration(fqn));
                }
            }
        }

        // Pass 2: resolve type names
        let mut declarations = IndexMap::new();
        for file in &all {
            for def in &file.declarations {
                let decl = build_declaration(&file.namespace, def, &known)?;
                declarations.insert(decl.fqn().to_string(), decl);
            }
        }

        let graph = Self { declarations };
        graph.check_inheritance()?;
        debug!(
            "built type graph with {} declarations",
            graph.declarations.len()
        );
        Ok(graph)
    }

    fn check_inheritance(&self) -> Result<(), ModelError> {
        for decl in self.classes() {
            let mut seen = HashSet::new();
            let mut current = decl;
            while let Some(ref super_name) = current.super_type {
                if !seen.insert(current.fqn.as_str()) {
                    return Err(ModelError::CyclicInheritance(decl.fqn.clone()));
                }
                current = match self.declarations.get(super_name) {
                    Some(Declaration::Class(parent)) => parent,
                    Some(Declaration::Enum(_)) => {
                        return Err(ModelError::InvalidSuperType {
                            declaration: current.fqn.clone(),
                            super_type: super_name.clone(),
                        });
                    }
                    None => {
                        return Err(ModelError::UnknownSuperType {
                            declaration: current.fqn.clone(),
                            super_type: super_name.clone(),
                        });
                    }
                };
            }
        }
        Ok(())
    }

    pub fn get(&self, fqn: &str) -> Option<&Declaration> {
        self.declarations.get(fqn)
    }

    pub fn class(&self, fqn: &str) -> Option<&ClassDeclaration> {
        self.get(fqn).and_then(Declaration::as_class)
    }

    pub fn enumeration(&self, fqn: &str) -> Option<&EnumDeclaration> {
        self.get(fqn).and_then(Declaration::as_enum)
    }

    /// All declarations in declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.declarations().filter_map(Declaration::as_class)
    }

    pub fn super_type(&self, decl: &ClassDeclaration) -> Option<&ClassDeclaration> {
        decl.super_type.as_deref().and_then(|name| self.class(name))
    }

    /// Own properties first, then each super type's, nearest first.
    pub fn properties<'g>(&'g self, decl: &'g ClassDeclaration) -> Vec<&'g Property> {
        let mut result: Vec<&Property> = decl.properties.iter().collect();
        let mut current = self.super_type(decl);
        while let Some(parent) = current {
            result.extend(parent.properties.iter());
            current = self.super_type(parent);
        }
        result
    }

    pub fn property<'g>(&'g self, decl: &'g ClassDeclaration, name: &str) -> Option<&'g Property> {
        self.properties(decl).into_iter().find(|p| p.name == name)
    }

    /// Name of the identifying field, declared here or inherited.
    pub fn identifier_field_name<'g>(&'g self, decl: &'g ClassDeclaration) -> Option<&'g str> {
        let mut current = Some(decl);
        while let Some(class) = current {
            if let Some(ref id) = class.identified_by {
                return Some(id.as_str());
            }
            current = self.super_type(class);
        }
        None
    }

    pub fn identifier_property<'g>(
        &'g self,
        decl: &'g ClassDeclaration,
    ) -> Option<&'g Property> {
        let name = self.identifier_field_name(decl)?;
        self.property(decl, name)
    }

    /// True when `decl` is `target` or transitively extends it.
    pub fn is_assignable_to(&self, decl: &ClassDeclaration, target: &ClassDeclaration) -> bool {
        let mut current = Some(decl);
        while let Some(class) = current {
            if class.fqn == target.fqn {
                return true;
            }
            current = self.super_type(class);
        }
        false
    }

    pub fn is_system_type(&self, decl: &ClassDeclaration) -> bool {
        decl.namespace == SYSTEM_NAMESPACE
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

fn resolve_type_name(
    namespace: &str,
    raw: &str,
    known: &HashSet<String>,
    property: &str,
) -> Result<TypeRef, ModelError> {
    if let Some(kind) = PrimitiveKind::from_name(raw) {
        return Ok(TypeRef::Primitive(kind));
    }
    let fqn = if raw.contains('.') {
        raw.to_string()
    } else {
        qualify(namespace, raw)
    };
    if known.contains(&fqn) {
        Ok(TypeRef::Declared(fqn))
    } else {
        Err(ModelError::UnknownType {
            type_name: raw.to_string(),
            property: property.to_string(),
        })
    }
}

fn build_declaration(
    namespace: &str,
    def: &DeclarationDef,
    known: &HashSet<String>,
) -> Result<Declaration, ModelError> {
    let (kind, class) = match def {
        DeclarationDef::Enum(e) => return Ok(Declaration::Enum(build_enum(namespace, e))),
        DeclarationDef::Concept(c) => (ClassKind::Concept, c),
        DeclarationDef::Asset(c) => (ClassKind::Asset, c),
        DeclarationDef::Participant(c) => (ClassKind::Participant, c),
        DeclarationDef::Transaction(c) => (ClassKind::Transaction, c),
        DeclarationDef::Event(c) => (ClassKind::Event, c),
    };
    build_class(namespace, kind, class, known).map(Declaration::Class)
}

fn build_enum(namespace: &str, def: &EnumDef) -> EnumDeclaration {
    EnumDeclaration {
        fqn: qualify(namespace, &def.name),
        namespace: namespace.to_string(),
        name: def.name.clone(),
        values: def.values.clone(),
    }
}

fn build_class(
    namespace: &str,
    kind: ClassKind,
    def: &ClassDef,
    known: &HashSet<String>,
) -> Result<ClassDeclaration, ModelError> {
    let fqn = qualify(namespace, &def.name);

    let super_type = match def.extends {
        Some(ref raw) if raw.contains('.') => Some(raw.clone()),
        Some(ref raw) => Some(qualify(namespace, raw)),
        None if namespace != SYSTEM_NAMESPACE => implicit_super_type(kind),
        None => None,
    };

    let properties = def
        .properties
        .iter()
        .map(|p| build_property(namespace, &fqn, p, known))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassDeclaration {
        fqn,
        namespace: namespace.to_string(),
        name: def.name.clone(),
        kind,
        is_abstract: def.is_abstract,
        super_type,
        identified_by: def.identified_by.clone(),
        properties,
    })
}

fn implicit_super_type(kind: ClassKind) -> Option<String> {
    let base = match kind {
        ClassKind::Concept => return None,
        ClassKind::Asset => "Asset",
        ClassKind::Participant => "Participant",
        ClassKind::Transaction => "Transaction",
        ClassKind::Event => "Event",
    };
    Some(qualify(SYSTEM_NAMESPACE, base))
}

fn build_property(
    namespace: &str,
    declaring_type: &str,
    def: &PropertyDef,
    known: &HashSet<String>,
) -> Result<Property, ModelError> {
    let property_fqn = qualify(declaring_type, &def.name);
    Ok(Property {
        name: def.name.clone(),
        type_ref: resolve_type_name(namespace, &def.type_name, known, &property_fqn)?,
        array: def.array,
        optional: def.optional,
        kind: if def.relationship {
            PropertyKind::Relationship
        } else {
            PropertyKind::Field
        },
        declaring_type: declaring_type.to_string(),
    })
}

/// The framework base types: abstract asset, participant, transaction and event.
pub fn system_model_file() -> ModelFile {
    let base = |name: &str, identified_by: Option<&str>| ClassDef {
        name: name.to_string(),
        is_abstract: true,
        extends: None,
        identified_by: identified_by.map(String::from),
        properties: identified_by
            .map(|id| PropertyDef {
                name: id.to_string(),
                type_name: "String".to_string(),
                ..PropertyDef::default()
            })
            .into_iter()
            .collect(),
    };
    ModelFile {
        namespace: SYSTEM_NAMESPACE.to_string(),
        declarations: vec![
            DeclarationDef::Asset(base("Asset", None)),
            DeclarationDef::Participant(base("Participant", None)),
            DeclarationDef::Transaction(base("Transaction", Some("transactionId"))),
            DeclarationDef::Event(base("Event", Some("eventId"))),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::from_yaml;

    const SHAPES: &str = r#"
namespace: org.example.shapes
declarations:
  - kind: concept
    name: Shape
    abstract: true
    properties:
      - { name: label, type: String }
  - kind: concept
    name: Circle
    extends: Shape
    properties:
      - { name: radius, type: Double }
  - kind: asset
    name: Canvas
    identified_by: canvasId
    properties:
      - { name: canvasId, type: String }
      - { name: shapes, type: Shape, array: true }
"#;

    fn graph(yaml: &str) -> Result<TypeGraph, ModelError> {
        TypeGraph::from_files(&[from_yaml(yaml)?])
    }

    #[test]
    fn test_system_types_come_first() {
        let g = graph(SHAPES).unwrap();
        let names: Vec<&str> = g.declarations().map(Declaration::name).collect();
        assert_eq!(
            names,
            vec!["Asset", "Participant", "Transaction", "Event", "Shape", "Circle", "Canvas"]
        );
        let asset = g.class("org.accordproject.base.Asset").unwrap();
        assert!(g.is_system_type(asset));
        assert!(asset.is_abstract);
    }

    #[test]
    fn test_inherited_properties_follow_own() {
        let g = graph(SHAPES).unwrap();
        let circle = g.class("org.example.shapes.Circle").unwrap();
        let names: Vec<&str> = g.properties(circle).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["radius", "label"]);
        assert_eq!(
            g.property(circle, "label").unwrap().fully_qualified_name(),
            "org.example.shapes.Shape.label"
        );
    }

    #[test]
    fn test_implicit_system_super_type() {
        let g = graph(SHAPES).unwrap();
        let canvas = g.class("org.example.shapes.Canvas").unwrap();
        assert_eq!(
            canvas.super_type.as_deref(),
            Some("org.accordproject.base.Asset")
        );
        assert_eq!(g.identifier_field_name(canvas), Some("canvasId"));
        let asset = g.class("org.accordproject.base.Asset").unwrap();
        assert!(g.is_assignable_to(canvas, asset));
    }

    #[test]
    fn test_transaction_inherits_identifier() {
        let g = graph(
            r#"
namespace: org.example
declarations:
  - kind: transaction
    name: Pay
    properties:
      - { name: amount, type: Double }
"#,
        )
        .unwrap();
        let pay = g.class("org.example.Pay").unwrap();
        let id = g.identifier_property(pay).unwrap();
        assert_eq!(
            id.fully_qualified_name(),
            "org.accordproject.base.Transaction.transactionId"
        );
    }

    #[test]
    fn test_unknown_property_type() {
        let err = graph(
            r#"
namespace: org.example
declarations:
  - kind: concept
    name: Foo
    properties:
      - { name: bar, type: Bar }
"#,
        )
        .unwrap_err();
        match err {
            ModelError::UnknownType {
                type_name,
                property,
            } => {
                assert_eq!(type_name, "Bar");
                assert_eq!(property, "org.example.Foo.bar");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_and_cyclic_declarations() {
        let dup = graph(
            r#"
namespace: org.example
declarations:
  - { kind: concept, name: Foo }
  - { kind: enum, name: Foo, values: [A] }
"#,
        );
        assert!(matches!(dup, Err(ModelError::DuplicateDeclaration(ref n)) if n == "org.example.Foo"));

        let cyclic = graph(
            r#"
namespace: org.example
declarations:
  - { kind: concept, name: A, extends: B }
  - { kind: concept, name: B, extends: A }
"#,
        );
        assert!(matches!(cyclic, Err(ModelError::CyclicInheritance(_))));

        let missing = graph(
            r#"
namespace: org.example
declarations:
  - { kind: concept, name: A, extends: Nope }
"#,
        );
        assert!(matches!(missing, Err(ModelError::UnknownSuperType { .. })));
    }
}
