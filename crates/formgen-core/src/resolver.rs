use log::debug;
use serde_json::Value;

use crate::error::ResolveError;
use crate::form::InputType;
use crate::model::{
    CLASS_KEY, ClassDeclaration, Declaration, EnumDeclaration, PrimitiveKind, Property, TypeGraph,
    TypeRef,
};

/// What a property's declared type resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType<'g> {
    Primitive(PrimitiveKind),
    Enumeration(&'g EnumDeclaration),
    Class(&'g ClassDeclaration),
}

pub fn is_abstract(decl: &ClassDeclaration) -> bool {
    decl.is_abstract
}

/// Framework base types are never rendered.
pub fn is_system_type(graph: &TypeGraph, decl: &ClassDeclaration) -> bool {
    graph.is_system_type(decl)
}

/// `decl` and everything that transitively extends it, in declaration order.
pub fn assignable_declarations<'g>(
    graph: &'g TypeGraph,
    decl: &'g ClassDeclaration,
) -> impl Iterator<Item = &'g ClassDeclaration> {
    graph
        .classes()
        .filter(move |candidate| graph.is_assignable_to(candidate, decl))
}

/// Substitute an abstract declaration with its first concrete, non-system subclass.
pub fn resolve_concrete<'g>(
    graph: &'g TypeGraph,
    decl: &'g ClassDeclaration,
) -> Result<&'g ClassDeclaration, ResolveError> {
    if !is_abstract(decl) {
        return Ok(decl);
    }
    let concrete = assignable_declarations(graph, decl)
        .find(|c| !is_abstract(c) && !is_system_type(graph, c))
        .ok_or_else(|| ResolveError::NoConcreteSubclass(decl.fqn.clone()))?;
    debug!("resolved abstract {} to {}", decl.fqn, concrete.fqn);
    Ok(concrete)
}

/// Concrete class for a value of declared type `declared`.
///
/// An object whose `$class` names a concrete class assignable to `declared` keeps
/// that class; anything else falls back to [`resolve_concrete`].
pub fn concrete_for_value<'g>(
    graph: &'g TypeGraph,
    declared: &'g ClassDeclaration,
    value: Option<&Value>,
) -> Result<&'g ClassDeclaration, ResolveError> {
    let tagged = value
        .and_then(|v| v.get(CLASS_KEY))
        .and_then(Value::as_str)
        .and_then(|fqn| graph.class(fqn))
        .filter(|c| !is_abstract(c) && graph.is_assignable_to(c, declared));
    match tagged {
        Some(class) => Ok(class),
        None => resolve_concrete(graph, declared),
    }
}

pub fn field_type<'g>(
    graph: &'g TypeGraph,
    property: &Property,
) -> Result<FieldType<'g>, ResolveError> {
    match &property.type_ref {
        TypeRef::Primitive(kind) => Ok(FieldType::Primitive(*kind)),
        TypeRef::Declared(fqn) => match graph.get(fqn) {
            Some(Declaration::Class(c)) => Ok(FieldType::Class(c)),
            Some(Declaration::Enum(e)) => Ok(FieldType::Enumeration(e)),
            None => Err(ResolveError::TypeNotFound(fqn.clone())),
        },
    }
}

/// Map a type name to the input widget that edits it. Unknown names pass through.
pub fn to_field_type(type_name: &str) -> InputType {
    match type_name {
        "DateTime" => InputType::DateTimeLocal,
        "Boolean" => InputType::Checkbox,
        "String" => InputType::Text,
        "Double" | "Long" | "Integer" => InputType::Number,
        other => InputType::Other(other.to_string()),
    }
}
