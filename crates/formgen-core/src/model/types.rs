use std::fmt;

/// The fixed set of scalar kinds a property can hold directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Boolean,
    DateTime,
    Integer,
    Long,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::String,
        PrimitiveKind::Boolean,
        PrimitiveKind::DateTime,
        PrimitiveKind::Integer,
        PrimitiveKind::Long,
        PrimitiveKind::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::String => "String",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Double => "Double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property's declared type after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    /// Fully-qualified name of a class or enum declaration.
    Declared(String),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Primitive(kind) => kind.name(),
            TypeRef::Declared(fqn) => fqn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Field,
    /// A reference to an entity stored elsewhere, held as a string identifier.
    Relationship,
}

/// A field or relationship owned by a class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_ref: TypeRef,
    pub array: bool,
    pub optional: bool,
    pub kind: PropertyKind,
    /// FQN of the class that declares this property.
    pub declaring_type: String,
}

impl Property {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.type_ref, TypeRef::Primitive(_))
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == PropertyKind::Relationship
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concept,
    Asset,
    Participant,
    Transaction,
    Event,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub fqn: String,
    pub namespace: String,
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub super_type: Option<String>,
    pub identified_by: Option<String>,
    /// Own properties only, in declaration order.
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub fqn: String,
    pub namespace: String,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Class(ClassDeclaration),
    Enum(EnumDeclaration),
}

impl Declaration {
    pub fn fqn(&self) -> &str {
        match self {
            Declaration::Class(c) => &c.fqn,
            Declaration::Enum(e) => &e.fqn,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Class(c) => &c.name,
            Declaration::Enum(e) => &e.name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Declaration::Class(c) => &c.namespace,
            Declaration::Enum(e) => &e.namespace,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match self {
            Declaration::Class(c) => Some(c),
            Declaration::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDeclaration> {
        match self {
            Declaration::Enum(e) => Some(e),
            Declaration::Class(_) => None,
        }
    }
}
