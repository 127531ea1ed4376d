use serde_json::{Value, json};

use crate::config::GenerationMode;
use crate::datetime::now_timestamp;
use crate::error::ModelError;
use crate::model::{ClassDeclaration, PrimitiveKind, SchemaLibrary, SynthesisOptions};

/// Minimal value of a primitive kind.
pub fn empty_primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::DateTime => Value::String(now_timestamp()),
        PrimitiveKind::Integer => json!(0),
        PrimitiveKind::Long | PrimitiveKind::Double => json!(0.0),
        PrimitiveKind::Boolean => Value::Bool(false),
        PrimitiveKind::String => Value::String(String::new()),
    }
}

/// Well-typed placeholder value of a primitive kind.
pub fn sample_primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::DateTime => Value::String(now_timestamp()),
        PrimitiveKind::Integer | PrimitiveKind::Long => json!(1),
        PrimitiveKind::Double => json!(1.0),
        PrimitiveKind::Boolean => Value::Bool(true),
        PrimitiveKind::String => Value::String("sample".to_string()),
    }
}

/// Seed for a new element of a class-typed array: a minimal instance with every field present.
pub fn empty_composite<L: SchemaLibrary + ?Sized>(
    library: &L,
    decl: &ClassDeclaration,
) -> Result<Value, ModelError> {
    library.synthesize(
        decl,
        &SynthesisOptions {
            include_optional_fields: true,
            mode: GenerationMode::Empty,
        },
    )
}
