use serde_json::{Map, Value};

use crate::config::GenerationMode;
use crate::datetime;
use crate::defaults::{empty_primitive, sample_primitive};
use crate::error::{ModelError, ValidationError};
use crate::path::JsonPath;
use crate::resolver::{FieldType, field_type, resolve_concrete};

use super::CLASS_KEY;
use super::graph::TypeGraph;
use super::library::SynthesisOptions;
use super::types::{ClassDeclaration, Declaration, PrimitiveKind, Property, TypeRef};

/// Identifier given to synthesized resources.
pub const DEFAULT_IDENTIFIER: &str = "resource1";

/// `resource:<fqn>#<id>`, the textual form of a relationship.
pub fn relationship_uri(decl: &ClassDeclaration, id: &str) -> String {
    format!("resource:{}#{}", decl.fqn, id)
}

/// Builds default instances of concrete classes.
pub struct InstanceGenerator<'g> {
    graph: &'g TypeGraph,
    options: SynthesisOptions,
    visiting: Vec<String>,
}

impl<'g> InstanceGenerator<'g> {
    pub fn new(graph: &'g TypeGraph, options: SynthesisOptions) -> Self {
        Self {
            graph,
            options,
            visiting: Vec::new(),
        }
    }

    pub fn generate(&mut self, decl: &'g ClassDeclaration) -> Result<Value, ModelError> {
        if self.visiting.contains(&decl.fqn) {
            return Err(ModelError::RecursiveType(decl.fqn.clone()));
        }
        self.visiting.push(decl.fqn.clone());
        let result = self.class_body(decl);
        self.visiting.pop();
        result
    }

    fn class_body(&mut self, decl: &'g ClassDeclaration) -> Result<Value, ModelError> {
        let mut body = Map::new();
        body.insert(CLASS_KEY.to_string(), Value::String(decl.fqn.clone()));
        let identifier = self.graph.identifier_field_name(decl);

        for property in self.graph.properties(decl) {
            if property.optional && !self.options.include_optional_fields {
                continue;
            }
            if identifier == Some(property.name.as_str()) {
                body.insert(
                    property.name.clone(),
                    Value::String(DEFAULT_IDENTIFIER.to_string()),
                );
                continue;
            }
            match self.property_value(property) {
                Ok(value) => {
                    body.insert(property.name.clone(), value);
                }
                Err(ModelError::RecursiveType(_)) if property.optional => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Object(body))
    }

    fn property_value(&mut self, property: &'g Property) -> Result<Value, ModelError> {
        if !property.array {
            return self.single_value(property);
        }
        match self.options.mode {
            GenerationMode::Empty => Ok(Value::Array(Vec::new())),
            GenerationMode::Sample => Ok(Value::Array(vec![self.single_value(property)?])),
        }
    }

    fn single_value(&mut self, property: &'g Property) -> Result<Value, ModelError> {
        match field_type(self.graph, property)? {
            FieldType::Primitive(kind) => Ok(match self.options.mode {
                GenerationMode::Empty => empty_primitive(kind),
                GenerationMode::Sample => sample_primitive(kind),
            }),
            FieldType::Enumeration(e) => Ok(e
                .values
                .first()
                .map_or(Value::Null, |v| Value::String(v.clone()))),
            FieldType::Class(declared) => {
                let concrete = resolve_concrete(self.graph, declared)?;
                if property.is_relationship() {
                    Ok(Value::String(relationship_uri(concrete, DEFAULT_IDENTIFIER)))
                } else {
                    self.generate(concrete)
                }
            }
        }
    }
}

/// Checks instances against the graph; the first violation is reported.
pub struct InstanceValidator<'g> {
    graph: &'g TypeGraph,
}

impl<'g> InstanceValidator<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self { graph }
    }

    /// Validate a root instance, returning its concrete class.
    pub fn validate(&self, instance: &Value) -> Result<&'g ClassDeclaration, ValidationError> {
        let root = JsonPath::root();
        let class = self.discriminated_class(instance, &root, None)?;
        self.validate_class(class, instance, &root)?;
        Ok(class)
    }

    fn discriminated_class(
        &self,
        value: &Value,
        path: &JsonPath,
        declared: Option<&'g ClassDeclaration>,
    ) -> Result<&'g ClassDeclaration, ValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError(format!(
                "Instance {path} is not an object"
            )));
        };
        let class = match object.get(CLASS_KEY) {
            Some(Value::String(fqn)) => self
                .graph
                .class(fqn)
                .ok_or_else(|| ValidationError(format!("Type {fqn} is not defined")))?,
            Some(other) => {
                return Err(ValidationError(format!(
                    "Instance {path} has an invalid $class {other}"
                )));
            }
            None => match declared {
                Some(d) if !d.is_abstract => d,
                _ => {
                    return Err(ValidationError(format!(
                        "Instance {path} does not contain a $class property"
                    )));
                }
            },
        };
        if class.is_abstract {
            return Err(ValidationError(format!(
                "Cannot instantiate abstract type {}",
                class.fqn
            )));
        }
        if let Some(d) = declared
            && !self.graph.is_assignable_to(class, d)
        {
            return Err(ValidationError(format!(
                "Instance {path} has type {} which is not assignable to {}",
                class.fqn, d.fqn
            )));
        }
        Ok(class)
    }

    fn validate_class(
        &self,
        decl: &'g ClassDeclaration,
        value: &Value,
        path: &JsonPath,
    ) -> Result<(), ValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError(format!(
                "Instance {path} is not an object"
            )));
        };
        let properties = self.graph.properties(decl);

        if let Some(key) = object
            .keys()
            .filter(|k| !k.starts_with('$'))
            .find(|k| !properties.iter().any(|p| p.name == **k))
        {
            return Err(ValidationError(format!(
                "Instance {path} has a property named {key}, which is not declared in {}",
                decl.fqn
            )));
        }

        for property in properties {
            match object.get(&property.name) {
                None | Some(Value::Null) if !property.optional => {
                    return Err(ValidationError(format!(
                        "The instance {path} is missing the required field {}",
                        property.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(v) => self.validate_property(property, v, &path.key(&property.name))?,
            }
        }
        Ok(())
    }

    fn validate_property(
        &self,
        property: &Property,
        value: &Value,
        path: &JsonPath,
    ) -> Result<(), ValidationError> {
        if !property.array {
            return self.validate_value(property, value, path);
        }
        let Some(items) = value.as_array() else {
            return Err(ValidationError(format!(
                "Model violation in instance {path}: expected an array of {}",
                property.type_ref.name()
            )));
        };
        items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| self.validate_value(property, item, &path.index(i)))
    }

    fn validate_value(
        &self,
        property: &Property,
        value: &Value,
        path: &JsonPath,
    ) -> Result<(), ValidationError> {
        if property.is_relationship() {
            return match value {
                Value::String(_) => Ok(()),
                Value::Object(_) => {
                    let declared = self.graph.class(property.type_ref.name());
                    let class = self.discriminated_class(value, path, declared)?;
                    self.validate_class(class, value, path)
                }
                _ => Err(type_mismatch(property, value, path)),
            };
        }

        match &property.type_ref {
            TypeRef::Primitive(kind) if primitive_matches(*kind, value) => Ok(()),
            TypeRef::Primitive(_) => Err(type_mismatch(property, value, path)),
            TypeRef::Declared(fqn) => match self.graph.get(fqn) {
                Some(Declaration::Enum(e)) => match value.as_str() {
                    Some(s) if e.values.iter().any(|v| v == s) => Ok(()),
                    _ => Err(ValidationError(format!(
                        "Value {value} at {path} is not a member of enumeration {fqn}"
                    ))),
                },
                Some(Declaration::Class(declared)) => {
                    let class = self.discriminated_class(value, path, Some(declared))?;
                    self.validate_class(class, value, path)
                }
                None => Err(ValidationError(format!("Type {fqn} is not defined"))),
            },
        }
    }
}

fn primitive_matches(kind: PrimitiveKind, value: &Value) -> bool {
    match kind {
        PrimitiveKind::String => value.is_string(),
        PrimitiveKind::Boolean => value.is_boolean(),
        PrimitiveKind::Integer | PrimitiveKind::Long => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        PrimitiveKind::Double => value.is_number(),
        PrimitiveKind::DateTime => value.as_str().is_some_and(datetime::is_timestamp),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(property: &Property, value: &Value, path: &JsonPath) -> ValidationError {
    ValidationError(format!(
        "Model violation in instance {path}: {} has value {value} (type of value: \"{}\") expected type {}",
        property.name,
        json_type(value),
        property.type_ref.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelManager, SchemaLibrary};
    use serde_json::json;

    const ORDERS: &str = r#"
namespace: org.example
declarations:
  - kind: participant
    name: Customer
    identified_by: email
    properties:
      - { name: email, type: String }
      - { name: name, type: String }
  - kind: enum
    name: Status
    values: [OPEN, CLOSED]
  - kind: concept
    name: Line
    properties:
      - { name: sku, type: String }
      - { name: quantity, type: Integer }
      - { name: price, type: Double, optional: true }
  - kind: asset
    name: Order
    identified_by: orderId
    properties:
      - { name: orderId, type: String }
      - { name: status, type: Status }
      - { name: placed, type: DateTime }
      - { name: rush, type: Boolean, optional: true }
      - { name: lines, type: Line, array: true }
      - { name: customer, type: Customer, relationship: true }
  - kind: concept
    name: Node
    properties:
      - { name: value, type: Long }
      - { name: next, type: Node, optional: true }
"#;

    fn manager() -> ModelManager {
        ModelManager::from_text(ORDERS).unwrap()
    }

    fn options(include_optional_fields: bool, mode: GenerationMode) -> SynthesisOptions {
        SynthesisOptions {
            include_optional_fields,
            mode,
        }
    }

    #[test]
    fn test_empty_instance_shape() {
        let m = manager();
        let order = m.graph().class("org.example.Order").unwrap();
        let value = InstanceGenerator::new(m.graph(), options(false, GenerationMode::Empty))
            .generate(order)
            .unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["$class", "orderId", "status", "placed", "lines", "customer"]
        );
        assert_eq!(value["orderId"], json!("resource1"));
        assert_eq!(value["status"], json!("OPEN"));
        assert_eq!(value["lines"], json!([]));
        assert_eq!(
            value["customer"],
            json!("resource:org.example.Customer#resource1")
        );
        assert!(m.validate_instance(&value).is_ok());
    }

    #[test]
    fn test_sample_instance_fills_arrays_and_optionals() {
        let m = manager();
        let order = m.graph().class("org.example.Order").unwrap();
        let value = InstanceGenerator::new(m.graph(), options(true, GenerationMode::Sample))
            .generate(order)
            .unwrap();
        assert_eq!(value["rush"], json!(true));
        let lines = value["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["$class"], json!("org.example.Line"));
        assert_eq!(lines[0]["quantity"], json!(1));
        assert!(m.validate_instance(&value).is_ok());
    }

    #[test]
    fn test_optional_recursion_is_skipped() {
        let m = manager();
        let node = m.graph().class("org.example.Node").unwrap();
        let value = InstanceGenerator::new(m.graph(), options(true, GenerationMode::Empty))
            .generate(node)
            .unwrap();
        assert_eq!(value, json!({"$class": "org.example.Node", "value": 0.0}));
    }

    #[test]
    fn test_validation_messages() {
        let m = manager();
        let line = |extra: Value| {
            let mut v = json!({"$class": "org.example.Line", "sku": "a", "quantity": 2});
            v.as_object_mut()
                .unwrap()
                .extend(extra.as_object().unwrap().clone());
            m.validate_instance(&v)
        };

        assert!(line(json!({})).is_ok());
        assert!(line(json!({"price": 2.5})).is_ok());
        assert_eq!(
            line(json!({"quantity": "2"})).unwrap_err().0,
            "Model violation in instance $.quantity: quantity has value \"2\" (type of value: \"string\") expected type Integer"
        );
        assert_eq!(
            line(json!({"colour": "red"})).unwrap_err().0,
            "Instance $ has a property named colour, which is not declared in org.example.Line"
        );
        assert_eq!(
            m.validate_instance(&json!({"$class": "org.example.Line", "sku": "a"}))
                .unwrap_err()
                .0,
            "The instance $ is missing the required field quantity"
        );
        assert!(m.validate_instance(&json!({"sku": "a"})).is_err());
        assert!(m.validate_instance(&json!({"$class": "org.example.Nope"})).is_err());
    }

    #[test]
    fn test_enum_and_datetime_checks() {
        let m = manager();
        let mut order = json!({
            "$class": "org.example.Order",
            "orderId": "o1",
            "status": "OPEN",
            "placed": "2024-03-01T12:30:45.000Z",
            "lines": [{"$class": "org.example.Line", "sku": "a", "quantity": 1}],
            "customer": "resource:org.example.Customer#bob@example.com"
        });
        assert!(m.validate_instance(&order).is_ok());

        order["status"] = json!("PENDING");
        assert!(m.validate_instance(&order).unwrap_err().0.contains("enumeration org.example.Status"));

        order["status"] = json!("CLOSED");
        order["placed"] = json!("yesterday");
        assert!(m.validate_instance(&order).is_err());

        order["placed"] = json!("2024-03-01T12:30:45Z");
        order["lines"][0]["quantity"] = json!(1.5);
        assert!(m.validate_instance(&order).unwrap_err().0.starts_with("Model violation in instance $.lines[0].quantity"));
    }

    #[test]
    fn test_is_instance_of_respects_assignability() {
        let m = manager();
        let mut customer = json!({
            "$class": "org.example.Customer",
            "email": "a@b.c",
            "name": "A"
        });
        assert!(m.is_instance_of(&customer, "org.example.Customer"));
        assert!(m.is_instance_of(&customer, "org.accordproject.base.Participant"));
        assert!(!m.is_instance_of(&customer, "org.example.Order"));
        customer["name"] = json!(7);
        assert!(!m.is_instance_of(&customer, "org.example.Customer"));
    }
}
