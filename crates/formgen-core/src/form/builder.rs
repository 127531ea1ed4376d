use std::fmt::Display;

use log::trace;
use serde_json::Value;

use crate::config::FormOptions;
use crate::datetime::to_datetime_local;
use crate::defaults::{empty_composite, empty_primitive};
use crate::error::{FormError, ResolveError};
use crate::label::normalize_label;
use crate::model::{
    CLASS_KEY, ClassDeclaration, EnumDeclaration, PrimitiveKind, Property, PropertyKind,
    SchemaLibrary, TypeGraph,
};
use crate::path::{self, JsonPath};
use crate::resolver::{
    FieldType, concrete_for_value, field_type, is_abstract, is_system_type, resolve_concrete,
    to_field_type,
};

use super::cursor::Cursor;
use super::node::{
    ArrayElement, ArraySpec, ChangeKind, CompositeSpec, ContainerSpec, FieldAction, InputSpec,
    InputType, SelectSpec,
};
use super::renderer::Renderer;

const MONETARY_AMOUNT_TYPES: [&str; 2] = [
    "org.accordproject.money.MonetaryAmount",
    "org.accordproject.money.DigitalMonetaryAmount",
];

const DURATION_TYPES: [&str; 2] = [
    "org.accordproject.time.Duration",
    "org.accordproject.time.Period",
];

/// A position in the type graph the builder can visit.
#[derive(Debug, Clone, Copy)]
pub enum Node<'g> {
    Class(&'g ClassDeclaration),
    Enumeration(&'g EnumDeclaration),
    Field(&'g Property),
    Relationship(&'g Property),
}

impl<'g> Node<'g> {
    pub fn of(property: &'g Property) -> Self {
        match property.kind {
            PropertyKind::Field => Node::Field(property),
            PropertyKind::Relationship => Node::Relationship(property),
        }
    }
}

/// Label, requiredness and wrapper style of the field being rendered.
#[derive(Debug, Clone, Default)]
struct Frame {
    label: Option<String>,
    required: bool,
    style: String,
}

impl Frame {
    /// The frame of one element inside an array field.
    fn element(&self) -> Frame {
        Frame {
            label: None,
            required: self.required,
            style: self.style.clone(),
        }
    }
}

type Built<T> = Result<Option<T>, FormError>;

/// Walks a class declaration and the live instance, emitting renderer calls.
pub struct FormBuilder<'a, L: SchemaLibrary + ?Sized, R: Renderer> {
    library: &'a L,
    graph: &'a TypeGraph,
    instance: &'a Value,
    options: &'a FormOptions,
    renderer: &'a R,
}

impl<'a, L, R> FormBuilder<'a, L, R>
where
    L: SchemaLibrary + ?Sized,
    R: Renderer,
    R::Error: Display,
{
    pub fn new(library: &'a L, instance: &'a Value, options: &'a FormOptions, renderer: &'a R) -> Self {
        Self {
            library,
            graph: library.graph(),
            instance,
            options,
            renderer,
        }
    }

    /// Visit `node` at the cursor's position. `None` means nothing is rendered.
    pub fn build(&self, node: Node<'a>, cursor: &mut Cursor) -> Built<R::Output> {
        match node {
            Node::Class(decl) => self.visit_class(decl, None, cursor),
            Node::Enumeration(decl) => self.visit_enumeration(decl, Frame::default(), cursor),
            Node::Field(property) => self.visit_field(property, cursor),
            Node::Relationship(property) => self.visit_relationship(property, cursor),
        }
    }

    fn visit_class(
        &self,
        decl: &'a ClassDeclaration,
        frame: Option<Frame>,
        cursor: &mut Cursor,
    ) -> Built<R::Output> {
        if self.options.hide_identifiers
            && let Some(id) = self.graph.identifier_property(decl)
        {
            cursor.hide(id.fully_qualified_name());
        }
        if is_system_type(self.graph, decl) || is_abstract(decl) {
            return Ok(None);
        }
        let root = frame.is_none();
        let frame = frame.unwrap_or_default();

        if MONETARY_AMOUNT_TYPES.contains(&decl.fqn.as_str()) {
            let (spec, parts) = self.composite(decl, frame, cursor)?;
            return self.rendered(self.renderer.render_composite_amount(spec, parts));
        }
        if DURATION_TYPES.contains(&decl.fqn.as_str()) {
            let (spec, parts) = self.composite(decl, frame, cursor)?;
            return self.rendered(self.renderer.render_composite_duration(spec, parts));
        }

        let children = cursor.with_class(&decl.fqn, |c| {
            let mut children = Vec::new();
            for property in self.graph.properties(decl) {
                if let Some(child) = self.build(Node::of(property), c)? {
                    children.push(child);
                }
            }
            Ok::<_, FormError>(children)
        })?;
        let styles = &self.options.custom_classes;
        let spec = ContainerSpec {
            path: cursor.path(),
            header_style: root.then(|| styles.declaration_header.clone()),
            label: frame.label,
            type_name: decl.fqn.clone(),
            name: decl.name.clone(),
            style: if root { styles.declaration.clone() } else { frame.style },
            body_style: styles.class_element.clone(),
        };
        self.rendered(self.renderer.render_container(spec, children))
    }

    /// The first two properties of a compound value type, rendered without labels.
    fn composite(
        &self,
        decl: &'a ClassDeclaration,
        frame: Frame,
        cursor: &mut Cursor,
    ) -> Result<(CompositeSpec, Vec<R::Output>), FormError> {
        let parts = cursor.without_labels(|c| {
            c.with_class(&decl.fqn, |c| {
                let mut parts = Vec::new();
                for property in self.graph.properties(decl).into_iter().take(2) {
                    if let Some(part) = self.build(Node::of(property), c)? {
                        parts.push(part);
                    }
                }
                Ok::<_, FormError>(parts)
            })
        })?;
        let spec = CompositeSpec {
            path: cursor.path(),
            label: frame.label,
            type_name: decl.fqn.clone(),
            style: frame.style,
        };
        Ok((spec, parts))
    }

    fn visit_enumeration(
        &self,
        decl: &'a EnumDeclaration,
        frame: Frame,
        cursor: &mut Cursor,
    ) -> Built<R::Output> {
        let path = cursor.path();
        let value = path::read(self.instance, &path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| decl.values.first().cloned())
            .unwrap_or_default();
        let spec = SelectSpec {
            on_change: FieldAction::Change {
                path: path.clone(),
                kind: ChangeKind::Select,
            },
            path,
            label: frame.label,
            options: decl.values.clone(),
            value,
            required: frame.required,
            disabled: self.options.disabled,
            style: frame.style,
            select_style: self.options.custom_classes.enumeration.clone(),
        };
        self.rendered(self.renderer.render_enum_select(spec))
    }

    fn visit_field(&self, property: &'a Property, cursor: &mut Cursor) -> Built<R::Output> {
        cursor.with_segment(property.name.as_str(), |c| {
            if self.is_hidden(property, c) {
                trace!("hiding {}", property.fully_qualified_name());
                return Ok(None);
            }
            let frame = self.frame(property, c);
            if property.array {
                return self.visit_array(property, frame, c);
            }
            self.visit_value(property, frame, c)
        })
    }

    fn visit_relationship(&self, property: &'a Property, cursor: &mut Cursor) -> Built<R::Output> {
        cursor.with_segment(property.name.as_str(), |c| {
            if self.is_hidden(property, c) {
                trace!("hiding {}", property.fully_qualified_name());
                return Ok(None);
            }
            let frame = self.frame(property, c);
            if property.array {
                return self.visit_array(property, frame, c);
            }
            self.visit_reference(frame, c)
        })
    }

    /// A relationship value: an embedded object is rendered as its own class.
    fn visit_reference(&self, frame: Frame, cursor: &mut Cursor) -> Built<R::Output> {
        let path = cursor.path();
        let current = path::read(self.instance, &path);
        if let Some(embedded @ Value::Object(_)) = current {
            let fqn = embedded
                .get(CLASS_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| FormError::MissingDiscriminator(path.to_string()))?;
            let declared = self
                .graph
                .class(fqn)
                .ok_or_else(|| ResolveError::TypeNotFound(fqn.to_string()))?;
            let concrete = resolve_concrete(self.graph, declared)?;
            return self.visit_class(concrete, Some(frame), cursor);
        }

        let value = current
            .and_then(Value::as_str)
            .map_or_else(|| Value::String(String::new()), |s| Value::String(s.to_string()));
        let spec = InputSpec {
            on_change: FieldAction::Change {
                path: path.clone(),
                kind: ChangeKind::Reference,
            },
            path,
            label: frame.label,
            input_type: InputType::Text,
            value,
            required: frame.required,
            disabled: self.options.disabled,
            style: frame.style,
            input_style: self.options.custom_classes.input.clone(),
        };
        self.rendered(self.renderer.render_primitive_input(spec))
    }

    /// A single (non-array) field value at the cursor.
    fn visit_value(&self, property: &'a Property, frame: Frame, cursor: &mut Cursor) -> Built<R::Output> {
        let path = cursor.path();
        let current = path::read(self.instance, &path);
        match field_type(self.graph, property)? {
            FieldType::Primitive(kind) => self.primitive_input(kind, frame, path, current),
            FieldType::Enumeration(decl) => self.visit_enumeration(decl, frame, cursor),
            FieldType::Class(declared) => {
                let concrete = concrete_for_value(self.graph, declared, current)?;
                // an absent value is only expanded when it is required and not already open
                let absent = current.is_none_or(Value::is_null);
                if absent && (property.optional || cursor.is_visiting(&concrete.fqn)) {
                    trace!("not expanding absent {}", property.fully_qualified_name());
                    return Ok(None);
                }
                self.visit_class(concrete, Some(frame), cursor)
            }
        }
    }

    fn primitive_input(
        &self,
        kind: PrimitiveKind,
        frame: Frame,
        path: JsonPath,
        current: Option<&Value>,
    ) -> Built<R::Output> {
        let styles = &self.options.custom_classes;
        let (value, change) = match kind {
            PrimitiveKind::Boolean => (
                Value::Bool(current.and_then(Value::as_bool).unwrap_or(false)),
                ChangeKind::Checkbox,
            ),
            PrimitiveKind::DateTime => {
                let shown = current
                    .and_then(Value::as_str)
                    .map(|s| to_datetime_local(s).unwrap_or_else(|| s.to_string()))
                    .unwrap_or_default();
                (Value::String(shown), ChangeKind::DateTime)
            }
            PrimitiveKind::Integer | PrimitiveKind::Long => {
                (current.cloned().unwrap_or(Value::Null), ChangeKind::Integer)
            }
            PrimitiveKind::Double => (current.cloned().unwrap_or(Value::Null), ChangeKind::Double),
            PrimitiveKind::String => (current.cloned().unwrap_or(Value::Null), ChangeKind::Text),
        };
        let input_style = match kind {
            PrimitiveKind::Boolean => styles.boolean.clone(),
            _ => styles.input.clone(),
        };
        let spec = InputSpec {
            on_change: FieldAction::Change {
                path: path.clone(),
                kind: change,
            },
            path,
            label: frame.label,
            input_type: to_field_type(kind.name()),
            value,
            required: frame.required,
            disabled: self.options.disabled,
            style: frame.style,
            input_style,
        };
        self.rendered(self.renderer.render_primitive_input(spec))
    }

    fn visit_array(&self, property: &'a Property, frame: Frame, cursor: &mut Cursor) -> Built<R::Output> {
        let path = cursor.path();
        let len = path::read(self.instance, &path)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let seed = self.array_seed(property)?;

        let mut elements = Vec::with_capacity(len);
        for index in 0..len {
            let element = cursor.with_segment(index, |c| {
                if property.is_relationship() {
                    self.visit_reference(frame.element(), c)
                } else {
                    self.visit_value(property, frame.element(), c)
                }
            })?;
            if let Some(node) = element {
                elements.push(ArrayElement {
                    index,
                    node,
                    on_remove: FieldAction::Remove {
                        path: path.clone(),
                        index,
                    },
                });
            }
        }

        let styles = &self.options.custom_classes;
        let spec = ArraySpec {
            on_add: FieldAction::Add {
                path: path.clone(),
                seed,
            },
            path,
            label: frame.label,
            required: frame.required,
            disabled: self.options.disabled,
            style: frame.style,
            element_style: format!("{} grid", styles.array_element),
            button_style: styles.button.clone(),
        };
        self.rendered(self.renderer.render_array_controls(spec, elements))
    }

    /// Value appended by the add control, synthesized fresh for each build.
    fn array_seed(&self, property: &'a Property) -> Result<Value, FormError> {
        if property.is_relationship() {
            return Ok(Value::String(String::new()));
        }
        Ok(match field_type(self.graph, property)? {
            FieldType::Primitive(kind) => empty_primitive(kind),
            FieldType::Enumeration(decl) => decl
                .values
                .first()
                .map_or(Value::Null, |v| Value::String(v.clone())),
            FieldType::Class(declared) => {
                let concrete = resolve_concrete(self.graph, declared)?;
                empty_composite(self.library, concrete)?
            }
        })
    }

    fn frame(&self, property: &Property, cursor: &Cursor) -> Frame {
        let styles = &self.options.custom_classes;
        let mut style = styles.field.clone();
        if !property.optional {
            style.push(' ');
            style.push_str(&styles.required);
        }
        if self.options.disabled {
            style.push_str(" readonly transparent");
        }
        Frame {
            label: (!cursor.skip_label()).then(|| normalize_label(&property.name)),
            required: !property.optional,
            style,
        }
    }

    fn is_hidden(&self, property: &Property, cursor: &Cursor) -> bool {
        self.options.hides(property) || cursor.is_hidden(&property.fully_qualified_name())
    }

    fn rendered(&self, result: Result<R::Output, R::Error>) -> Built<R::Output> {
        result
            .map(Some)
            .map_err(|e| FormError::Render(e.to_string()))
    }
}
