use std::convert::Infallible;

use super::node::{
    ArrayElement, ArraySpec, CompositeSpec, ContainerSpec, FormNode, InputSpec, SelectSpec,
};

/// Turns the builder's widget specs into some output form.
///
/// The builder walks the type graph and calls these in render order; children
/// are always rendered before the node that wraps them.
pub trait Renderer {
    type Output;
    type Error;

    fn render_container(
        &self,
        spec: ContainerSpec,
        children: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;

    fn render_primitive_input(&self, spec: InputSpec) -> Result<Self::Output, Self::Error>;

    fn render_enum_select(&self, spec: SelectSpec) -> Result<Self::Output, Self::Error>;

    fn render_array_controls(
        &self,
        spec: ArraySpec,
        elements: Vec<ArrayElement<Self::Output>>,
    ) -> Result<Self::Output, Self::Error>;

    fn render_composite_amount(
        &self,
        spec: CompositeSpec,
        parts: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;

    fn render_composite_duration(
        &self,
        spec: CompositeSpec,
        parts: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;
}

/// Builds the [`FormNode`] descriptor tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorRenderer;

impl Renderer for DescriptorRenderer {
    type Output = FormNode;
    type Error = Infallible;

    fn render_container(
        &self,
        spec: ContainerSpec,
        children: Vec<FormNode>,
    ) -> Result<FormNode, Infallible> {
        Ok(FormNode::Container { spec, children })
    }

    fn render_primitive_input(&self, spec: InputSpec) -> Result<FormNode, Infallible> {
        Ok(FormNode::Input(spec))
    }

    fn render_enum_select(&self, spec: SelectSpec) -> Result<FormNode, Infallible> {
        Ok(FormNode::Select(spec))
    }

    fn render_array_controls(
        &self,
        spec: ArraySpec,
        elements: Vec<ArrayElement<FormNode>>,
    ) -> Result<FormNode, Infallible> {
        Ok(FormNode::Array { spec, elements })
    }

    fn render_composite_amount(
        &self,
        spec: CompositeSpec,
        parts: Vec<FormNode>,
    ) -> Result<FormNode, Infallible> {
        Ok(FormNode::MonetaryAmount { spec, parts })
    }

    fn render_composite_duration(
        &self,
        spec: CompositeSpec,
        parts: Vec<FormNode>,
    ) -> Result<FormNode, Infallible> {
        Ok(FormNode::Duration { spec, parts })
    }
}
