pub mod builder;
pub mod cursor;
pub mod node;
pub mod renderer;

pub use builder::{FormBuilder, Node};
pub use cursor::Cursor;
pub use node::{
    ArrayElement, ArraySpec, ChangeKind, CompositeSpec, ContainerSpec, EditValue, FieldAction,
    FormNode, InputSpec, InputType, SelectSpec,
};
pub use renderer::{DescriptorRenderer, Renderer};
