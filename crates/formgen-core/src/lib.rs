pub mod config;
pub mod datetime;
pub mod defaults;
pub mod error;
pub mod form;
pub mod generator;
pub mod label;
pub mod model;
pub mod path;
pub mod resolver;
pub mod session;

pub use form::{FieldAction, FormNode, Renderer};
pub use generator::FormGenerator;
pub use session::{FormSession, LoadOutcome, LoadTicket};
