pub mod document;
pub mod error;
pub mod renderer;

pub use document::emit_form;
pub use error::HtmlError;
pub use renderer::HtmlRenderer;
