use thiserror::Error;

#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("action encoding error: {0}")]
    Action(#[from] serde_json::Error),
}
