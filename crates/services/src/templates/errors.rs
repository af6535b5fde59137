#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Template not found")]
    NotFound,
}
