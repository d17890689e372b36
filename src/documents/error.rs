// ==========================================
// Plant operations - document generation errors
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("template {0} not found")]
    TemplateNotFound(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("failed to render template: {0}")]
    Render(#[from] minijinja::Error),

    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
