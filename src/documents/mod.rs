// ==========================================
// Plant operations - document generation
// ==========================================
// Export paperwork for China shipments: template registry,
// per-type data preparation, HTML rendering
// ==========================================

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{DocumentError, DocumentResult};
pub use generator::{
    prepare_document_data, DocumentData, DocumentGenerator, DocumentPackage, GeneratedDocument,
    RenderSource,
};
pub use templates::{DocumentTemplate, OutputFormat, TEMPLATES};
