// ==========================================
// Plant operations - customs integration
// ==========================================

pub mod client;
pub mod error;
pub mod hs_code;
pub mod transport;

pub use client::{CustomsClient, CustomsDocument, SubmissionReceipt, SubmissionStatus};
pub use error::{CustomsError, CustomsResult, TransportError};
pub use transport::{CustomsRequest, CustomsResponse, CustomsTransport, ScriptedTransport};
