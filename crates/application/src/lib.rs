//! Application layer for draftpilot
//!
//! Composes the security classification gate with the provider orchestration
//! layer: every request is classified first, and only authorized content
//! reaches a backend. Also owns the classification audit log and the
//! response-structuring parser.

pub mod error;
pub mod services;

pub use error::ApplicationError;
pub use services::{
    AssistantService, ClassificationAuditLog, ClassificationEngine, parse_analysis,
};
