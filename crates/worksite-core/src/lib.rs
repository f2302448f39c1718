//! ============================================================================
//! WORKSITE-CORE: Completion Engine
//! ============================================================================
//! Business logic for contractor-services completion workflows:
//! - Monetary aggregation (material cost, payment amounts, labour estimates)
//! - Completion gate validating evidence before any remote call
//! - Orchestrator running the status -> payment -> document commit chain
//!   against the remote work-order API
//! ============================================================================

pub mod api;
pub mod completion_gate;
pub mod document;
pub mod money;
pub mod orchestrator;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use api::{HttpWorkOrderApi, WorkOrderApi};
pub use completion_gate::GateViolation;
pub use document::{DocumentSink, FileDocumentSink};
pub use orchestrator::{
    submit_progress_update, CompletionOrchestrator, CompletionOutcome, CompletionState,
    ProgressUpdateError,
};
pub use session::{CompletionSession, CompletionVariant, QuotationEstimate, ScopeItem};
pub use types::*;
