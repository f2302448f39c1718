//! ============================================================================
//! Work-Order API - Remote Procedure Boundary
//! ============================================================================
//! The narrow contract the completion engine drives. The remote work-order
//! system owns all consistency guarantees (status-transition idempotency,
//! duplicate payment-request prevention); this side only sequences calls.
//! ============================================================================

mod http;

pub use http::HttpWorkOrderApi;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{
    CompletionEvidence, DocumentKind, EncodedDocument, EntityStatus, ItemizedBudgetLine,
    PaymentBasisFields, PaymentRequest, UpdatedEntity,
};

/// Remote work-order API contract. One method per chained call in the
/// completion commit sequence, plus the progress-update batch submit.
#[async_trait]
pub trait WorkOrderApi: Send + Sync {
    /// Mark an entity with its new status, carrying the full evidence set,
    /// the aggregated material cost, and the payment-basis fields
    async fn update_status(
        &self,
        entity_id: Uuid,
        new_status: EntityStatus,
        evidence: &CompletionEvidence,
        material_cost: Decimal,
        basis: &PaymentBasisFields,
    ) -> Result<UpdatedEntity>;

    /// Create the payment request for a completed entity
    async fn create_payment_request(
        &self,
        entity_id: Uuid,
        basis: &PaymentBasisFields,
        calculated_amount: Decimal,
        notes: Option<&str>,
    ) -> Result<PaymentRequest>;

    /// Ask the remote side to render the job-card / order-summary document
    async fn generate_document(
        &self,
        entity_id: Uuid,
        kind: DocumentKind,
    ) -> Result<EncodedDocument>;

    /// Submit a budget-vs-actual progress update as one unit
    async fn submit_progress_update(
        &self,
        entity_id: Uuid,
        lines: &[ItemizedBudgetLine],
    ) -> Result<()>;
}
