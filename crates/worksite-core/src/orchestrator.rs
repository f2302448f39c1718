//! ============================================================================
//! Completion Orchestrator - The Three-Call Commit Chain
//! ============================================================================
//! Runs a completion action as a strict sequence:
//!   gate check -> status update -> payment request -> document generation
//!
//! Failure semantics are the load-bearing part:
//! - No call is made until the gate passes
//! - Each call is issued only after the previous one succeeded
//! - A failed step leaves earlier commits in place; there is no compensating
//!   transaction: the remote work-order system is the source of truth and
//!   reconciliation is out of band
//! - A retry never re-runs a step that already succeeded
//! - Session state is cleared only on full success
//! ============================================================================

use std::path::PathBuf;

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::WorkOrderApi;
use crate::completion_gate::{self, GateViolation};
use crate::document::{self, DocumentSink};
use crate::money;
use crate::session::CompletionSession;
use crate::types::{
    CompletionStep, EntityStatus, ItemizedBudgetLine, PaymentBasisFields, PaymentRequest,
    UpdatedEntity, WorkflowError,
};

/// Observable state of one completion action
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionState {
    Idle,
    Validating,
    CommittingStatus,
    CommittingPayment,
    GeneratingDocument,
    Done,
    Failed {
        step: CompletionStep,
        message: String,
    },
}

/// How a fully committed completion ended
#[derive(Debug)]
pub enum CompletionOutcome {
    /// All three calls succeeded and the document was saved
    Completed {
        payment: PaymentRequest,
        document_path: PathBuf,
    },
    /// All three calls succeeded but the returned document could not be
    /// decoded or saved. Non-fatal: the completion and payment request stand.
    CompletedWithDocumentWarning {
        payment: PaymentRequest,
        warning: String,
    },
}

/// Drives the commit chain for one completion session. Construct one per
/// session; it remembers which steps committed so a retry after a partial
/// failure picks up where the chain broke instead of re-running commits.
pub struct CompletionOrchestrator<'a> {
    api: &'a dyn WorkOrderApi,
    sink: &'a dyn DocumentSink,
    state: CompletionState,
    committed_entity: Option<UpdatedEntity>,
    committed_payment: Option<PaymentRequest>,
}

impl<'a> CompletionOrchestrator<'a> {
    pub fn new(api: &'a dyn WorkOrderApi, sink: &'a dyn DocumentSink) -> Self {
        Self {
            api,
            sink,
            state: CompletionState::Idle,
            committed_entity: None,
            committed_payment: None,
        }
    }

    pub fn state(&self) -> &CompletionState {
        &self.state
    }

    /// Run (or resume) the commit chain for the session. On full success the
    /// session is reset so the modal can be reopened for the next item.
    pub async fn run(
        &mut self,
        session: &mut CompletionSession,
    ) -> Result<CompletionOutcome, WorkflowError> {
        self.state = CompletionState::Validating;
        if let Err(violation) = completion_gate::check_completion(session) {
            // No remote call is ever made for invalid input; the operator
            // corrects the form and resubmits
            self.state = CompletionState::Idle;
            return Err(WorkflowError::Validation(violation));
        }

        let evidence = &session.evidence;
        let basis = PaymentBasisFields {
            rate_mode: evidence.payment_basis.mode(),
            units_worked: evidence
                .payment_basis
                .units_worked()
                .unwrap_or(Decimal::ZERO),
            rate: money::effective_rate(&evidence.payment_basis, session.profile_fallback_rate),
        };
        let material_cost =
            money::compute_material_cost(evidence.manual_material_cost, &evidence.expense_records);

        // Step 1: status update
        if self.committed_entity.is_none() {
            self.state = CompletionState::CommittingStatus;
            info!("Committing {:?} completion for {}", session.variant, session.entity_id);
            let updated = self
                .api
                .update_status(
                    session.entity_id,
                    EntityStatus::Completed,
                    evidence,
                    material_cost,
                    &basis,
                )
                .await
                .map_err(|e| self.fail(CompletionStep::CommittingStatus, e))?;
            self.committed_entity = Some(updated);
        } else {
            info!("Status already committed for {}, skipping", session.entity_id);
        }

        // Step 2: payment request, only after the status update succeeded
        if self.committed_payment.is_none() {
            self.state = CompletionState::CommittingPayment;
            let amount =
                money::compute_payment_amount(&evidence.payment_basis, session.profile_fallback_rate);
            let payment = self
                .api
                .create_payment_request(
                    session.entity_id,
                    &basis,
                    amount,
                    evidence.notes.as_deref(),
                )
                .await
                .map_err(|e| self.fail(CompletionStep::CommittingPayment, e))?;
            self.committed_payment = Some(payment);
        } else {
            info!("Payment request already committed for {}, skipping", session.entity_id);
        }

        // Step 3: document generation. By now the entity is completed and
        // payment is requested; nothing past this point rolls those back.
        self.state = CompletionState::GeneratingDocument;
        let kind = session.variant.document_kind();
        let encoded = self
            .api
            .generate_document(session.entity_id, kind)
            .await
            .map_err(|e| self.fail(CompletionStep::GeneratingDocument, e))?;

        let payment = self
            .committed_payment
            .clone()
            .unwrap_or_else(|| unreachable!("payment committed before document generation"));

        let label = self
            .committed_entity
            .as_ref()
            .and_then(|e| e.entity_number.clone())
            .unwrap_or_else(|| session.entity_label());
        let filename = document::document_filename(kind, &label);

        let saved = document::decode_document(&encoded)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                self.sink
                    .save(&filename, &bytes)
                    .map_err(|e| e.to_string())
            });

        // Full chain succeeded; clear the session for the next item
        self.state = CompletionState::Done;
        session.reset();

        match saved {
            Ok(document_path) => {
                info!("Completion finished; document at {}", document_path.display());
                Ok(CompletionOutcome::Completed {
                    payment,
                    document_path,
                })
            }
            Err(warning) => {
                // Both commits stand; the document can be re-downloaded later
                warn!("Document could not be saved: {}", warning);
                Ok(CompletionOutcome::CompletedWithDocumentWarning { payment, warning })
            }
        }
    }

    fn fail(&mut self, step: CompletionStep, cause: anyhow::Error) -> WorkflowError {
        // Persistent-severity surfacing: a partial completion may stand
        error!("{} failed: {:#}", step, cause);
        self.state = CompletionState::Failed {
            step,
            message: cause.to_string(),
        };
        WorkflowError::RemoteCall { step, cause }
    }
}

// ============================================================================
// Progress Updates
// ============================================================================

/// Error surface of a progress-update submission
#[derive(Debug, thiserror::Error)]
pub enum ProgressUpdateError {
    #[error("{0}")]
    Validation(#[from] GateViolation),

    #[error("progress update failed: {0}")]
    Remote(anyhow::Error),
}

/// Validate and submit a budget-vs-actual batch as one unit. An invalid
/// batch is never sent; nothing commits unless every line passes.
pub async fn submit_progress_update(
    api: &dyn WorkOrderApi,
    entity_id: Uuid,
    lines: &[ItemizedBudgetLine],
) -> Result<(), ProgressUpdateError> {
    completion_gate::check_itemized_lines(lines)?;
    api.submit_progress_update(entity_id, lines)
        .await
        .map_err(ProgressUpdateError::Remote)?;
    info!("Progress update committed for {}", entity_id);
    Ok(())
}
