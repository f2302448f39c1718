//! ============================================================================
//! Core Types for the Worksite Completion Engine
//! ============================================================================
//! Defines all data structures for completion evidence, payment bases, and
//! remote work-order API results. These types are serialized to JSON for the
//! wire and for evidence files supplied to the CLI.
//! ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::completion_gate::GateViolation;

/// Category label attached to an uploaded expense slip / supplier quotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Materials,
    Labour,
    Equipment,
    Transport,
    Other,
}

/// One uploaded expense slip or supplier quotation.
/// The document reference is an opaque storage handle; the engine never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub document_url: String,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: Option<String>,
    /// Absent when the uploader did not enter a figure
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Hourly-vs-daily mode tag carried in payment-request payloads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateMode {
    Hourly,
    Daily,
}

/// The basis a payment request is derived from. Fields stay optional because
/// "not yet entered" is a real state while the completion modal is open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaymentBasis {
    Hourly {
        hours_worked: Option<Decimal>,
        rate: Option<Decimal>,
    },
    Daily {
        days_worked: Option<Decimal>,
        rate: Option<Decimal>,
    },
}

impl PaymentBasis {
    pub fn mode(&self) -> RateMode {
        match self {
            PaymentBasis::Hourly { .. } => RateMode::Hourly,
            PaymentBasis::Daily { .. } => RateMode::Daily,
        }
    }

    /// Hours or days worked, depending on mode
    pub fn units_worked(&self) -> Option<Decimal> {
        match self {
            PaymentBasis::Hourly { hours_worked, .. } => *hours_worked,
            PaymentBasis::Daily { days_worked, .. } => *days_worked,
        }
    }

    /// The rate as entered by the operator (not the profile fallback)
    pub fn entered_rate(&self) -> Option<Decimal> {
        match self {
            PaymentBasis::Hourly { rate, .. } => *rate,
            PaymentBasis::Daily { rate, .. } => *rate,
        }
    }
}

/// One line of a budget-vs-actual breakdown in a milestone progress update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemizedBudgetLine {
    pub description: String,
    pub quoted_amount: Decimal,
    pub actual_spent: Decimal,
    /// Mandatory whenever actual_spent exceeds quoted_amount
    #[serde(default)]
    pub overspend_reason: Option<String>,
}

impl ItemizedBudgetLine {
    pub fn is_overspent(&self) -> bool {
        self.actual_spent > self.quoted_amount
    }
}

/// Everything a completion action carries. Assembled in one modal session and
/// submitted as a unit or discarded on cancel: never partially persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvidence {
    /// Storage references for after-work photos
    #[serde(default)]
    pub after_photos: Vec<String>,
    #[serde(default)]
    pub signature_url: Option<String>,
    #[serde(default)]
    pub client_rep_name: Option<String>,
    #[serde(default)]
    pub client_rep_sign_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expense_records: Vec<ExpenseRecord>,
    pub payment_basis: PaymentBasis,
    /// Operator-entered material cost; when positive it beats the slip sum
    #[serde(default)]
    pub manual_material_cost: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CompletionEvidence {
    /// Empty evidence in hourly mode: the state of a freshly opened session
    pub fn empty() -> Self {
        Self {
            after_photos: Vec::new(),
            signature_url: None,
            client_rep_name: None,
            client_rep_sign_date: None,
            expense_records: Vec::new(),
            payment_basis: PaymentBasis::Hourly {
                hours_worked: None,
                rate: None,
            },
            manual_material_cost: None,
            notes: None,
        }
    }
}

/// Status transition set owned by the remote work-order system.
/// This engine only ever submits `Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    Assigned,
    InProgress,
    Completed,
}

/// Which document the remote side renders for a finished unit of work
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    JobCard,
    OrderSummary,
}

impl DocumentKind {
    /// Filename prefix: "{slug}-{entity_number_or_id}.pdf"
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentKind::JobCard => "job-card",
            DocumentKind::OrderSummary => "order-summary",
        }
    }
}

// ============================================================================
// Remote API Result Types
// ============================================================================

/// Entity snapshot returned by a successful status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedEntity {
    pub id: Uuid,
    pub status: EntityStatus,
    /// Human-readable number (e.g. "JOB-0142"), used in document filenames
    #[serde(default)]
    pub entity_number: Option<String>,
}

/// Payment request created by the remote side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub amount: Decimal,
    pub rate_mode: RateMode,
}

/// Generated document as returned by the remote side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedDocument {
    /// Base64-encoded binary document (PDF)
    pub payload_base64: String,
}

/// Rate/units fields as they travel in status-update and payment-request
/// payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBasisFields {
    pub rate_mode: RateMode,
    pub units_worked: Decimal,
    pub rate: Decimal,
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// The commit step a remote failure is tagged with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    CommittingStatus,
    CommittingPayment,
    GeneratingDocument,
}

impl std::fmt::Display for CompletionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionStep::CommittingStatus => "status update",
            CompletionStep::CommittingPayment => "payment request",
            CompletionStep::GeneratingDocument => "document generation",
        };
        f.write_str(s)
    }
}

/// Error types for a completion action. Validation never reaches the remote
/// layer; remote failures leave already-committed steps committed.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(#[from] GateViolation),

    #[error("{step} failed: {cause}")]
    RemoteCall {
        step: CompletionStep,
        cause: anyhow::Error,
    },

    #[error("could not decode generated document: {0}")]
    DocumentDecode(String),
}

impl WorkflowError {
    /// The step a remote failure occurred at, if any
    pub fn failed_step(&self) -> Option<CompletionStep> {
        match self {
            WorkflowError::RemoteCall { step, .. } => Some(*step),
            _ => None,
        }
    }
}
