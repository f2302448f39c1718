//! ============================================================================
//! Completion Session - Per-Modal Workflow State
//! ============================================================================
//! One session per open completion modal. Built fresh when the modal opens,
//! submitted as a unit, and reset to empty only after a fully successful
//! commit chain so the modal can be reopened cleanly for the next item.
//! ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CompletionEvidence, DocumentKind};

/// Which completion flow the session drives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionVariant {
    Job,
    Milestone,
    Quotation,
}

impl CompletionVariant {
    /// Document the remote side renders for this variant
    pub fn document_kind(&self) -> DocumentKind {
        match self {
            CompletionVariant::Job | CompletionVariant::Milestone => DocumentKind::JobCard,
            CompletionVariant::Quotation => DocumentKind::OrderSummary,
        }
    }
}

/// One scope-of-work line in a quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeItem {
    pub description: String,
}

/// Estimation fields for the quotation variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationEstimate {
    #[serde(default)]
    pub num_people_needed: Option<Decimal>,
    /// Duration in the unit implied by the rate mode (hours or days)
    #[serde(default)]
    pub estimated_duration: Option<Decimal>,
    #[serde(default)]
    pub rate_amount: Option<Decimal>,
    #[serde(default)]
    pub scope_of_work: Vec<ScopeItem>,
}

/// All transient state of one completion modal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSession {
    pub entity_id: Uuid,
    /// Human-readable number (e.g. "JOB-0142"); falls back to the id in
    /// document filenames when absent
    #[serde(default)]
    pub entity_number: Option<String>,
    pub variant: CompletionVariant,
    pub evidence: CompletionEvidence,
    /// Profile-level rate used when the operator leaves the rate field blank
    #[serde(default)]
    pub profile_fallback_rate: Option<Decimal>,
    /// Present only for the quotation variant
    #[serde(default)]
    pub quotation: Option<QuotationEstimate>,
}

impl CompletionSession {
    /// Fresh session for a newly opened modal
    pub fn new(entity_id: Uuid, variant: CompletionVariant) -> Self {
        Self {
            entity_id,
            entity_number: None,
            variant,
            evidence: CompletionEvidence::empty(),
            profile_fallback_rate: None,
            quotation: None,
        }
    }

    /// Label used in document filenames
    pub fn entity_label(&self) -> String {
        self.entity_number
            .clone()
            .unwrap_or_else(|| self.entity_id.to_string())
    }

    /// Clear all evidence so the modal can be reopened for the next item.
    /// Called only after the full commit chain succeeded.
    pub fn reset(&mut self) {
        self.evidence = CompletionEvidence::empty();
        self.quotation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_evidence() {
        let mut session = CompletionSession::new(Uuid::new_v4(), CompletionVariant::Job);
        session.evidence.after_photos = vec!["a".into(), "b".into(), "c".into()];
        session.evidence.signature_url = Some("sig".into());
        session.reset();
        assert!(session.evidence.after_photos.is_empty());
        assert!(session.evidence.signature_url.is_none());
    }

    #[test]
    fn test_entity_label_prefers_number() {
        let mut session = CompletionSession::new(Uuid::new_v4(), CompletionVariant::Job);
        session.entity_number = Some("JOB-0142".into());
        assert_eq!(session.entity_label(), "JOB-0142");
    }

    #[test]
    fn test_session_file_deserializes_with_sparse_fields() {
        // The CLI accepts session files that omit everything optional
        let raw = r#"{
            "entity_id": "5f0c54f2-8657-4b0f-9c2f-0f8f6a3a9a01",
            "variant": "milestone",
            "evidence": {
                "expense_records": [
                    { "document_url": "https://store.example/slip.jpg",
                      "category": "materials", "amount": "350" }
                ],
                "payment_basis": { "mode": "daily", "days_worked": "2", "rate": null }
            }
        }"#;
        let session: CompletionSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.variant, CompletionVariant::Milestone);
        assert!(session.profile_fallback_rate.is_none());
        assert_eq!(session.evidence.expense_records.len(), 1);
    }

    #[test]
    fn test_document_kind_per_variant() {
        assert_eq!(
            CompletionVariant::Job.document_kind(),
            DocumentKind::JobCard
        );
        assert_eq!(
            CompletionVariant::Milestone.document_kind(),
            DocumentKind::JobCard
        );
        assert_eq!(
            CompletionVariant::Quotation.document_kind(),
            DocumentKind::OrderSummary
        );
    }
}
