//! ============================================================================
//! Completion Gate - Evidence & Payment Precondition Checks
//! ============================================================================
//! Validates a completion session before any remote call is made:
//! - Job completions need photo evidence, a client sign-off, expense slips,
//!   and a complete payment basis
//! - Milestones use the lighter evidentiary bar (slips + payment basis)
//! - Quotations need estimation figures and a scope of work
//!
//! Checks run in a fixed order and report the first violation only: the
//! surrounding UI surfaces exactly one message at a time and re-checks on
//! every resubmission attempt.
//! ============================================================================

use rust_decimal::Decimal;
use tracing::debug;

use crate::money;
use crate::session::{CompletionSession, CompletionVariant, QuotationEstimate};
use crate::types::ItemizedBudgetLine;

/// Minimum after-work photos for job and quotation completion flows
pub const MIN_AFTER_PHOTOS: usize = 3;

/// A single blocking validation failure, in the words shown to the operator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateViolation {
    #[error("at least 3 after-work photos are required ({found} provided)")]
    NotEnoughAfterPhotos { found: usize },

    #[error("client representative signature is required")]
    MissingSignature,

    #[error("client representative name is required")]
    MissingClientRepName,

    #[error("client representative sign-off date is required")]
    MissingSignDate,

    #[error("at least one expense slip or supplier quotation is required")]
    NoExpenseRecords,

    #[error("worked hours/days must be greater than zero")]
    UnitsNotPositive,

    #[error("rate must be greater than zero")]
    RateNotPositive,

    #[error("material cost must be greater than zero")]
    MaterialCostNotPositive,

    #[error("quotation estimate details are required")]
    MissingQuotationEstimate,

    #[error("number of people needed must be greater than zero")]
    PeopleNeededNotPositive,

    #[error("estimated duration must be greater than zero")]
    DurationNotPositive,

    #[error("at least one scope-of-work item with a description is required")]
    MissingScopeOfWork,

    #[error("budget line {line} needs a description")]
    BlankBudgetLineDescription { line: usize },

    #[error("'{description}' exceeds its quoted amount; an overspend reason is required")]
    MissingOverspendReason { description: String },
}

/// Run the gate for whichever variant the session drives
pub fn check_completion(session: &CompletionSession) -> Result<(), GateViolation> {
    let result = match session.variant {
        CompletionVariant::Job => check_job_completion(session),
        CompletionVariant::Milestone => check_milestone_completion(session),
        CompletionVariant::Quotation => check_quotation_completion(session),
    };
    if let Err(violation) = &result {
        debug!(entity = %session.entity_id, %violation, "completion gate rejected");
    }
    result
}

/// Full job-completion gate. Order is fixed and first violation wins.
pub fn check_job_completion(session: &CompletionSession) -> Result<(), GateViolation> {
    let evidence = &session.evidence;

    if evidence.after_photos.len() < MIN_AFTER_PHOTOS {
        return Err(GateViolation::NotEnoughAfterPhotos {
            found: evidence.after_photos.len(),
        });
    }
    if evidence.signature_url.is_none() {
        return Err(GateViolation::MissingSignature);
    }
    if !is_present(&evidence.client_rep_name) {
        return Err(GateViolation::MissingClientRepName);
    }
    if evidence.client_rep_sign_date.is_none() {
        return Err(GateViolation::MissingSignDate);
    }
    check_payment_steps(session)?;

    let material_cost = money::compute_material_cost(
        evidence.manual_material_cost,
        &evidence.expense_records,
    );
    if material_cost <= Decimal::ZERO {
        return Err(GateViolation::MaterialCostNotPositive);
    }
    Ok(())
}

/// Milestone gate: expense documentation and payment-basis completeness only
pub fn check_milestone_completion(session: &CompletionSession) -> Result<(), GateViolation> {
    check_payment_steps(session)
}

fn check_payment_steps(session: &CompletionSession) -> Result<(), GateViolation> {
    let evidence = &session.evidence;

    if evidence.expense_records.is_empty() {
        return Err(GateViolation::NoExpenseRecords);
    }
    if !evidence
        .payment_basis
        .units_worked()
        .is_some_and(|u| u > Decimal::ZERO)
    {
        return Err(GateViolation::UnitsNotPositive);
    }
    // A blank rate is acceptable only when the profile fallback fills it in
    if money::effective_rate(&evidence.payment_basis, session.profile_fallback_rate)
        <= Decimal::ZERO
    {
        return Err(GateViolation::RateNotPositive);
    }
    Ok(())
}

/// Quotation gate: estimation figures plus a non-empty scope of work
pub fn check_quotation_completion(session: &CompletionSession) -> Result<(), GateViolation> {
    if session.evidence.expense_records.is_empty() {
        return Err(GateViolation::NoExpenseRecords);
    }
    let Some(estimate) = &session.quotation else {
        return Err(GateViolation::MissingQuotationEstimate);
    };
    check_quotation_estimate(estimate)
}

fn check_quotation_estimate(estimate: &QuotationEstimate) -> Result<(), GateViolation> {
    if !estimate
        .num_people_needed
        .is_some_and(|n| n > Decimal::ZERO)
    {
        return Err(GateViolation::PeopleNeededNotPositive);
    }
    if !estimate
        .estimated_duration
        .is_some_and(|d| d > Decimal::ZERO)
    {
        return Err(GateViolation::DurationNotPositive);
    }
    if !estimate.rate_amount.is_some_and(|r| r > Decimal::ZERO) {
        return Err(GateViolation::RateNotPositive);
    }
    if !estimate
        .scope_of_work
        .iter()
        .any(|item| !item.description.trim().is_empty())
    {
        return Err(GateViolation::MissingScopeOfWork);
    }
    Ok(())
}

/// All-or-nothing batch check for a milestone progress update: every line
/// needs a description, and every overspent line needs a reason. One bad
/// line rejects the whole batch.
pub fn check_itemized_lines(lines: &[ItemizedBudgetLine]) -> Result<(), GateViolation> {
    for (idx, line) in lines.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(GateViolation::BlankBudgetLineDescription { line: idx + 1 });
        }
        if line.is_overspent() && !is_present(&line.overspend_reason) {
            return Err(GateViolation::MissingOverspendReason {
                description: line.description.clone(),
            });
        }
    }
    Ok(())
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScopeItem;
    use crate::types::{CompletionEvidence, ExpenseCategory, ExpenseRecord, PaymentBasis};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn slip(amount: Option<Decimal>) -> ExpenseRecord {
        ExpenseRecord {
            document_url: "https://store.example/slip.jpg".into(),
            category: ExpenseCategory::Materials,
            description: None,
            amount,
        }
    }

    /// Session that passes the full job gate
    fn complete_job_session() -> CompletionSession {
        let mut session = CompletionSession::new(Uuid::new_v4(), CompletionVariant::Job);
        session.evidence = CompletionEvidence {
            after_photos: vec!["p1".into(), "p2".into(), "p3".into()],
            signature_url: Some("https://store.example/sig.png".into()),
            client_rep_name: Some("T. Mokoena".into()),
            client_rep_sign_date: Some(Utc::now()),
            expense_records: vec![slip(Some(dec!(350)))],
            payment_basis: PaymentBasis::Hourly {
                hours_worked: Some(dec!(8)),
                rate: Some(dec!(250)),
            },
            manual_material_cost: None,
            notes: None,
        };
        session
    }

    #[test]
    fn test_complete_session_passes() {
        assert_eq!(check_job_completion(&complete_job_session()), Ok(()));
    }

    #[test]
    fn test_photo_count_reported_first() {
        // Two photos AND no signature: only the photo error
        // surfaces, the gate stops at the earliest violation
        let mut session = complete_job_session();
        session.evidence.after_photos = vec!["p1".into(), "p2".into()];
        session.evidence.signature_url = None;
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::NotEnoughAfterPhotos { found: 2 })
        );
    }

    #[test]
    fn test_gate_order_after_photos() {
        let mut session = complete_job_session();
        session.evidence.signature_url = None;
        session.evidence.client_rep_name = None;
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::MissingSignature)
        );

        session.evidence.signature_url = Some("sig".into());
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::MissingClientRepName)
        );

        // Whitespace-only name is still missing
        session.evidence.client_rep_name = Some("   ".into());
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::MissingClientRepName)
        );

        session.evidence.client_rep_name = Some("T. Mokoena".into());
        session.evidence.client_rep_sign_date = None;
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::MissingSignDate)
        );
    }

    #[test]
    fn test_expense_records_required() {
        let mut session = complete_job_session();
        session.evidence.expense_records.clear();
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::NoExpenseRecords)
        );
    }

    #[test]
    fn test_payment_basis_completeness() {
        let mut session = complete_job_session();
        session.evidence.payment_basis = PaymentBasis::Daily {
            days_worked: None,
            rate: Some(dec!(1200)),
        };
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::UnitsNotPositive)
        );

        session.evidence.payment_basis = PaymentBasis::Daily {
            days_worked: Some(dec!(2)),
            rate: None,
        };
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::RateNotPositive)
        );

        // Blank rate passes once the profile fallback fills it
        session.profile_fallback_rate = Some(dec!(900));
        assert_eq!(check_job_completion(&session), Ok(()));
    }

    #[test]
    fn test_material_cost_must_be_positive() {
        let mut session = complete_job_session();
        session.evidence.expense_records = vec![slip(None), slip(None)];
        assert_eq!(
            check_job_completion(&session),
            Err(GateViolation::MaterialCostNotPositive)
        );

        // A positive manual override satisfies the same rule
        session.evidence.manual_material_cost = Some(dec!(500));
        assert_eq!(check_job_completion(&session), Ok(()));
    }

    #[test]
    fn test_milestone_gate_skips_photo_and_signature_steps() {
        let mut session = complete_job_session();
        session.variant = CompletionVariant::Milestone;
        session.evidence.after_photos.clear();
        session.evidence.signature_url = None;
        session.evidence.client_rep_name = None;
        session.evidence.client_rep_sign_date = None;
        assert_eq!(check_completion(&session), Ok(()));
    }

    #[test]
    fn test_quotation_gate() {
        let mut session = CompletionSession::new(Uuid::new_v4(), CompletionVariant::Quotation);
        session.evidence.expense_records = vec![slip(Some(dec!(100)))];
        assert_eq!(
            check_completion(&session),
            Err(GateViolation::MissingQuotationEstimate)
        );

        session.quotation = Some(QuotationEstimate {
            num_people_needed: Some(dec!(2)),
            estimated_duration: Some(dec!(5)),
            rate_amount: Some(dec!(300)),
            scope_of_work: vec![],
        });
        assert_eq!(
            check_completion(&session),
            Err(GateViolation::MissingScopeOfWork)
        );

        session.quotation.as_mut().unwrap().scope_of_work = vec![ScopeItem {
            description: "Strip and replace roof sheeting".into(),
        }];
        assert_eq!(check_completion(&session), Ok(()));
    }

    #[test]
    fn test_quotation_estimate_figures_must_be_positive() {
        let mut session = CompletionSession::new(Uuid::new_v4(), CompletionVariant::Quotation);
        session.evidence.expense_records = vec![slip(Some(dec!(100)))];
        session.quotation = Some(QuotationEstimate {
            num_people_needed: Some(dec!(0)),
            estimated_duration: Some(dec!(5)),
            rate_amount: Some(dec!(300)),
            scope_of_work: vec![ScopeItem {
                description: "Scope".into(),
            }],
        });
        assert_eq!(
            check_completion(&session),
            Err(GateViolation::PeopleNeededNotPositive)
        );
    }

    #[test]
    fn test_itemized_batch_all_or_nothing() {
        // One violating line rejects the whole batch, however many are clean
        let lines = vec![
            ItemizedBudgetLine {
                description: "Cement".into(),
                quoted_amount: dec!(1000),
                actual_spent: dec!(900),
                overspend_reason: None,
            },
            ItemizedBudgetLine {
                description: "Timber".into(),
                quoted_amount: dec!(500),
                actual_spent: dec!(650),
                overspend_reason: None,
            },
            ItemizedBudgetLine {
                description: "Paint".into(),
                quoted_amount: dec!(200),
                actual_spent: dec!(200),
                overspend_reason: None,
            },
        ];
        assert_eq!(
            check_itemized_lines(&lines),
            Err(GateViolation::MissingOverspendReason {
                description: "Timber".into()
            })
        );
    }

    #[test]
    fn test_itemized_overspend_with_reason_passes() {
        let lines = vec![ItemizedBudgetLine {
            description: "Timber".into(),
            quoted_amount: dec!(500),
            actual_spent: dec!(650),
            overspend_reason: Some("Supplier price increase on SA pine".into()),
        }];
        assert_eq!(check_itemized_lines(&lines), Ok(()));
    }

    #[test]
    fn test_itemized_blank_description_rejected() {
        let lines = vec![ItemizedBudgetLine {
            description: "  ".into(),
            quoted_amount: dec!(100),
            actual_spent: dec!(50),
            overspend_reason: None,
        }];
        assert_eq!(
            check_itemized_lines(&lines),
            Err(GateViolation::BlankBudgetLineDescription { line: 1 })
        );
    }

    #[test]
    fn test_spent_equal_to_quote_is_not_overspend() {
        let line = ItemizedBudgetLine {
            description: "Paint".into(),
            quoted_amount: dec!(200),
            actual_spent: dec!(200),
            overspend_reason: None,
        };
        assert!(!line.is_overspent());
        assert_eq!(check_itemized_lines(std::slice::from_ref(&line)), Ok(()));
    }
}
