//! ============================================================================
//! Monetary Aggregator - Material Cost & Payment Amount Derivation
//! ============================================================================
//! Pure money math for completion actions:
//! - Material cost from expense slips, with manual-override precedence
//! - Payment amount from the hourly/daily basis and the profile fallback rate
//! - Labour-cost estimation for the quotation sub-flow
//! All figures are full-precision Decimal; rounding happens only at display
//! edges via `round_display`.
//! ============================================================================

use rust_decimal::Decimal;

use crate::types::{ExpenseRecord, PaymentBasis};

/// Final material cost for a completion.
///
/// A positive manual override wins verbatim; otherwise the expense-slip
/// amounts are summed with missing amounts counted as zero. A non-positive
/// result is not an error here: the completion gate rejects it.
pub fn compute_material_cost(
    manual_override: Option<Decimal>,
    records: &[ExpenseRecord],
) -> Decimal {
    if let Some(override_amount) = manual_override {
        if override_amount > Decimal::ZERO {
            return override_amount;
        }
    }
    records
        .iter()
        .map(|r| r.amount.unwrap_or(Decimal::ZERO))
        .sum()
}

/// Whether the operator must confirm before proceeding: a positive manual
/// override silently ignores any slips that carry no amount, so those need
/// explicit consent. With no override in play, no prompt is required.
pub fn needs_unattributed_confirmation(
    manual_override: Option<Decimal>,
    records: &[ExpenseRecord],
) -> bool {
    let override_active = manual_override.is_some_and(|v| v > Decimal::ZERO);
    override_active && records.iter().any(|r| r.amount.is_none())
}

/// Payment-request amount: units worked times the effective rate.
///
/// An entered positive rate beats the profile fallback. Absent units mean
/// "not yet entered" and yield zero rather than an error.
pub fn compute_payment_amount(basis: &PaymentBasis, fallback_rate: Option<Decimal>) -> Decimal {
    let Some(units) = basis.units_worked() else {
        return Decimal::ZERO;
    };
    units * effective_rate(basis, fallback_rate)
}

/// The rate a payment amount is computed with: the entered rate when
/// positive, otherwise the profile fallback (or zero when neither is set)
pub fn effective_rate(basis: &PaymentBasis, fallback_rate: Option<Decimal>) -> Decimal {
    match basis.entered_rate() {
        Some(rate) if rate > Decimal::ZERO => rate,
        _ => fallback_rate.unwrap_or(Decimal::ZERO),
    }
}

/// Estimated labour cost for the quotation sub-flow: people x duration x rate,
/// each term defaulting to zero when absent
pub fn compute_estimated_labour_cost(
    num_people: Option<Decimal>,
    duration: Option<Decimal>,
    rate: Option<Decimal>,
) -> Decimal {
    num_people.unwrap_or(Decimal::ZERO)
        * duration.unwrap_or(Decimal::ZERO)
        * rate.unwrap_or(Decimal::ZERO)
}

/// Two-decimal rounding for display and notification text only: payloads
/// always carry the full-precision figure
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}
