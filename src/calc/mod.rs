//! Loan arithmetic: annuity payment and the derived result triple.
//!
//! Everything here is pure. Inputs are expected to be clamped upstream by the
//! form synchronizer, so nothing in this module can fail.

pub mod format;

use serde::{Deserialize, Serialize};

/// Fixed annual interest rate offered by the widget (percent)
pub const ANNUAL_INTEREST_RATE: f64 = 5.5;

/// Raw loan inputs as entered in the form (effective, clamped values)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInputs {
    pub loan_amount: f64,
    pub subsidy_percent: f64,
    pub down_payment: f64,
    pub duration_years: u32,
}

impl Default for LoanInputs {
    fn default() -> Self {
        Self {
            loan_amount: 25_000.0,
            subsidy_percent: 20.0,
            down_payment: 5_000.0,
            duration_years: 1,
        }
    }
}

/// Values derived from [`LoanInputs`]; rebuilt on every change, never stored on its own
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoanResult {
    pub financed_principal: f64,
    pub subsidy_amount: f64,
    pub monthly_payment: f64,
    pub duration_years: u32,
}

impl LoanResult {
    /// Sum of all scheduled payments
    pub fn total_repayment(&self) -> f64 {
        total_repayment(self.monthly_payment, self.duration_years)
    }

    /// Interest paid over the whole term
    pub fn total_interest(&self) -> f64 {
        (self.total_repayment() - self.financed_principal).max(0.0)
    }
}

/// Monthly payment for a fully amortizing loan.
///
/// `annual_rate_percent` is a percentage (5.5 means 5.5%). Term is in whole years
/// and converted to monthly periods. A non-positive principal or a zero term
/// yields 0. With a zero rate the principal is repaid in equal parts.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    if !principal.is_finite() || principal <= 0.0 || term_years == 0 {
        return 0.0;
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let number_of_payments = f64::from(term_years) * 12.0;

    if monthly_rate == 0.0 {
        return principal / number_of_payments;
    }

    let growth = (1.0 + monthly_rate).powf(number_of_payments);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Total paid over `term_years` at `payment` per month
pub fn total_repayment(payment: f64, term_years: u32) -> f64 {
    payment * f64::from(term_years) * 12.0
}

/// Derive subsidy, financed principal and monthly payment from the inputs
pub fn compute_result(inputs: &LoanInputs, annual_rate_percent: f64) -> LoanResult {
    let subsidy_amount = inputs.loan_amount * (inputs.subsidy_percent / 100.0);

    // Never finance a negative amount, even if subsidy + down payment exceed the loan
    let financed_principal = (inputs.loan_amount - subsidy_amount - inputs.down_payment).max(0.0);

    let monthly_payment = monthly_payment(financed_principal, annual_rate_percent, inputs.duration_years);

    LoanResult {
        financed_principal,
        subsidy_amount,
        monthly_payment,
        duration_years: inputs.duration_years,
    }
}
