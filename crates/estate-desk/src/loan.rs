//! Mortgage estimate shown next to property listings.

use serde::{Deserialize, Serialize};

const MAX_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: f64,
    /// Nominal yearly rate in percent, e.g. `6.5`.
    pub annual_rate_percent: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanQuote {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub payments: u32,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LoanError {
    #[error("loan amount must be greater than zero")]
    NonPositivePrincipal,
    #[error("interest rate cannot be negative")]
    NegativeRate,
    #[error("loan term must be between 1 and 50 years, got {0}")]
    InvalidTerm(u32),
    #[error("these terms do not produce a finite payment")]
    Unrepresentable,
}

impl LoanTerms {
    /// Fixed-rate amortized payment with monthly compounding.
    pub fn quote(&self) -> Result<LoanQuote, LoanError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(LoanError::NonPositivePrincipal);
        }
        if !self.annual_rate_percent.is_finite() || self.annual_rate_percent < 0.0 {
            return Err(LoanError::NegativeRate);
        }
        if self.years == 0 || self.years > MAX_TERM_YEARS {
            return Err(LoanError::InvalidTerm(self.years));
        }

        let payments = self.years * 12;
        let monthly_rate = self.annual_rate_percent / 100.0 / 12.0;

        let monthly = if monthly_rate == 0.0 {
            self.principal / f64::from(payments)
        } else {
            let growth = (1.0 + monthly_rate).powi(payments as i32);
            self.principal * monthly_rate * growth / (growth - 1.0)
        };

        if !monthly.is_finite() || !(monthly * f64::from(payments)).is_finite() {
            return Err(LoanError::Unrepresentable);
        }

        let monthly_payment = round_cents(monthly);
        let total_payment = round_cents(monthly * f64::from(payments));
        let total_interest = round_cents(total_payment - self.principal);

        Ok(LoanQuote {
            monthly_payment,
            total_payment,
            total_interest,
            payments,
        })
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
