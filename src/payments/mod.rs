pub mod allocator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{InstallmentId, InstallmentStatus, LoanId, PaymentMethod};

pub use allocator::{allocate, Allocation, AllocationInstruction, AllocationOrder};

/// payment request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
}

impl PaymentRequest {
    pub fn new(loan_id: LoanId, amount: Money, method: PaymentMethod, date: NaiveDate) -> Self {
        Self {
            loan_id,
            amount,
            method,
            date,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(LoanError::invalid(format!(
                "payment amount must be positive: {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// what one instruction did to an installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedInstallment {
    pub installment_id: InstallmentId,
    pub number: u32,
    pub amount: Money,
    pub status_after: InstallmentStatus,
    pub balance_after: Money,
}

/// payment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub loan_id: LoanId,
    pub amount_received: Money,
    pub applied: Money,
    /// excess over the loan balance, kept and not refunded
    pub unapplied: Money,
    pub installments_affected: Vec<AppliedInstallment>,
    pub loan_now_paid: bool,
    pub remaining_balance: Money,
    pub payment_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_payment_request_validation() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let loan_id = Uuid::new_v4();

        assert!(PaymentRequest::new(loan_id, Money::ZERO, PaymentMethod::Cash, date).validate().is_err());
        assert!(PaymentRequest::new(loan_id, Money::from_major(-5), PaymentMethod::Cash, date).validate().is_err());
        assert!(PaymentRequest::new(loan_id, Money::from_cents(10), PaymentMethod::Cash, date).validate().is_ok());
    }
}
