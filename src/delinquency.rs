use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::LoanPolicy;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::types::{LoanStatus, ProductType};

/// status after the lazy active -> overdue check
pub fn effective_status(loan: &Loan, outstanding: Money, today: NaiveDate) -> LoanStatus {
    match loan.status {
        LoanStatus::Active if today > loan.due_date && outstanding.is_positive() => LoanStatus::Overdue,
        status => status,
    }
}

/// payments are accepted until the loan reaches a terminal state
pub fn ensure_can_accept_payment(loan: &Loan) -> Result<()> {
    match loan.status {
        LoanStatus::Paid => Err(LoanError::not_eligible("loan already paid")),
        LoanStatus::Refinanced => Err(LoanError::not_eligible("loan was refinanced")),
        LoanStatus::Liquidated => Err(LoanError::not_eligible("loan was liquidated")),
        LoanStatus::Active | LoanStatus::Overdue | LoanStatus::Frozen => Ok(()),
    }
}

pub fn ensure_can_refinance(loan: &Loan, status: LoanStatus, policy: &LoanPolicy) -> Result<()> {
    if loan.product != ProductType::Rapidiario {
        return Err(LoanError::not_eligible(format!(
            "only rapidiario loans can be refinanced, not {}",
            loan.product
        )));
    }
    if loan.refinance_count >= policy.rapidiario.refinance_cap {
        return Err(LoanError::not_eligible(format!(
            "refinance limit reached ({} of {})",
            loan.refinance_count, policy.rapidiario.refinance_cap
        )));
    }
    match status {
        LoanStatus::Active | LoanStatus::Overdue => Ok(()),
        other => Err(LoanError::not_eligible(format!(
            "loan in status {:?} cannot be refinanced",
            other
        ))),
    }
}

pub fn ensure_can_freeze(status: LoanStatus) -> Result<()> {
    match status {
        LoanStatus::Active | LoanStatus::Overdue => Ok(()),
        LoanStatus::Frozen => Err(LoanError::not_eligible("loan is already frozen")),
        other => Err(LoanError::not_eligible(format!(
            "loan in status {:?} cannot be frozen",
            other
        ))),
    }
}

/// only collateral-backed loans can be sold off
pub fn ensure_can_liquidate(loan: &Loan, status: LoanStatus) -> Result<()> {
    if !loan.product.is_secured() {
        return Err(LoanError::not_eligible(format!(
            "{} loans carry no collateral to liquidate",
            loan.product
        )));
    }
    match status {
        LoanStatus::Frozen | LoanStatus::Active | LoanStatus::Overdue => Ok(()),
        other => Err(LoanError::not_eligible(format!(
            "loan in status {:?} cannot be liquidated",
            other
        ))),
    }
}

/// amounts fixed when a loan is frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeTerms {
    pub total_debt: Money,
    pub admin_fee: Money,
    pub frozen_amount: Money,
}

impl FreezeTerms {
    /// rapidiario pays the freeze fee, secured products freeze at cost
    pub fn compute(
        product: ProductType,
        total_debt: Money,
        policy: &LoanPolicy,
        admin_fee_override: Option<Money>,
    ) -> Result<Self> {
        if !total_debt.is_positive() {
            return Err(LoanError::not_eligible("loan has no outstanding balance to freeze"));
        }
        let admin_fee = match admin_fee_override {
            Some(fee) if fee.is_negative() => {
                return Err(LoanError::invalid(format!("admin fee must not be negative: {}", fee)));
            }
            Some(fee) => fee,
            None => match product {
                ProductType::Rapidiario => total_debt.percentage(policy.rapidiario.freeze_fee_rate),
                ProductType::PawnSecured | ProductType::BankInstallment => Money::ZERO,
            },
        };
        Ok(Self {
            total_debt,
            admin_fee,
            frozen_amount: total_debt + admin_fee,
        })
    }
}

/// automatic freeze rule for one loan
pub fn is_sweep_candidate(
    loan: &Loan,
    status: LoanStatus,
    outstanding: Money,
    today: NaiveDate,
    policy: &LoanPolicy,
) -> bool {
    if !matches!(status, LoanStatus::Active | LoanStatus::Overdue) || !outstanding.is_positive() {
        return false;
    }
    let elapsed = loan.days_since_start(today);
    match loan.product {
        ProductType::Rapidiario => {
            loan.refinance_count >= policy.rapidiario.refinance_cap && today > loan.due_date
        }
        ProductType::PawnSecured => elapsed > policy.delinquency.pawn_freeze_after_days as i64,
        ProductType::BankInstallment => elapsed > policy.delinquency.bank_freeze_after_days as i64,
    }
}

/// proceeds of a collateral sale against the debt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationSettlement {
    pub debt: Money,
    pub sale_price: Money,
    pub sales_expense: Money,
    /// owed back to the client when the sale covers more than the debt
    pub refund_to_client: Money,
    /// debt left uncovered by the sale
    pub deficiency: Money,
}

impl LiquidationSettlement {
    pub fn compute(debt: Money, sale_price: Money, sales_expense: Money) -> Result<Self> {
        if sale_price.is_negative() {
            return Err(LoanError::invalid(format!("sale price must not be negative: {}", sale_price)));
        }
        if sales_expense.is_negative() {
            return Err(LoanError::invalid(format!(
                "sales expense must not be negative: {}",
                sales_expense
            )));
        }
        let net = sale_price - sales_expense - debt;
        Ok(Self {
            debt,
            sale_price,
            sales_expense,
            refund_to_client: net.clamp_non_negative(),
            deficiency: (-net).clamp_non_negative(),
        })
    }

    pub fn owes_refund(&self) -> bool {
        self.refund_to_client.is_positive()
    }
}
