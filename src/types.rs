use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LoanError;

/// unique identifier for a loan
pub type LoanId = Uuid;
/// unique identifier for an installment row
pub type InstallmentId = Uuid;
/// unique identifier for a client
pub type ClientId = Uuid;
/// unique identifier for a cash transaction
pub type TransactionId = Uuid;

/// loan products offered at the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// empeño: collateral-backed, single balloon payment after one month
    PawnSecured,
    /// bancario: multi-month installments with flat monthly interest
    BankInstallment,
    /// 30-day unsecured loan paid in daily or weekly cuotas
    Rapidiario,
}

impl ProductType {
    /// products backed by a physical collateral item
    pub fn is_secured(&self) -> bool {
        matches!(self, ProductType::PawnSecured | ProductType::BankInstallment)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductType::PawnSecured => "pawn_secured",
            ProductType::BankInstallment => "bank_installment",
            ProductType::Rapidiario => "rapidiario",
        };
        f.write_str(name)
    }
}

impl FromStr for ProductType {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pawn_secured" | "pawn" | "empeño" | "empeno" => Ok(ProductType::PawnSecured),
            "bank_installment" | "bank" | "bancario" => Ok(ProductType::BankInstallment),
            "rapidiario" => Ok(ProductType::Rapidiario),
            other => Err(LoanError::invalid(format!("unknown product type '{}'", other))),
        }
    }
}

/// cuota frequency for rapidiario loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
}

impl FromStr for Frequency {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "diario" => Ok(Frequency::Daily),
            "weekly" | "semanal" => Ok(Frequency::Weekly),
            other => Err(LoanError::invalid(format!("unknown frequency '{}'", other))),
        }
    }
}

/// product-specific schedule parameters
///
/// Only the fields relevant to the product may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub frequency: Option<Frequency>,
    pub months: Option<u32>,
}

impl ScheduleParams {
    pub fn rapidiario(frequency: Frequency) -> Self {
        Self {
            frequency: Some(frequency),
            months: None,
        }
    }

    pub fn bank_installment(months: u32) -> Self {
        Self {
            frequency: None,
            months: Some(months),
        }
    }

    pub fn pawn_secured() -> Self {
        Self::default()
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// performing, within term
    Active,
    /// past due date with balance outstanding
    Overdue,
    /// converted to a single lump-sum obligation
    Frozen,
    /// collateral sold
    Liquidated,
    /// fully paid off
    Paid,
    /// closed into a new loan
    Refinanced,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoanStatus::Liquidated | LoanStatus::Paid | LoanStatus::Refinanced
        )
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

/// origin of an installment row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentKind {
    /// generated from the amortization schedule
    Scheduled,
    /// single lump sum created when the loan was frozen
    FrozenBalance,
}

/// how a payment was tendered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Other(String),
}

impl FromStr for PaymentMethod {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LoanError::invalid("payment method is empty"));
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "cash" | "efectivo" => PaymentMethod::Cash,
            "transfer" | "transferencia" => PaymentMethod::Transfer,
            "card" | "tarjeta" => PaymentMethod::Card,
            _ => PaymentMethod::Other(trimmed.to_string()),
        })
    }
}

/// direction of a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashDirection {
    Incoming,
    Outgoing,
}

/// business reason for a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Disbursement,
    InstallmentPayment,
    CollateralSale,
    SaleExpense,
    ClientRefund,
}

impl TransactionKind {
    pub fn direction(&self) -> CashDirection {
        match self {
            TransactionKind::InstallmentPayment | TransactionKind::CollateralSale => {
                CashDirection::Incoming
            }
            TransactionKind::Disbursement
            | TransactionKind::SaleExpense
            | TransactionKind::ClientRefund => CashDirection::Outgoing,
        }
    }
}

/// cash movement recorded for the cash-register session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashTransaction {
    pub id: TransactionId,
    pub loan_id: LoanId,
    pub kind: TransactionKind,
    pub direction: CashDirection,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: Option<PaymentMethod>,
}

impl CashTransaction {
    pub fn new(loan_id: LoanId, kind: TransactionKind, amount: Money, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            kind,
            direction: kind.direction(),
            amount,
            date,
            method: None,
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// signed amount from the register's point of view
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            CashDirection::Incoming => self.amount,
            CashDirection::Outgoing => -self.amount,
        }
    }
}
