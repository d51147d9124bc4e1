use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::Schedule;
use crate::calendar;
use crate::decimal::{Money, Rate};
use crate::types::{ClientId, InstallmentKind, LoanId, LoanStatus, ProductType, ScheduleParams};

/// borrower record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub document_id: String,
}

impl Client {
    pub fn new(name: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            document_id: document_id.into(),
        }
    }
}

/// a credit extended to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    // identification
    pub id: LoanId,
    pub client_id: ClientId,
    pub product: ProductType,
    pub params: ScheduleParams,

    // terms
    pub principal: Money,
    pub interest_rate: Rate,
    pub total_payable: Money,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,

    // status
    pub status: LoanStatus,
    /// stamped when the loan reaches a terminal state
    pub end_date: Option<NaiveDate>,

    // refinance chain
    pub refinance_count: u32,
    pub parent_loan_id: Option<LoanId>,

    // freeze
    pub frozen_amount: Option<Money>,
    pub admin_fee: Option<Money>,
    pub frozen_date: Option<NaiveDate>,

    // liquidation
    pub sale_price: Option<Money>,
    pub sales_expense: Option<Money>,

    /// optimistic concurrency counter, bumped by the store on every update
    pub version: u64,
}

impl Loan {
    /// build an active loan from a computed schedule
    pub fn from_schedule(client_id: ClientId, schedule: &Schedule, params: ScheduleParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            product: schedule.product,
            params,
            principal: schedule.principal,
            interest_rate: schedule.rate,
            total_payable: schedule.total_payable,
            start_date: schedule.start_date,
            due_date: schedule.due_date,
            status: LoanStatus::Active,
            end_date: None,
            refinance_count: 0,
            parent_loan_id: None,
            frozen_amount: None,
            admin_fee: None,
            frozen_date: None,
            sale_price: None,
            sales_expense: None,
            version: 0,
        }
    }

    /// installments that currently carry this loan's obligation
    ///
    /// Keyed on the freeze date, which outlives `frozen_amount` once the
    /// frozen balance is paid off.
    pub fn payable_kind(&self) -> InstallmentKind {
        if self.frozen_date.is_some() {
            InstallmentKind::FrozenBalance
        } else {
            InstallmentKind::Scheduled
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_refinanced_loan(&self) -> bool {
        self.parent_loan_id.is_some()
    }

    /// days elapsed from start to `today`
    pub fn days_since_start(&self, today: NaiveDate) -> i64 {
        calendar::days_between(self.start_date, today)
    }
}
