use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{ClientId, InstallmentKind, LoanId, LoanStatus, PaymentMethod, ProductType};

/// all events that can be emitted by the loan manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        client_id: ClientId,
        product: ProductType,
        principal: Money,
        total_payable: Money,
        timestamp: DateTime<Utc>,
    },
    ScheduleCreated {
        loan_id: LoanId,
        kind: InstallmentKind,
        installment_count: usize,
        total: Money,
    },
    LoanPaid {
        loan_id: LoanId,
        final_payment: Money,
        end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        amount: Money,
        applied: Money,
        unapplied: Money,
        method: PaymentMethod,
        payment_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InstallmentSettled {
        loan_id: LoanId,
        number: u32,
        amount: Money,
        payment_date: NaiveDate,
    },

    // delinquency events
    LoanRefinanced {
        old_loan_id: LoanId,
        new_loan_id: LoanId,
        carried_balance: Money,
        new_rate: Rate,
        refinance_count: u32,
        timestamp: DateTime<Utc>,
    },
    LoanFrozen {
        loan_id: LoanId,
        total_debt: Money,
        admin_fee: Money,
        frozen_amount: Money,
        automatic: bool,
        timestamp: DateTime<Utc>,
    },
    LoanLiquidated {
        loan_id: LoanId,
        debt: Money,
        sale_price: Money,
        sales_expense: Money,
        refund_to_client: Money,
        deficiency: Money,
        timestamp: DateTime<Utc>,
    },
    SweepCompleted {
        evaluated: usize,
        frozen: Vec<LoanId>,
        sweep_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// append events gathered while a transaction was open
    pub fn extend(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
