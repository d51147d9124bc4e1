use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::Installment;
use crate::types::{InstallmentId, ProductType};

/// order in which a payment is spread over open installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationOrder {
    /// overdue oldest first, then today's cuota, then the schedule tail backwards
    Cascading,
    /// earliest unpaid installment first
    Chronological,
}

impl AllocationOrder {
    pub fn for_product(product: ProductType) -> Self {
        match product {
            ProductType::Rapidiario => AllocationOrder::Cascading,
            ProductType::PawnSecured | ProductType::BankInstallment => AllocationOrder::Chronological,
        }
    }
}

/// "apply `amount` to installment `installment_id`"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationInstruction {
    pub installment_id: InstallmentId,
    pub number: u32,
    pub amount: Money,
}

/// decision produced by [`allocate`], executed later against the ledger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Allocation {
    pub instructions: Vec<AllocationInstruction>,
    pub applied: Money,
    /// part of the payment beyond every open balance
    pub unapplied: Money,
}

impl Allocation {
    /// true when the allocation clears `outstanding` completely
    pub fn is_full_payoff(&self, outstanding: Money) -> bool {
        self.applied >= outstanding
    }

    pub fn touched(&self, installment_id: InstallmentId) -> Option<Money> {
        self.instructions
            .iter()
            .find(|i| i.installment_id == installment_id)
            .map(|i| i.amount)
    }
}

/// spread `amount` over the open installments in `order`
///
/// Pure: reads the installments, never mutates them.
pub fn allocate(order: AllocationOrder, installments: &[Installment], amount: Money, today: NaiveDate) -> Allocation {
    let mut open: Vec<&Installment> = installments.iter().filter(|i| i.is_open()).collect();
    open.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.number.cmp(&b.number)));

    let sequence: Vec<&Installment> = match order {
        AllocationOrder::Chronological => open,
        AllocationOrder::Cascading => cascading_sequence(open, today),
    };

    let mut remaining = amount.clamp_non_negative();
    let mut allocation = Allocation::default();
    for installment in sequence {
        if !remaining.is_positive() {
            break;
        }
        let portion = remaining.min(installment.balance());
        if !portion.is_positive() {
            continue;
        }
        remaining -= portion;
        allocation.applied += portion;
        allocation.instructions.push(AllocationInstruction {
            installment_id: installment.id,
            number: installment.number,
            amount: portion,
        });
    }
    allocation.unapplied = remaining;
    allocation
}

/// overdue ascending, then at most one due today, then future descending
fn cascading_sequence(open: Vec<&Installment>, today: NaiveDate) -> Vec<&Installment> {
    let (mut overdue, mut due_today, mut future) = (Vec::new(), Vec::new(), Vec::new());
    for installment in open {
        if installment.due_date < today {
            overdue.push(installment);
        } else if installment.due_date == today {
            due_today.push(installment);
        } else {
            future.push(installment);
        }
    }

    // a second cuota sharing today's date is treated as the schedule tail
    let mut extra_today = due_today.split_off(due_today.len().min(1));
    extra_today.append(&mut future);
    let mut future = extra_today;
    future.reverse();

    overdue.into_iter().chain(due_today).chain(future).collect()
}
