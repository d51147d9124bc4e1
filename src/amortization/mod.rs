pub mod bank;
pub mod pawn;
pub mod rapidiario;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{Frequency, ProductType, ScheduleParams};

/// one row of a computed schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// product-specific schedule metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleDetail {
    Rapidiario {
        frequency: Frequency,
        working_days: u32,
    },
    PawnSecured,
    BankInstallment {
        months: u32,
        /// principal / months, unrounded
        capital_per_installment: Decimal,
        monthly_interest: Decimal,
    },
}

/// calculator output, not persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub product: ProductType,
    pub principal: Money,
    pub rate: Rate,
    pub start_date: NaiveDate,
    /// nominal maturity
    pub due_date: NaiveDate,
    pub total_interest: Money,
    pub total_payable: Money,
    pub installments: Vec<ScheduledInstallment>,
    pub detail: ScheduleDetail,
}

impl Schedule {
    pub fn installment_count(&self) -> usize {
        self.installments.len()
    }

    pub fn scheduled_total(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    pub fn get_installment(&self, number: u32) -> Option<&ScheduledInstallment> {
        self.installments.iter().find(|i| i.number == number)
    }
}

/// amortization calculator for the three loan products
pub struct ScheduleCalculator<'p> {
    policy: &'p LoanPolicy,
}

impl<'p> ScheduleCalculator<'p> {
    pub fn new(policy: &'p LoanPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        self.policy
    }

    /// compute the schedule for a product
    pub fn compute_schedule(
        &self,
        product: ProductType,
        principal: Money,
        rate: Rate,
        start_date: NaiveDate,
        params: ScheduleParams,
    ) -> Result<Schedule> {
        validate_amounts(principal, rate)?;

        match product {
            ProductType::Rapidiario => {
                if params.months.is_some() {
                    return Err(LoanError::invalid("rapidiario loans do not take a month count"));
                }
                let frequency = params
                    .frequency
                    .ok_or_else(|| LoanError::invalid("rapidiario loans require a frequency"))?;
                rapidiario::schedule(self.policy, principal, rate, start_date, frequency)
            }
            ProductType::PawnSecured => {
                if params.frequency.is_some() || params.months.is_some() {
                    return Err(LoanError::invalid("pawn loans take no schedule parameters"));
                }
                pawn::schedule(self.policy, principal, rate, start_date)
            }
            ProductType::BankInstallment => {
                if params.frequency.is_some() {
                    return Err(LoanError::invalid("bank installment loans do not take a frequency"));
                }
                let months = params
                    .months
                    .ok_or_else(|| LoanError::invalid("bank installment loans require a month count"))?;
                if months == 0 {
                    return Err(LoanError::invalid("month count must be positive"));
                }
                bank::schedule(self.policy, principal, rate, start_date, months)
            }
        }
    }
}

/// compute a schedule under the default policy
pub fn compute_schedule(
    product: ProductType,
    principal: Money,
    rate: Rate,
    start_date: NaiveDate,
    params: ScheduleParams,
) -> Result<Schedule> {
    let policy = LoanPolicy::default();
    ScheduleCalculator::new(&policy).compute_schedule(product, principal, rate, start_date, params)
}

fn validate_amounts(principal: Money, rate: Rate) -> Result<()> {
    if principal.is_negative() {
        return Err(LoanError::invalid(format!("principal must not be negative: {}", principal)));
    }
    if principal.is_zero() {
        return Err(LoanError::invalid("principal must be positive"));
    }
    if rate.is_negative() {
        return Err(LoanError::invalid(format!("interest rate must not be negative: {}", rate)));
    }
    Ok(())
}

/// split `total` into `count` amounts rounded up to `step`
///
/// The last amount absorbs the remainder so the amounts sum to `total`. When
/// the rounded share would overshoot, later amounts are capped at what is
/// left and never go negative.
pub fn spread_with_remainder(total: Money, count: u32, step: Money) -> Vec<Money> {
    if count == 0 {
        return Vec::new();
    }
    let share = Money::round_up_to(total.as_decimal() / Decimal::from(count), step);

    let mut remaining = total;
    let mut amounts = Vec::with_capacity(count as usize);
    for n in 1..=count {
        let amount = if n == count { remaining } else { share.min(remaining) };
        remaining -= amount;
        amounts.push(amount);
    }
    amounts
}
