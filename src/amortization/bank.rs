use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar;
use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::types::ProductType;

use super::{Schedule, ScheduleDetail, ScheduledInstallment};

/// monthly installments with flat interest on the original principal
///
/// Interest does not decline with the balance: every month charges
/// `principal * rate`.
pub fn schedule(
    policy: &LoanPolicy,
    principal: Money,
    rate: Rate,
    start_date: NaiveDate,
    months: u32,
) -> Result<Schedule> {
    let capital_per_installment = principal.as_decimal() / Decimal::from(months);
    let monthly_interest = principal.as_decimal() * rate.as_decimal();

    let total_interest = Money::from_decimal(monthly_interest * Decimal::from(months));
    let total_payable = principal + total_interest;

    let installment_amount = Money::round_up_to(
        capital_per_installment + monthly_interest,
        policy.cash_rounding_step,
    );

    let mut installments = Vec::with_capacity(months as usize);
    let mut remaining = total_payable;
    for n in 1..=months {
        let due_date = calendar::add_months(start_date, n)?;
        let amount = if n == months {
            remaining
        } else {
            installment_amount.min(remaining)
        };
        remaining -= amount;
        installments.push(ScheduledInstallment {
            number: n,
            due_date,
            amount,
        });
    }

    let due_date = installments
        .last()
        .map(|i| i.due_date)
        .unwrap_or(start_date);

    Ok(Schedule {
        product: ProductType::BankInstallment,
        principal,
        rate,
        start_date,
        due_date,
        total_interest,
        total_payable,
        installments,
        detail: ScheduleDetail::BankInstallment {
            months,
            capital_per_installment,
            monthly_interest,
        },
    })
}
