use chrono::NaiveDate;

use crate::calendar;
use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::types::ProductType;

use super::{Schedule, ScheduleDetail, ScheduledInstallment};

/// single balloon payment one calendar month after start
pub fn schedule(policy: &LoanPolicy, principal: Money, rate: Rate, start_date: NaiveDate) -> Result<Schedule> {
    let due_date = calendar::add_months(start_date, 1)?;

    let raw_total = principal.as_decimal() + principal.as_decimal() * rate.as_decimal();
    let total_payable = Money::round_up_to(raw_total, policy.cash_rounding_step);
    let total_interest = total_payable - principal;

    Ok(Schedule {
        product: ProductType::PawnSecured,
        principal,
        rate,
        start_date,
        due_date,
        total_interest,
        total_payable,
        installments: vec![ScheduledInstallment {
            number: 1,
            due_date,
            amount: total_payable,
        }],
        detail: ScheduleDetail::PawnSecured,
    })
}
