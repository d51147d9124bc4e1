use chrono::{Duration, NaiveDate};

use crate::calendar;
use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{Frequency, ProductType};

use super::{spread_with_remainder, Schedule, ScheduleDetail, ScheduledInstallment};

/// 30-day rapidiario schedule with daily or weekly cuotas
pub fn schedule(
    policy: &LoanPolicy,
    principal: Money,
    rate: Rate,
    start_date: NaiveDate,
    frequency: Frequency,
) -> Result<Schedule> {
    let rules = &policy.rapidiario;

    let total_interest = principal.percentage(rate);
    let total_payable = principal + total_interest;
    let due_date = start_date + Duration::days(rules.term_days as i64);

    let due_dates: Vec<NaiveDate> = match frequency {
        Frequency::Daily => calendar::working_days_after(start_date, rules.term_days, rules.rest_day),
        Frequency::Weekly => (1..=rules.weekly_installments)
            .map(|k| start_date + Duration::days((k * rules.weekly_interval_days) as i64))
            .collect(),
    };
    if due_dates.is_empty() {
        return Err(LoanError::invalid("rapidiario term holds no collection days"));
    }

    let amounts = spread_with_remainder(total_payable, due_dates.len() as u32, policy.cash_rounding_step);
    let installments = due_dates
        .iter()
        .zip(amounts)
        .enumerate()
        .map(|(i, (due, amount))| ScheduledInstallment {
            number: i as u32 + 1,
            due_date: *due,
            amount,
        })
        .collect();

    let working_days = calendar::count_working_days(start_date, rules.term_days, rules.rest_day);

    Ok(Schedule {
        product: ProductType::Rapidiario,
        principal,
        rate,
        start_date,
        due_date,
        total_interest,
        total_payable,
        installments,
        detail: ScheduleDetail::Rapidiario {
            frequency,
            working_days,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_schedule_reference_loan() {
        let policy = LoanPolicy::default();
        let start = date(2025, 12, 2);
        let schedule = schedule(&policy, Money::from_major(1000), Rate::from_percentage(5), start, Frequency::Daily).unwrap();

        assert_eq!(schedule.total_interest, Money::from_major(50));
        assert_eq!(schedule.total_payable, Money::from_major(1050));
        assert_eq!(schedule.due_date, date(2026, 1, 1));
        assert_eq!(schedule.installments.len(), 26);
        assert_eq!(
            schedule.detail,
            ScheduleDetail::Rapidiario {
                frequency: Frequency::Daily,
                working_days: 26
            }
        );

        assert_eq!(schedule.installments[0].amount, Money::from_str_exact("40.40").unwrap());
        assert_eq!(schedule.installments[25].amount, Money::from_str_exact("40.00").unwrap());
        assert_eq!(schedule.scheduled_total(), Money::from_major(1050));

        assert!(schedule.installments.iter().all(|i| i.due_date.weekday() != Weekday::Sun));
        assert_eq!(schedule.installments[0].due_date, date(2025, 12, 3));
        let numbers: Vec<u32> = schedule.installments.iter().map(|i| i.number).collect();
        assert_eq!(numbers, (1..=26).collect::<Vec<_>>());
    }

    #[test]
    fn test_daily_count_depends_on_start() {
        let policy = LoanPolicy::default();
        let schedule = schedule(&policy, Money::from_major(1000), Rate::from_percentage(5), date(2025, 12, 5), Frequency::Daily).unwrap();
        assert_eq!(schedule.installments.len(), 25);
        // 1050 / 25 divides evenly
        assert!(schedule.installments.iter().all(|i| i.amount == Money::from_major(42)));
    }

    #[test]
    fn test_weekly_schedule() {
        let policy = LoanPolicy::default();
        let start = date(2025, 12, 2);
        let schedule = schedule(&policy, Money::from_major(1000), Rate::from_percentage(7), start, Frequency::Weekly).unwrap();

        assert_eq!(schedule.total_payable, Money::from_major(1070));
        let dates: Vec<NaiveDate> = schedule.installments.iter().map(|i| i.due_date).collect();
        assert_eq!(dates, vec![date(2025, 12, 9), date(2025, 12, 16), date(2025, 12, 23), date(2025, 12, 30)]);
        let amounts: Vec<Money> = schedule.installments.iter().map(|i| i.amount).collect();
        assert_eq!(
            amounts,
            vec![
                Money::from_str_exact("267.50").unwrap(),
                Money::from_str_exact("267.50").unwrap(),
                Money::from_str_exact("267.50").unwrap(),
                Money::from_str_exact("267.50").unwrap(),
            ]
        );
        assert_eq!(schedule.due_date, date(2026, 1, 1));
    }

    #[test]
    fn test_fractional_cent_rate() {
        let policy = LoanPolicy::default();
        let schedule = schedule(
            &policy,
            Money::from_str_exact("333.33").unwrap(),
            Rate::from_percentage(7),
            date(2025, 12, 2),
            Frequency::Weekly,
        )
        .unwrap();
        // 333.33 * 7% = 23.3331 -> 23.33
        assert_eq!(schedule.total_payable, Money::from_str_exact("356.66").unwrap());
        // 89.165 rounds up to 89.20; last absorbs 356.66 - 267.60
        assert_eq!(schedule.installments[0].amount, Money::from_str_exact("89.20").unwrap());
        assert_eq!(schedule.installments[3].amount, Money::from_str_exact("89.06").unwrap());
        assert_eq!(schedule.scheduled_total(), schedule.total_payable);
    }
}
