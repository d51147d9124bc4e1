/// rapidiario - daily cuotas and the cascading payment allocation
use chrono::{Duration, TimeZone, Utc};
use microcredit_rs::{
    Frequency, InMemoryStore, LoanManager, Money, PaymentMethod, ProductType, Rate,
    SafeTimeProvider, ScheduleParams, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== rapidiario example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 12, 2, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let mut manager = LoanManager::with_default_policy(InMemoryStore::new(), &time);

    // preview the schedule before committing to it
    let params = ScheduleParams::rapidiario(Frequency::Daily);
    let today = manager.today();
    let schedule = manager.compute_schedule(
        ProductType::Rapidiario,
        Money::from_major(1000),
        Rate::from_percentage(5),
        today,
        params,
    )?;
    println!(
        "{} cuotas, total payable {}, due {}",
        schedule.installment_count(),
        schedule.total_payable,
        schedule.due_date
    );

    let client = manager.register_client("Rosa Quispe", "44556677")?;
    let loan_id = manager.originate_loan(
        client,
        ProductType::Rapidiario,
        Money::from_major(1000),
        Rate::from_percentage(5),
        today,
        params,
    )?;
    println!("loan originated on {}", today);

    // skip two days, then pay on the third
    controller.advance(Duration::days(3));
    println!("\nadvanced to: {}", time.now().format("%Y-%m-%d"));
    println!("overdue cuotas: {}", manager.overdue_installments(loan_id)?.len());

    let result = manager.apply_payment_today(loan_id, Money::from_major(150), PaymentMethod::Cash)?;
    for applied in &result.installments_affected {
        println!(
            "  cuota {:>2}: paid {} -> {:?}, balance {}",
            applied.number, applied.amount, applied.status_after, applied.balance_after
        );
    }
    println!("remaining balance: {}", result.remaining_balance);

    // settle everything at once
    let remaining = manager.outstanding_balance(loan_id)?;
    let result = manager.apply_payment_today(loan_id, remaining, PaymentMethod::Transfer)?;
    println!("\nloan paid: {}", result.loan_now_paid);

    println!("\nfinal state:");
    println!("{}", manager.loan_view(loan_id)?.to_json_pretty()?);

    Ok(())
}
