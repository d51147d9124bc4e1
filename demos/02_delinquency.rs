/// delinquency - refinance, freeze sweep and collateral liquidation
use chrono::{Duration, TimeZone, Utc};
use microcredit_rs::{
    Event, Frequency, InMemoryStore, LoanManager, Money, ProductType, Rate, SafeTimeProvider,
    ScheduleParams, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== delinquency example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 12, 2, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let mut manager = LoanManager::with_default_policy(InMemoryStore::new(), &time);
    let client = manager.register_client("Lucia Rojas", "55667788")?;
    let start = manager.today();

    let pawn = manager.originate_loan(
        client,
        ProductType::PawnSecured,
        Money::from_major(1000),
        Rate::from_percentage(10),
        start,
        ScheduleParams::pawn_secured(),
    )?;
    let rapid = manager.originate_loan(
        client,
        ProductType::Rapidiario,
        Money::from_major(500),
        Rate::from_percentage(5),
        start,
        ScheduleParams::rapidiario(Frequency::Weekly),
    )?;

    // roll the rapidiario over until the refinance budget runs out
    let mut current = rapid;
    loop {
        match manager.refinance(current) {
            Ok(next) => {
                let loan = manager.loan(next)?;
                println!("refinanced into {} owing {}", next, loan.total_payable);
                current = next;
            }
            Err(err) => {
                println!("refinance refused: {}", err);
                break;
            }
        }
    }

    controller.advance(Duration::days(76));
    println!("\nadvanced to: {}", time.now().format("%Y-%m-%d"));
    let frozen = manager.run_delinquency_sweep()?;
    println!("sweep froze {} loan(s)", frozen);
    println!("pawn status: {:?}", manager.loan_status(pawn)?);
    println!("rapidiario status: {:?}", manager.loan_status(current)?);

    let settlement = manager.liquidate(pawn, Money::from_major(1500), Money::from_major(120))?;
    println!(
        "\ncollateral sold for {}, debt {}, refund to client {}",
        settlement.sale_price, settlement.debt, settlement.refund_to_client
    );

    println!("\nevents:");
    for event in manager.take_events() {
        if let Event::StatusChanged { loan_id, old_status, new_status, reason, .. } = event {
            println!("  {} {:?} -> {:?} ({})", loan_id, old_status, new_status, reason);
        }
    }

    Ok(())
}
