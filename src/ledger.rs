use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::ScheduledInstallment;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::store::LoanStore;
use crate::types::{InstallmentId, InstallmentKind, InstallmentStatus, LoanId, PaymentMethod};

/// one persisted payment obligation within a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    /// 1-based ordering key
    pub number: u32,
    pub kind: InstallmentKind,
    pub due_date: NaiveDate,
    /// fixed when the schedule was generated
    pub amount: Money,
    pub paid_amount: Money,
    pub status: InstallmentStatus,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

impl Installment {
    pub fn new(loan_id: LoanId, number: u32, due_date: NaiveDate, amount: Money, kind: InstallmentKind) -> Self {
        let mut installment = Self {
            id: Uuid::new_v4(),
            loan_id,
            number,
            kind,
            due_date,
            amount,
            paid_amount: Money::ZERO,
            status: InstallmentStatus::Pending,
            payment_date: None,
            payment_method: None,
        };
        installment.status = installment.status_on(NaiveDate::MIN);
        installment
    }

    /// unpaid part of the obligation, never negative
    pub fn balance(&self) -> Money {
        (self.amount - self.paid_amount).clamp_non_negative()
    }

    pub fn is_paid(&self) -> bool {
        self.paid_amount >= self.amount
    }

    pub fn is_open(&self) -> bool {
        !self.is_paid()
    }

    /// status as a pure function of amounts, due date and `today`
    pub fn status_on(&self, today: NaiveDate) -> InstallmentStatus {
        if self.paid_amount >= self.amount {
            InstallmentStatus::Paid
        } else if self.paid_amount.is_positive() {
            InstallmentStatus::Partial
        } else if self.due_date < today {
            InstallmentStatus::Overdue
        } else {
            InstallmentStatus::Pending
        }
    }

    /// recompute the stored status for `today`
    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = self.status_on(today);
    }

    /// whole days past due on `today`, zero when not late or already paid
    pub fn days_late(&self, today: NaiveDate) -> i64 {
        if self.is_paid() {
            return 0;
        }
        (today - self.due_date).num_days().max(0)
    }
}

/// typed installment storage on top of a [`LoanStore`]
pub struct InstallmentLedger<'s, S: LoanStore> {
    store: &'s mut S,
}

impl<'s, S: LoanStore> InstallmentLedger<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// bulk insert one pending row per schedule entry
    pub fn create_schedule(
        &mut self,
        loan_id: LoanId,
        entries: &[ScheduledInstallment],
        kind: InstallmentKind,
    ) -> Result<Vec<Installment>> {
        if entries.is_empty() {
            return Err(LoanError::invalid("schedule has no installments"));
        }
        let existing = self.store.installments_for(loan_id)?;
        if existing.iter().any(|i| i.kind == kind) {
            return Err(LoanError::ScheduleAlreadyExists { loan_id });
        }

        // frozen balances are numbered after the original schedule
        let offset = existing.iter().map(|i| i.number).max().unwrap_or(0);
        let rows: Vec<Installment> = entries
            .iter()
            .map(|e| Installment::new(loan_id, offset + e.number, e.due_date, e.amount, kind))
            .collect();

        self.store.insert_installments(rows.clone())?;
        Ok(rows)
    }

    /// all installments of a loan ordered by number, statuses as of `today`
    pub fn get_installments(&self, loan_id: LoanId, today: NaiveDate) -> Result<Vec<Installment>> {
        let mut rows = self.store.installments_for(loan_id)?;
        rows.iter_mut().for_each(|i| i.refresh_status(today));
        Ok(rows)
    }

    /// installments that carry the loan's current obligation
    pub fn payable_installments(&self, loan: &Loan) -> Result<Vec<Installment>> {
        let kind = loan.payable_kind();
        Ok(self
            .store
            .installments_for(loan.id)?
            .into_iter()
            .filter(|i| i.kind == kind)
            .collect())
    }

    /// sum of unpaid balances of the payable installments
    pub fn outstanding_balance(&self, loan: &Loan) -> Result<Money> {
        Ok(self.payable_installments(loan)?.iter().map(|i| i.balance()).sum())
    }

    /// accumulate a payment on one installment
    ///
    /// The paid amount is capped at the installment amount; the allocator is
    /// responsible for never handing out more than the balance.
    pub fn record_payment(
        &mut self,
        installment_id: InstallmentId,
        amount: Money,
        method: PaymentMethod,
        date: NaiveDate,
    ) -> Result<Installment> {
        if !amount.is_positive() {
            return Err(LoanError::invalid(format!("payment amount must be positive: {}", amount)));
        }
        let mut installment = self
            .store
            .get_installment(installment_id)?
            .ok_or(LoanError::InstallmentNotFound { id: installment_id })?;

        installment.paid_amount = (installment.paid_amount + amount).min(installment.amount);
        installment.payment_date = Some(date);
        installment.payment_method = Some(method);
        installment.status = installment.status_on(date);

        self.store.update_installment(&installment)?;
        Ok(installment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::compute_schedule;
    use crate::decimal::Rate;
    use crate::store::InMemoryStore;
    use crate::types::{Frequency, ProductType, ScheduleParams};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_store() -> (InMemoryStore, Loan, Vec<ScheduledInstallment>) {
        let params = ScheduleParams::rapidiario(Frequency::Weekly);
        let schedule = compute_schedule(
            ProductType::Rapidiario,
            Money::from_major(1000),
            Rate::from_percentage(8),
            date(2025, 12, 2),
            params,
        )
        .unwrap();
        let loan = Loan::from_schedule(Uuid::new_v4(), &schedule, params);
        let mut store = InMemoryStore::new();
        store.insert_loan(loan.clone()).unwrap();
        (store, loan, schedule.installments)
    }

    #[test]
    fn test_status_is_pure_function() {
        let mut inst = Installment::new(Uuid::new_v4(), 1, date(2025, 12, 10), Money::from_major(100), InstallmentKind::Scheduled);

        assert_eq!(inst.status_on(date(2025, 12, 10)), InstallmentStatus::Pending);
        assert_eq!(inst.status_on(date(2025, 12, 11)), InstallmentStatus::Overdue);

        inst.paid_amount = Money::from_major(40);
        assert_eq!(inst.status_on(date(2025, 12, 11)), InstallmentStatus::Partial);
        assert_eq!(inst.balance(), Money::from_major(60));

        inst.paid_amount = Money::from_major(100);
        assert_eq!(inst.status_on(date(2026, 1, 1)), InstallmentStatus::Paid);
        assert_eq!(inst.days_late(date(2026, 1, 1)), 0);
    }

    #[test]
    fn test_create_schedule_is_guarded() {
        let (mut store, loan, entries) = seeded_store();
        let mut ledger = InstallmentLedger::new(&mut store);

        let rows = ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.status == InstallmentStatus::Pending && r.paid_amount.is_zero()));

        let err = ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap_err();
        assert_eq!(err, LoanError::ScheduleAlreadyExists { loan_id: loan.id });

        let listed = ledger.get_installments(loan.id, date(2025, 12, 2)).unwrap();
        let numbers: Vec<u32> = listed.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_listed_statuses_follow_the_date() {
        let (mut store, loan, entries) = seeded_store();
        let mut ledger = InstallmentLedger::new(&mut store);
        let rows = ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap();
        ledger
            .record_payment(rows[1].id, Money::from_major(100), PaymentMethod::Cash, date(2025, 12, 12))
            .unwrap();

        // cuotas fall on dec 9, 16, 23 and 30
        let statuses: Vec<InstallmentStatus> = ledger
            .get_installments(loan.id, date(2025, 12, 20))
            .unwrap()
            .iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                InstallmentStatus::Overdue,
                InstallmentStatus::Partial,
                InstallmentStatus::Pending,
                InstallmentStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_frozen_balance_numbered_after_schedule() {
        let (mut store, loan, entries) = seeded_store();
        let mut ledger = InstallmentLedger::new(&mut store);
        ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap();

        let lump = ScheduledInstallment {
            number: 1,
            due_date: date(2026, 1, 5),
            amount: Money::from_major(1134),
        };
        let rows = ledger.create_schedule(loan.id, &[lump], InstallmentKind::FrozenBalance).unwrap();
        assert_eq!(rows[0].number, 5);
    }

    #[test]
    fn test_record_payment_accumulates_and_caps() {
        let (mut store, loan, entries) = seeded_store();
        let mut ledger = InstallmentLedger::new(&mut store);
        let rows = ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap();
        let first = &rows[0];

        let updated = ledger
            .record_payment(first.id, Money::from_major(100), PaymentMethod::Cash, date(2025, 12, 9))
            .unwrap();
        assert_eq!(updated.status, InstallmentStatus::Partial);
        assert_eq!(updated.payment_date, Some(date(2025, 12, 9)));

        let updated = ledger
            .record_payment(first.id, Money::from_major(1000), PaymentMethod::Transfer, date(2025, 12, 10))
            .unwrap();
        assert_eq!(updated.paid_amount, updated.amount);
        assert_eq!(updated.status, InstallmentStatus::Paid);
        assert_eq!(updated.payment_method, Some(PaymentMethod::Transfer));

        let err = ledger
            .record_payment(Uuid::new_v4(), Money::ONE, PaymentMethod::Cash, date(2025, 12, 10))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = ledger
            .record_payment(first.id, Money::ZERO, PaymentMethod::Cash, date(2025, 12, 10))
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidArgument { .. }));
    }

    #[test]
    fn test_outstanding_balance() {
        let (mut store, loan, entries) = seeded_store();
        let mut ledger = InstallmentLedger::new(&mut store);
        let rows = ledger.create_schedule(loan.id, &entries, InstallmentKind::Scheduled).unwrap();
        assert_eq!(ledger.outstanding_balance(&loan).unwrap(), Money::from_major(1080));

        ledger
            .record_payment(rows[0].id, Money::from_major(270), PaymentMethod::Cash, date(2025, 12, 9))
            .unwrap();
        assert_eq!(ledger.outstanding_balance(&loan).unwrap(), Money::from_major(810));
    }
}
