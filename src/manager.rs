use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::amortization::{Schedule, ScheduleCalculator, ScheduledInstallment};
use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::delinquency::{
    effective_status, ensure_can_accept_payment, ensure_can_freeze, ensure_can_liquidate,
    ensure_can_refinance, is_sweep_candidate, FreezeTerms, LiquidationSettlement,
};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{Installment, InstallmentLedger};
use crate::loan::{Client, Loan};
use crate::payments::{allocate, AllocationOrder, AppliedInstallment, PaymentRequest, PaymentResult};
use crate::store::LoanStore;
use crate::types::{
    CashTransaction, ClientId, InstallmentKind, LoanId, LoanStatus, PaymentMethod, ProductType,
    ScheduleParams, TransactionKind,
};
use crate::view::LoanView;

/// coordinates calculator, ledger, allocator and state machine over a store
///
/// Every mutating operation runs inside one `LoanStore::atomically` call, so a
/// failure leaves no partial writes. Events are only published once the
/// transaction has committed.
pub struct LoanManager<'t, S: LoanStore> {
    store: S,
    policy: LoanPolicy,
    time: &'t SafeTimeProvider,
    events: EventStore,
}

impl<'t, S: LoanStore> LoanManager<'t, S> {
    pub fn new(store: S, policy: LoanPolicy, time: &'t SafeTimeProvider) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            store,
            policy,
            time,
            events: EventStore::new(),
        })
    }

    pub fn with_default_policy(store: S, time: &'t SafeTimeProvider) -> Self {
        Self {
            store,
            policy: LoanPolicy::default(),
            time,
            events: EventStore::new(),
        }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// current business date from the injected clock
    pub fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    // ---- calculation ----

    pub fn compute_schedule(
        &self,
        product: ProductType,
        principal: Money,
        rate: Rate,
        start_date: NaiveDate,
        params: ScheduleParams,
    ) -> Result<Schedule> {
        ScheduleCalculator::new(&self.policy).compute_schedule(product, principal, rate, start_date, params)
    }

    // ---- origination ----

    pub fn register_client(&mut self, name: &str, document_id: &str) -> Result<ClientId> {
        if name.trim().is_empty() {
            return Err(LoanError::invalid("client name must not be empty"));
        }
        let client = Client::new(name.trim(), document_id.trim());
        let id = client.id;
        self.store.atomically(|store| store.insert_client(client))?;
        debug!(client_id = %id, "client registered");
        Ok(id)
    }

    /// create the loan row and its installments from the product's schedule
    pub fn originate_loan(
        &mut self,
        client_id: ClientId,
        product: ProductType,
        principal: Money,
        rate: Rate,
        start_date: NaiveDate,
        params: ScheduleParams,
    ) -> Result<LoanId> {
        if self.store.get_client(client_id)?.is_none() {
            return Err(LoanError::ClientNotFound { id: client_id });
        }
        let schedule = self.compute_schedule(product, principal, rate, start_date, params)?;
        let loan = Loan::from_schedule(client_id, &schedule, params);
        let loan_id = loan.id;
        let now = self.time.now();

        let events = self.store.atomically(|store| {
            let mut events = insert_with_schedule(store, loan, &schedule)?;
            let disbursement = CashTransaction::new(loan_id, TransactionKind::Disbursement, principal, start_date);
            store.insert_transaction(disbursement)?;
            events.insert(
                0,
                Event::LoanOriginated {
                    loan_id,
                    client_id,
                    product,
                    principal,
                    total_payable: schedule.total_payable,
                    timestamp: now,
                },
            );
            Ok(events)
        })?;
        self.events.extend(events);

        info!(
            loan_id = %loan_id,
            product = %product,
            principal = %principal,
            total_payable = %schedule.total_payable,
            installments = schedule.installment_count(),
            "loan originated"
        );
        Ok(loan_id)
    }

    // ---- payments ----

    /// allocate a payment over the loan's open installments
    pub fn apply_payment(
        &mut self,
        loan_id: LoanId,
        amount: Money,
        method: PaymentMethod,
        date: NaiveDate,
    ) -> Result<PaymentResult> {
        let request = PaymentRequest::new(loan_id, amount, method, date);
        request.validate()?;
        let mut loan = self.require_loan(loan_id)?;
        if let Err(err) = ensure_can_accept_payment(&loan) {
            warn!(loan_id = %loan_id, status = ?loan.status, "payment rejected");
            return Err(err);
        }
        let now = self.time.now();

        let (result, events) = self.store.atomically(|store| {
            let mut events = Vec::new();
            let mut ledger = InstallmentLedger::new(&mut *store);
            let payable = ledger.payable_installments(&loan)?;
            let outstanding: Money = payable.iter().map(|i| i.balance()).sum();

            let order = AllocationOrder::for_product(loan.product);
            let allocation = allocate(order, &payable, request.amount, request.date);
            debug!(
                loan_id = %loan_id,
                order = ?order,
                applied = %allocation.applied,
                unapplied = %allocation.unapplied,
                touched = allocation.instructions.len(),
                "payment allocated"
            );

            let mut affected = Vec::with_capacity(allocation.instructions.len());
            for instruction in &allocation.instructions {
                let updated = ledger.record_payment(
                    instruction.installment_id,
                    instruction.amount,
                    request.method.clone(),
                    request.date,
                )?;
                if updated.is_paid() {
                    events.push(Event::InstallmentSettled {
                        loan_id,
                        number: updated.number,
                        amount: updated.amount,
                        payment_date: request.date,
                    });
                }
                affected.push(AppliedInstallment {
                    installment_id: updated.id,
                    number: updated.number,
                    amount: instruction.amount,
                    status_after: updated.status,
                    balance_after: updated.balance(),
                });
            }

            let receipt = CashTransaction::new(loan_id, TransactionKind::InstallmentPayment, request.amount, request.date)
                .with_method(request.method.clone());
            store.insert_transaction(receipt)?;

            events.push(Event::PaymentReceived {
                loan_id,
                amount: request.amount,
                applied: allocation.applied,
                unapplied: allocation.unapplied,
                method: request.method.clone(),
                payment_date: request.date,
                timestamp: now,
            });

            let remaining = (outstanding - allocation.applied).clamp_non_negative();
            let loan_now_paid = allocation.is_full_payoff(outstanding);
            if loan_now_paid {
                let old_status = loan.status;
                loan.status = LoanStatus::Paid;
                loan.end_date = Some(request.date);
                // nothing is left frozen once the balance is settled
                loan.frozen_amount = None;
                store.update_loan(&mut loan)?;
                events.push(status_changed(loan_id, old_status, LoanStatus::Paid, "balance settled", now));
                events.push(Event::LoanPaid {
                    loan_id,
                    final_payment: request.amount,
                    end_date: request.date,
                    timestamp: now,
                });
            }

            let result = PaymentResult {
                loan_id,
                amount_received: request.amount,
                applied: allocation.applied,
                unapplied: allocation.unapplied,
                installments_affected: affected,
                loan_now_paid,
                remaining_balance: remaining,
                payment_date: request.date,
            };
            Ok((result, events))
        })?;
        self.events.extend(events);

        if result.loan_now_paid {
            info!(loan_id = %loan_id, final_payment = %result.amount_received, "loan paid off");
        }
        Ok(result)
    }

    /// [`apply_payment`](Self::apply_payment) dated with the clock's today
    pub fn apply_payment_today(&mut self, loan_id: LoanId, amount: Money, method: PaymentMethod) -> Result<PaymentResult> {
        let today = self.today();
        self.apply_payment(loan_id, amount, method, today)
    }

    // ---- delinquency ----

    /// evaluate the loan's status, persisting a lazy overdue transition
    pub fn loan_status(&mut self, loan_id: LoanId) -> Result<LoanStatus> {
        let today = self.today();
        let mut loan = self.require_loan(loan_id)?;
        let outstanding = InstallmentLedger::new(&mut self.store).outstanding_balance(&loan)?;
        let status = effective_status(&loan, outstanding, today);
        if status == loan.status {
            return Ok(status);
        }

        let now = self.time.now();
        let old_status = loan.status;
        loan.status = status;
        self.store.atomically(|store| store.update_loan(&mut loan))?;
        self.events
            .emit(status_changed(loan_id, old_status, status, "due date passed with balance", now));
        info!(loan_id = %loan_id, due_date = %loan.due_date, "loan is overdue");
        Ok(status)
    }

    /// close a rapidiario loan into a new one carrying its unpaid balance
    pub fn refinance(&mut self, loan_id: LoanId) -> Result<LoanId> {
        let today = self.today();
        let mut loan = self.require_loan(loan_id)?;
        let total_debt = InstallmentLedger::new(&mut self.store).outstanding_balance(&loan)?;
        let status = effective_status(&loan, total_debt, today);
        if let Err(err) = ensure_can_refinance(&loan, status, &self.policy) {
            warn!(loan_id = %loan_id, reason = err.reason().unwrap_or_default(), "refinance rejected");
            return Err(err);
        }
        if !total_debt.is_positive() {
            return Err(LoanError::not_eligible("loan has no outstanding balance to refinance"));
        }

        let rate = self.policy.rapidiario.refinance_rate;
        let schedule = self.compute_schedule(ProductType::Rapidiario, total_debt, rate, today, loan.params)?;
        let mut successor = Loan::from_schedule(loan.client_id, &schedule, loan.params);
        successor.parent_loan_id = Some(loan.id);
        successor.refinance_count = loan.refinance_count + 1;
        let new_id = successor.id;
        let refinance_count = successor.refinance_count;
        let now = self.time.now();

        let events = self.store.atomically(|store| {
            let old_status = loan.status;
            loan.status = LoanStatus::Refinanced;
            loan.end_date = Some(today);
            store.update_loan(&mut loan)?;

            let mut events = vec![status_changed(loan_id, old_status, LoanStatus::Refinanced, "refinanced", now)];
            events.extend(insert_with_schedule(store, successor, &schedule)?);
            events.push(Event::LoanRefinanced {
                old_loan_id: loan_id,
                new_loan_id: new_id,
                carried_balance: total_debt,
                new_rate: rate,
                refinance_count,
                timestamp: now,
            });
            Ok(events)
        })?;
        self.events.extend(events);

        info!(
            old_loan_id = %loan_id,
            new_loan_id = %new_id,
            carried_balance = %total_debt,
            refinance_count,
            "loan refinanced"
        );
        Ok(new_id)
    }

    /// freeze the loan's debt into a single synthetic installment
    pub fn freeze(&mut self, loan_id: LoanId, admin_fee_override: Option<Money>) -> Result<FreezeTerms> {
        let today = self.today();
        let now = self.time.now();
        let loan = self.require_loan(loan_id)?;
        let policy = &self.policy;

        let (terms, events) = self
            .store
            .atomically(|store| freeze_in_store(store, policy, loan, today, now, admin_fee_override, false))
            .map_err(|err| {
                warn!(loan_id = %loan_id, error = %err, "freeze rejected");
                err
            })?;
        self.events.extend(events);
        Ok(terms)
    }

    /// freeze every active or overdue loan past its product's staleness rule
    pub fn run_delinquency_sweep(&mut self) -> Result<usize> {
        let today = self.today();
        let now = self.time.now();

        let mut candidates = Vec::new();
        let loans = self.store.list_loans()?;
        let evaluated = loans.len();
        for loan in loans {
            if !matches!(loan.status, LoanStatus::Active | LoanStatus::Overdue) {
                continue;
            }
            let outstanding = InstallmentLedger::new(&mut self.store).outstanding_balance(&loan)?;
            let status = effective_status(&loan, outstanding, today);
            if is_sweep_candidate(&loan, status, outstanding, today, &self.policy) {
                candidates.push(loan);
            }
        }

        let policy = &self.policy;
        let (frozen, mut events) = self.store.atomically(|store| {
            let mut frozen = Vec::with_capacity(candidates.len());
            let mut events = Vec::new();
            for loan in candidates {
                let loan_id = loan.id;
                let (_, loan_events) = freeze_in_store(store, policy, loan, today, now, None, true)?;
                frozen.push(loan_id);
                events.extend(loan_events);
            }
            Ok((frozen, events))
        })?;

        let count = frozen.len();
        events.push(Event::SweepCompleted {
            evaluated,
            frozen,
            sweep_date: today,
            timestamp: now,
        });
        self.events.extend(events);

        info!(sweep_date = %today, evaluated, frozen = count, "delinquency sweep completed");
        Ok(count)
    }

    /// settle a secured loan against the sale of its collateral
    pub fn liquidate(&mut self, loan_id: LoanId, sale_price: Money, sales_expense: Money) -> Result<LiquidationSettlement> {
        let today = self.today();
        let now = self.time.now();
        let mut loan = self.require_loan(loan_id)?;
        let outstanding = InstallmentLedger::new(&mut self.store).outstanding_balance(&loan)?;
        let status = effective_status(&loan, outstanding, today);
        if let Err(err) = ensure_can_liquidate(&loan, status) {
            warn!(loan_id = %loan_id, reason = err.reason().unwrap_or_default(), "liquidation rejected");
            return Err(err);
        }
        // a frozen loan settles against the amount fixed at freeze time
        let debt = loan.frozen_amount.unwrap_or(outstanding);
        let settlement = LiquidationSettlement::compute(debt, sale_price, sales_expense)?;

        let events = self.store.atomically(|store| {
            let old_status = loan.status;
            loan.status = LoanStatus::Liquidated;
            loan.end_date = Some(today);
            loan.frozen_amount.get_or_insert(debt);
            loan.sale_price = Some(sale_price);
            loan.sales_expense = Some(sales_expense);
            store.update_loan(&mut loan)?;

            let cash = [
                (TransactionKind::CollateralSale, sale_price),
                (TransactionKind::SaleExpense, sales_expense),
                (TransactionKind::ClientRefund, settlement.refund_to_client),
            ];
            for (kind, amount) in cash {
                if amount.is_positive() {
                    store.insert_transaction(CashTransaction::new(loan_id, kind, amount, today))?;
                }
            }

            Ok(vec![
                status_changed(loan_id, old_status, LoanStatus::Liquidated, "collateral sold", now),
                Event::LoanLiquidated {
                    loan_id,
                    debt,
                    sale_price,
                    sales_expense,
                    refund_to_client: settlement.refund_to_client,
                    deficiency: settlement.deficiency,
                    timestamp: now,
                },
            ])
        })?;
        self.events.extend(events);

        info!(
            loan_id = %loan_id,
            debt = %debt,
            sale_price = %sale_price,
            refund = %settlement.refund_to_client,
            deficiency = %settlement.deficiency,
            "loan liquidated"
        );
        Ok(settlement)
    }

    // ---- queries ----

    pub fn loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.require_loan(loan_id)
    }

    pub fn client(&self, client_id: ClientId) -> Result<Client> {
        self.store
            .get_client(client_id)?
            .ok_or(LoanError::ClientNotFound { id: client_id })
    }

    /// every installment of the loan, scheduled and frozen, by number
    pub fn installments(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        self.require_loan(loan_id)?;
        let today = self.today();
        let mut rows = self.store.installments_for(loan_id)?;
        rows.iter_mut().for_each(|i| i.refresh_status(today));
        Ok(rows)
    }

    pub fn transactions(&self, loan_id: LoanId) -> Result<Vec<CashTransaction>> {
        self.require_loan(loan_id)?;
        self.store.transactions_for(loan_id)
    }

    pub fn outstanding_balance(&mut self, loan_id: LoanId) -> Result<Money> {
        let loan = self.require_loan(loan_id)?;
        InstallmentLedger::new(&mut self.store).outstanding_balance(&loan)
    }

    /// open payable installments whose due date has passed
    pub fn overdue_installments(&mut self, loan_id: LoanId) -> Result<Vec<Installment>> {
        let today = self.today();
        let loan = self.require_loan(loan_id)?;
        let payable = InstallmentLedger::new(&mut self.store).payable_installments(&loan)?;
        Ok(payable
            .into_iter()
            .filter(|i| i.is_open() && i.due_date < today)
            .map(|mut i| {
                i.refresh_status(today);
                i
            })
            .collect())
    }

    /// the loan and its refinance ancestors, oldest first
    pub fn refinance_chain(&self, loan_id: LoanId) -> Result<Vec<Loan>> {
        let mut chain = vec![self.require_loan(loan_id)?];
        while let Some(parent_id) = chain.last().and_then(|l| l.parent_loan_id) {
            if chain.iter().any(|l| l.id == parent_id) {
                return Err(LoanError::persistence(format!("refinance cycle at loan {}", parent_id)));
            }
            chain.push(self.require_loan(parent_id)?);
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn loan_view(&self, loan_id: LoanId) -> Result<LoanView> {
        let loan = self.require_loan(loan_id)?;
        let installments = self.store.installments_for(loan_id)?;
        Ok(LoanView::build(&loan, &installments, self.today()))
    }

    fn require_loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.store
            .get_loan(loan_id)?
            .ok_or(LoanError::LoanNotFound { id: loan_id })
    }
}

/// insert a loan row and one pending installment per schedule entry
fn insert_with_schedule<S: LoanStore>(
    store: &mut S,
    loan: Loan,
    schedule: &Schedule,
) -> Result<Vec<Event>> {
    let loan_id = loan.id;
    store.insert_loan(loan)?;
    let rows = InstallmentLedger::new(store).create_schedule(loan_id, &schedule.installments, InstallmentKind::Scheduled)?;
    Ok(vec![Event::ScheduleCreated {
        loan_id,
        kind: InstallmentKind::Scheduled,
        installment_count: rows.len(),
        total: rows.iter().map(|r| r.amount).sum(),
    }])
}

/// freeze one loan; the caller owns the transaction
fn freeze_in_store<S: LoanStore>(
    store: &mut S,
    policy: &LoanPolicy,
    mut loan: Loan,
    today: NaiveDate,
    now: DateTime<Utc>,
    admin_fee_override: Option<Money>,
    automatic: bool,
) -> Result<(FreezeTerms, Vec<Event>)> {
    let mut ledger = InstallmentLedger::new(&mut *store);
    let total_debt = ledger.outstanding_balance(&loan)?;
    let status = effective_status(&loan, total_debt, today);
    ensure_can_freeze(status)?;
    let terms = FreezeTerms::compute(loan.product, total_debt, policy, admin_fee_override)?;

    let lump = ScheduledInstallment {
        number: 1,
        due_date: today,
        amount: terms.frozen_amount,
    };
    ledger.create_schedule(loan.id, &[lump], InstallmentKind::FrozenBalance)?;

    let old_status = loan.status;
    loan.status = LoanStatus::Frozen;
    loan.frozen_amount = Some(terms.frozen_amount);
    loan.admin_fee = Some(terms.admin_fee);
    loan.frozen_date = Some(today);
    store.update_loan(&mut loan)?;

    info!(
        loan_id = %loan.id,
        product = %loan.product,
        total_debt = %terms.total_debt,
        admin_fee = %terms.admin_fee,
        automatic,
        "loan frozen"
    );

    let reason = if automatic { "automatic delinquency sweep" } else { "manual freeze" };
    let events = vec![
        status_changed(loan.id, old_status, LoanStatus::Frozen, reason, now),
        Event::LoanFrozen {
            loan_id: loan.id,
            total_debt: terms.total_debt,
            admin_fee: terms.admin_fee,
            frozen_amount: terms.frozen_amount,
            automatic,
            timestamp: now,
        },
        Event::ScheduleCreated {
            loan_id: loan.id,
            kind: InstallmentKind::FrozenBalance,
            installment_count: 1,
            total: terms.frozen_amount,
        },
    ];
    Ok((terms, events))
}

fn status_changed(
    loan_id: LoanId,
    old_status: LoanStatus,
    new_status: LoanStatus,
    reason: &str,
    timestamp: DateTime<Utc>,
) -> Event {
    Event::StatusChanged {
        loan_id,
        old_status,
        new_status,
        reason: reason.to_string(),
        timestamp,
    }
}
