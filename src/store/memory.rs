use std::collections::HashMap;

use crate::errors::{LoanError, Result};
use crate::ledger::Installment;
use crate::loan::{Client, Loan};
use crate::types::{CashTransaction, ClientId, InstallmentId, LoanId};

use super::LoanStore;

#[derive(Debug, Clone, Default)]
struct Tables {
    clients: HashMap<ClientId, Client>,
    loans: HashMap<LoanId, Loan>,
    installments: HashMap<InstallmentId, Installment>,
    transactions: Vec<CashTransaction>,
}

/// in-process store with snapshot rollback
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Tables,
    /// writes allowed before the store starts failing
    writes_before_failure: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// make the store fail every write after `n` more succeed
    pub fn fail_writes_after(&mut self, n: usize) {
        self.writes_before_failure = Some(n);
    }

    pub fn clear_failure(&mut self) {
        self.writes_before_failure = None;
    }

    pub fn loan_count(&self) -> usize {
        self.tables.loans.len()
    }

    pub fn all_transactions(&self) -> &[CashTransaction] {
        &self.tables.transactions
    }

    fn check_write(&mut self) -> Result<()> {
        match self.writes_before_failure {
            Some(0) => Err(LoanError::persistence("storage write rejected")),
            Some(n) => {
                self.writes_before_failure = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl LoanStore for InMemoryStore {
    fn insert_client(&mut self, client: Client) -> Result<()> {
        self.check_write()?;
        if self.tables.clients.contains_key(&client.id) {
            return Err(LoanError::persistence(format!("duplicate client id {}", client.id)));
        }
        self.tables.clients.insert(client.id, client);
        Ok(())
    }

    fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.tables.clients.get(&id).cloned())
    }

    fn insert_loan(&mut self, loan: Loan) -> Result<()> {
        self.check_write()?;
        if self.tables.loans.contains_key(&loan.id) {
            return Err(LoanError::persistence(format!("duplicate loan id {}", loan.id)));
        }
        self.tables.loans.insert(loan.id, loan);
        Ok(())
    }

    fn get_loan(&self, id: LoanId) -> Result<Option<Loan>> {
        Ok(self.tables.loans.get(&id).cloned())
    }

    fn update_loan(&mut self, loan: &mut Loan) -> Result<()> {
        self.check_write()?;
        let stored = self
            .tables
            .loans
            .get_mut(&loan.id)
            .ok_or(LoanError::LoanNotFound { id: loan.id })?;
        if stored.version != loan.version {
            return Err(LoanError::persistence(format!(
                "stale write on loan {}: version {} but stored {}",
                loan.id, loan.version, stored.version
            )));
        }
        loan.version += 1;
        *stored = loan.clone();
        Ok(())
    }

    fn list_loans(&self) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self.tables.loans.values().cloned().collect();
        loans.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(loans)
    }

    fn insert_installments(&mut self, installments: Vec<Installment>) -> Result<()> {
        for installment in installments {
            self.check_write()?;
            if !self.tables.loans.contains_key(&installment.loan_id) {
                return Err(LoanError::persistence(format!(
                    "installment references missing loan {}",
                    installment.loan_id
                )));
            }
            self.tables.installments.insert(installment.id, installment);
        }
        Ok(())
    }

    fn installments_for(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .tables
            .installments
            .values()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.number);
        Ok(rows)
    }

    fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>> {
        Ok(self.tables.installments.get(&id).cloned())
    }

    fn update_installment(&mut self, installment: &Installment) -> Result<()> {
        self.check_write()?;
        let stored = self
            .tables
            .installments
            .get_mut(&installment.id)
            .ok_or(LoanError::InstallmentNotFound { id: installment.id })?;
        *stored = installment.clone();
        Ok(())
    }

    fn insert_transaction(&mut self, transaction: CashTransaction) -> Result<()> {
        self.check_write()?;
        self.tables.transactions.push(transaction);
        Ok(())
    }

    fn transactions_for(&self, loan_id: LoanId) -> Result<Vec<CashTransaction>> {
        Ok(self
            .tables
            .transactions
            .iter()
            .filter(|t| t.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.tables.clone();
        let result = f(self);
        if result.is_err() {
            self.tables = snapshot;
        }
        result
    }
}
