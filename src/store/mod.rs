pub mod memory;

use crate::errors::Result;
use crate::ledger::Installment;
use crate::loan::{Client, Loan};
use crate::types::{CashTransaction, ClientId, InstallmentId, LoanId};

pub use memory::InMemoryStore;

/// row-level storage for the loan core
///
/// Implementations only store and filter rows; every business rule lives in
/// the core. `update_loan` must reject a loan whose `version` no longer
/// matches the stored row and bump the version on success.
pub trait LoanStore {
    fn insert_client(&mut self, client: Client) -> Result<()>;
    fn get_client(&self, id: ClientId) -> Result<Option<Client>>;

    fn insert_loan(&mut self, loan: Loan) -> Result<()>;
    fn get_loan(&self, id: LoanId) -> Result<Option<Loan>>;
    fn update_loan(&mut self, loan: &mut Loan) -> Result<()>;
    fn list_loans(&self) -> Result<Vec<Loan>>;

    fn insert_installments(&mut self, installments: Vec<Installment>) -> Result<()>;
    /// installments of a loan ordered by number ascending
    fn installments_for(&self, loan_id: LoanId) -> Result<Vec<Installment>>;
    fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>>;
    fn update_installment(&mut self, installment: &Installment) -> Result<()>;

    fn insert_transaction(&mut self, transaction: CashTransaction) -> Result<()>;
    fn transactions_for(&self, loan_id: LoanId) -> Result<Vec<CashTransaction>>;

    /// run `f` as one unit: either every write it made is kept or none is
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>;
}
