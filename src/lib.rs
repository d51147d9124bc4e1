pub mod amortization;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod delinquency;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod manager;
pub mod payments;
pub mod store;
pub mod types;
pub mod view;

// re-export key types
pub use amortization::{compute_schedule, Schedule, ScheduleCalculator, ScheduleDetail, ScheduledInstallment};
pub use config::{DelinquencyPolicy, LoanPolicy, RapidiarioPolicy};
pub use decimal::{Money, Rate};
pub use delinquency::{FreezeTerms, LiquidationSettlement};
pub use errors::{ErrorKind, LoanError, Result};
pub use events::{Event, EventStore};
pub use ledger::{Installment, InstallmentLedger};
pub use loan::{Client, Loan};
pub use manager::LoanManager;
pub use payments::{allocate, Allocation, AllocationOrder, AppliedInstallment, PaymentRequest, PaymentResult};
pub use store::{InMemoryStore, LoanStore};
pub use types::{
    CashDirection, CashTransaction, ClientId, Frequency, InstallmentId, InstallmentKind,
    InstallmentStatus, LoanId, LoanStatus, PaymentMethod, ProductType, ScheduleParams,
    TransactionId, TransactionKind,
};
pub use view::LoanView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
