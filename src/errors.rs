use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid argument: {message}")]
    InvalidArgument {
        message: String,
    },

    #[error("operation not allowed: {reason}")]
    NotEligible {
        reason: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: Uuid,
    },

    #[error("installment not found: {id}")]
    InstallmentNotFound {
        id: Uuid,
    },

    #[error("client not found: {id}")]
    ClientNotFound {
        id: Uuid,
    },

    #[error("schedule already exists for loan {loan_id}")]
    ScheduleAlreadyExists {
        loan_id: Uuid,
    },

    #[error("persistence failure: {message}")]
    PersistenceFailure {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

/// coarse classification of [`LoanError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotEligible,
    NotFound,
    PersistenceFailure,
    Configuration,
}

impl LoanError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LoanError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_eligible(reason: impl Into<String>) -> Self {
        LoanError::NotEligible {
            reason: reason.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        LoanError::PersistenceFailure {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LoanError::NotEligible { .. } | LoanError::ScheduleAlreadyExists { .. } => {
                ErrorKind::NotEligible
            }
            LoanError::LoanNotFound { .. }
            | LoanError::InstallmentNotFound { .. }
            | LoanError::ClientNotFound { .. } => ErrorKind::NotFound,
            LoanError::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
            LoanError::InvalidConfiguration { .. } => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// rejection reason for `NotEligible` errors
    pub fn reason(&self) -> Option<&str> {
        match self {
            LoanError::NotEligible { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
