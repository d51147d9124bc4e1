use chrono::Weekday;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// business policy injected into the calculator and state machine
///
/// Settings the shop keeps in its key-value store are resolved by the caller
/// and passed in here; nothing in the core reads settings on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// cash rounding unit for installment amounts
    #[serde(default = "default_rounding_step")]
    pub cash_rounding_step: Money,
    #[serde(default)]
    pub rapidiario: RapidiarioPolicy,
    #[serde(default)]
    pub delinquency: DelinquencyPolicy,
}

/// rapidiario product rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RapidiarioPolicy {
    /// calendar days from start to maturity
    pub term_days: u32,
    /// weekday on which no cuota is collected
    pub rest_day: Weekday,
    pub weekly_installments: u32,
    pub weekly_interval_days: u32,
    /// maximum number of refinances in one chain
    pub refinance_cap: u32,
    /// fixed rate charged on refinanced debt
    pub refinance_rate: Rate,
    /// administrative fee charged on freeze
    pub freeze_fee_rate: Rate,
}

/// automatic freeze thresholds for secured products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyPolicy {
    /// nominal term plus grace, in days since start
    pub pawn_freeze_after_days: u32,
    pub bank_freeze_after_days: u32,
}

fn default_rounding_step() -> Money {
    Money::TEN_CENTS
}

impl Default for RapidiarioPolicy {
    fn default() -> Self {
        Self {
            term_days: 30,
            rest_day: Weekday::Sun,
            weekly_installments: 4,
            weekly_interval_days: 7,
            refinance_cap: 3,
            refinance_rate: Rate::from_percentage(8),
            freeze_fee_rate: Rate::from_decimal(dec!(0.05)),
        }
    }
}

impl Default for DelinquencyPolicy {
    fn default() -> Self {
        Self {
            pawn_freeze_after_days: 75,
            bank_freeze_after_days: 105,
        }
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            cash_rounding_step: default_rounding_step(),
            rapidiario: RapidiarioPolicy::default(),
            delinquency: DelinquencyPolicy::default(),
        }
    }
}

impl LoanPolicy {
    /// parse and validate a policy document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: LoanPolicy = serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
            message: e.to_string(),
        })?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(LoanError::InvalidConfiguration {
                message: message.to_string(),
            })
        };

        if !self.cash_rounding_step.is_positive() {
            return fail("cash_rounding_step must be positive");
        }
        let r = &self.rapidiario;
        if r.term_days == 0 {
            return fail("rapidiario.term_days must be positive");
        }
        if r.weekly_installments == 0 || r.weekly_interval_days == 0 {
            return fail("rapidiario weekly schedule must have installments and an interval");
        }
        match r.weekly_installments.checked_mul(r.weekly_interval_days) {
            Some(span) if span <= r.term_days => {}
            _ => return fail("rapidiario weekly schedule exceeds the term"),
        }
        if r.refinance_cap == 0 {
            return fail("rapidiario.refinance_cap must be positive");
        }
        if r.refinance_rate.is_negative() || r.freeze_fee_rate.is_negative() {
            return fail("rapidiario rates must not be negative");
        }
        Ok(())
    }
}
