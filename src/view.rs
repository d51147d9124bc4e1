/// serialization support for loans
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::delinquency::effective_status;
use crate::ledger::Installment;
use crate::loan::Loan;
use crate::types::{ClientId, InstallmentKind, InstallmentStatus, LoanId, LoanStatus, ProductType};

/// serializable view of a loan and its installments on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub client_id: ClientId,
    pub product: ProductType,
    pub status: LoanStatus,
    pub as_of: NaiveDate,
    pub financial: FinancialView,
    pub delinquency: DelinquencyView,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialView {
    pub principal: Money,
    pub interest_rate: Rate,
    pub total_payable: Money,
    pub total_paid: Money,
    pub outstanding: Money,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub next_due_date: Option<NaiveDate>,
    pub next_due_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyView {
    pub days_past_due: i64,
    pub overdue_count: usize,
    pub refinance_count: u32,
    pub parent_loan_id: Option<LoanId>,
    pub frozen_amount: Option<Money>,
    pub admin_fee: Option<Money>,
    pub frozen_date: Option<NaiveDate>,
    pub sale_price: Option<Money>,
    pub sales_expense: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentView {
    pub number: u32,
    pub kind: InstallmentKind,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub paid_amount: Money,
    pub balance: Money,
    pub status: InstallmentStatus,
    pub days_late: i64,
}

impl LoanView {
    pub fn build(loan: &Loan, installments: &[Installment], today: NaiveDate) -> Self {
        let kind = loan.payable_kind();
        let payable: Vec<&Installment> = installments.iter().filter(|i| i.kind == kind).collect();

        let outstanding: Money = payable.iter().map(|i| i.balance()).sum();
        let overdue: Vec<&&Installment> = payable
            .iter()
            .filter(|i| i.is_open() && i.due_date < today)
            .collect();
        let next_due = payable.iter().find(|i| i.is_open() && i.due_date >= today);

        LoanView {
            id: loan.id,
            client_id: loan.client_id,
            product: loan.product,
            status: effective_status(loan, outstanding, today),
            as_of: today,
            financial: FinancialView {
                principal: loan.principal,
                interest_rate: loan.interest_rate,
                total_payable: loan.total_payable,
                total_paid: installments.iter().map(|i| i.paid_amount).sum(),
                outstanding,
                start_date: loan.start_date,
                due_date: loan.due_date,
                next_due_date: next_due.map(|i| i.due_date),
                next_due_amount: next_due.map(|i| i.balance()),
            },
            delinquency: DelinquencyView {
                days_past_due: overdue.iter().map(|i| i.days_late(today)).max().unwrap_or(0),
                overdue_count: overdue.len(),
                refinance_count: loan.refinance_count,
                parent_loan_id: loan.parent_loan_id,
                frozen_amount: loan.frozen_amount,
                admin_fee: loan.admin_fee,
                frozen_date: loan.frozen_date,
                sale_price: loan.sale_price,
                sales_expense: loan.sales_expense,
            },
            installments: installments
                .iter()
                .map(|i| InstallmentView {
                    number: i.number,
                    kind: i.kind,
                    due_date: i.due_date,
                    amount: i.amount,
                    paid_amount: i.paid_amount,
                    balance: i.balance(),
                    status: i.status_on(today),
                    days_late: i.days_late(today),
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::compute_schedule;
    use crate::types::{Frequency, ScheduleParams};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly_loan() -> (Loan, Vec<Installment>) {
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
        let installments = schedule
            .installments
            .iter()
            .map(|e| Installment::new(loan.id, e.number, e.due_date, e.amount, InstallmentKind::Scheduled))
            .collect();
        (loan, installments)
    }

    #[test]
    fn test_view_reports_overdue_and_next_due() {
        let (loan, mut installments) = weekly_loan();
        installments[0].paid_amount = Money::from_major(100);

        // weekly cuotas fall on dec 9, 16, 23 and 30
        let view = LoanView::build(&loan, &installments, date(2025, 12, 18));
        assert_eq!(view.status, LoanStatus::Active);
        assert_eq!(view.financial.total_paid, Money::from_major(100));
        assert_eq!(view.financial.outstanding, Money::from_major(980));
        assert_eq!(view.financial.next_due_date, Some(date(2025, 12, 23)));
        assert_eq!(view.delinquency.overdue_count, 2);
        assert_eq!(view.delinquency.days_past_due, 9);
        assert_eq!(view.installments[0].status, InstallmentStatus::Partial);
        assert_eq!(view.installments[1].status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_view_serializes() {
        let (loan, installments) = weekly_loan();
        let json = LoanView::build(&loan, &installments, date(2025, 12, 2)).to_json_pretty().unwrap();
        assert!(json.contains("\"product\": \"Rapidiario\""));
        assert!(json.contains("\"installments\""));
    }
}
