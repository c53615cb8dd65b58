//! Borrowing: loan accounts and the interest paid on them

use super::{clean_optional, round2};
use crate::core::entity::{Lifecycle, Reference};
use crate::entities::impl_resource;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestFrequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl InterestFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            InterestFrequency::Monthly => 12,
            InterestFrequency::Quarterly => 4,
            InterestFrequency::Yearly => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Active,
    Closed,
}

impl_resource!(
    /// Money borrowed from a bank or other lender
    LoanAccount,
    "loan_account",
    unique: ["accountNumber"],
    search: ["accountNumber", "lender"],
    filter: ["lender", "status", "interestFrequency", "startDate"],
    references: [],
    {
        #[validate(length(min = 1, message = "is required"))]
        account_number: String,
        #[validate(length(min = 1, message = "is required"))]
        lender: String,
        #[validate(range(exclusive_min = 0.0, message = "must be greater than zero"))]
        principal: f64,
        /// Yearly interest rate in percent
        #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
        interest_rate: f64,
        start_date: NaiveDate,
        #[validate(range(min = 1, message = "must be at least one month"))]
        tenure_months: u32,
        #[serde(default)]
        interest_frequency: InterestFrequency,
        #[serde(default)]
        status: LoanStatus,
        notes: Option<String>,
    }
);

impl Lifecycle for LoanAccount {
    fn normalize(&mut self) {
        self.account_number = self.account_number.trim().to_string();
        self.lender = self.lender.trim().to_string();
        clean_optional(&mut self.notes);
    }
}

impl LoanAccount {
    /// Simple interest due for one period of the configured frequency
    pub fn periodic_interest(&self) -> f64 {
        let yearly = self.principal * self.interest_rate / 100.0;
        yearly / f64::from(self.interest_frequency.periods_per_year())
    }

    pub fn maturity_date(&self) -> Option<NaiveDate> {
        self.start_date
            .checked_add_months(Months::new(self.tenure_months))
    }

    pub fn summary(&self, payments: &[InterestPayment]) -> LoanSummary {
        let own: Vec<&InterestPayment> = payments
            .iter()
            .filter(|p| p.loan_account_id == self.id)
            .collect();

        LoanSummary {
            loan_account_id: self.id,
            account_number: self.account_number.clone(),
            lender: self.lender.clone(),
            principal: self.principal,
            interest_rate: self.interest_rate,
            interest_frequency: self.interest_frequency,
            periodic_interest: round2(self.periodic_interest()),
            total_interest_paid: round2(own.iter().map(|p| p.amount).sum()),
            payment_count: own.len(),
            last_payment_date: own.iter().map(|p| p.payment_date).max(),
            start_date: self.start_date,
            maturity_date: self.maturity_date(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub loan_account_id: uuid::Uuid,
    pub account_number: String,
    pub lender: String,
    pub principal: f64,
    pub interest_rate: f64,
    pub interest_frequency: InterestFrequency,
    pub periodic_interest: f64,
    pub total_interest_paid: f64,
    pub payment_count: usize,
    pub last_payment_date: Option<NaiveDate>,
    pub start_date: NaiveDate,
    pub maturity_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl_resource!(
    /// Interest paid against a loan account
    InterestPayment,
    "interest_payment",
    unique: [],
    search: ["period", "notes"],
    filter: ["paymentDate", "period", "amount"],
    references: [Reference::one("loanAccountId", "loan_account", "loanAccount")],
    {
        loan_account_id: uuid::Uuid,
        #[validate(range(exclusive_min = 0.0, message = "must be greater than zero"))]
        amount: f64,
        payment_date: NaiveDate,
        /// Free-form label of the period covered, e.g. "2024-03"
        period: Option<String>,
        notes: Option<String>,
    }
);

impl Lifecycle for InterestPayment {
    fn normalize(&mut self) {
        clean_optional(&mut self.period);
        clean_optional(&mut self.notes);
    }
}
