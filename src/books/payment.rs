use super::clean_optional;
use crate::core::entity::{Lifecycle, Reference};
use crate::core::error::BooksError;
use crate::entities::impl_resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    Received,
    Paid,
}

impl_resource!(
    /// Money received from a client or paid to a vendor
    Payment,
    "payment",
    unique: [],
    search: ["reference", "method", "notes"],
    filter: ["direction", "method", "date", "amount"],
    references: [
        Reference::one("clientId", "client", "client"),
        Reference::one("vendorId", "vendor", "vendor"),
    ],
    {
        direction: PaymentDirection,
        #[validate(range(exclusive_min = 0.0, message = "must be greater than zero"))]
        amount: f64,
        date: NaiveDate,
        method: Option<String>,
        /// Cheque number, transfer id or similar
        reference: Option<String>,
        client_id: Option<uuid::Uuid>,
        vendor_id: Option<uuid::Uuid>,
        notes: Option<String>,
    }
);

impl Lifecycle for Payment {
    fn normalize(&mut self) {
        clean_optional(&mut self.method);
        clean_optional(&mut self.reference);
        clean_optional(&mut self.notes);
    }

    fn check_rules(&self) -> Result<(), BooksError> {
        if self.client_id.is_some() && self.vendor_id.is_some() {
            return Err(BooksError::field(
                "vendorId",
                "a payment references either a client or a vendor, not both",
            ));
        }
        Ok(())
    }
}

impl Payment {
    /// Positive for money received, negative for money paid
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            PaymentDirection::Received => self.amount,
            PaymentDirection::Paid => -self.amount,
        }
    }
}
