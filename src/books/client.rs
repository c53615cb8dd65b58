//! Customers and suppliers

use super::{clean_optional, normalize_email};
use crate::core::entity::Lifecycle;
use crate::entities::impl_resource;

impl_resource!(
    /// A customer the business invoices
    Client,
    "client",
    unique: ["email"],
    search: ["name", "email", "company", "phone"],
    filter: ["outstandingBalance"],
    references: [],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(email(message = "must be a valid email address"))]
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
        company: Option<String>,
        /// Amount the client still owes
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        outstanding_balance: f64,
        notes: Option<String>,
    }
);

impl Lifecycle for Client {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        normalize_email(&mut self.email);
        clean_optional(&mut self.phone);
        clean_optional(&mut self.address);
        clean_optional(&mut self.company);
        clean_optional(&mut self.notes);
    }
}

impl_resource!(
    /// A supplier the business buys from
    Vendor,
    "vendor",
    unique: ["email"],
    search: ["name", "email", "category", "phone"],
    filter: ["category", "outstandingBalance"],
    references: [],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(email(message = "must be a valid email address"))]
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
        category: Option<String>,
        /// Amount the business still owes the vendor
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        outstanding_balance: f64,
        notes: Option<String>,
    }
);

impl Lifecycle for Vendor {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        normalize_email(&mut self.email);
        clean_optional(&mut self.phone);
        clean_optional(&mut self.address);
        clean_optional(&mut self.category);
        clean_optional(&mut self.notes);
    }
}
