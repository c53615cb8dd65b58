use super::clean_optional;
use crate::core::entity::{Lifecycle, Reference};
use crate::entities::impl_resource;
use chrono::NaiveDate;

impl_resource!(
    /// Money spent on running the business
    Expense,
    "expense",
    unique: [],
    search: ["title", "category", "notes"],
    filter: ["category", "amount", "date", "paymentMethod"],
    references: [Reference::one("vendorId", "vendor", "vendor")],
    {
        #[validate(length(min = 1, message = "is required"))]
        title: String,
        #[validate(range(exclusive_min = 0.0, message = "must be greater than zero"))]
        amount: f64,
        #[validate(length(min = 1, message = "is required"))]
        category: String,
        date: NaiveDate,
        payment_method: Option<String>,
        vendor_id: Option<uuid::Uuid>,
        notes: Option<String>,
    }
);

impl Lifecycle for Expense {
    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.category = self.category.trim().to_string();
        clean_optional(&mut self.payment_method);
        clean_optional(&mut self.notes);
    }
}
