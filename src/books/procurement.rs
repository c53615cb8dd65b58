use super::{clean_optional, round2};
use crate::core::entity::{Lifecycle, Reference};
use crate::core::error::BooksError;
use crate::entities::impl_resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcuredItemKind {
    RawMaterial,
    TradingGood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementStatus {
    #[default]
    Ordered,
    Received,
    Cancelled,
}

impl_resource!(
    /// A purchase order for stock placed with a vendor
    Procurement,
    "procurement",
    unique: [],
    search: ["itemName", "notes"],
    filter: ["itemKind", "status", "date", "totalCost"],
    references: [Reference::one("vendorId", "vendor", "vendor")],
    {
        vendor_id: uuid::Uuid,
        item_kind: ProcuredItemKind,
        #[validate(length(min = 1, message = "is required"))]
        item_name: String,
        #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0, message = "must be greater than zero and at most 1e12"))]
        quantity: f64,
        #[validate(range(min = 0.0, max = 1_000_000_000_000.0, message = "must be between 0 and 1e12"))]
        unit_cost: f64,
        /// Always `quantity * unitCost`; any value sent by clients is replaced
        #[serde(default)]
        total_cost: f64,
        date: NaiveDate,
        #[serde(default)]
        status: ProcurementStatus,
        notes: Option<String>,
    }
);

impl Lifecycle for Procurement {
    fn normalize(&mut self) {
        self.item_name = self.item_name.trim().to_string();
        clean_optional(&mut self.notes);
        self.total_cost = round2(self.quantity * self.unit_cost);
    }

    fn check_rules(&self) -> Result<(), BooksError> {
        if !self.total_cost.is_finite() {
            return Err(BooksError::field("totalCost", "is too large"));
        }
        Ok(())
    }
}
