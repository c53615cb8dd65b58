//! Stock items: raw materials, goods bought for resale, and manufactured goods

use super::round2;
use crate::core::entity::{Lifecycle, Reference};
use crate::entities::impl_resource;
use serde::Serialize;

impl_resource!(
    /// Input consumed in production
    RawMaterial,
    "raw_material",
    unique: ["sku"],
    search: ["name", "sku"],
    filter: ["unit", "quantity"],
    references: [Reference::one("vendorId", "vendor", "vendor")],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(length(min = 1, message = "is required"))]
        sku: String,
        #[validate(length(min = 1, message = "is required"))]
        unit: String,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        quantity: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        cost_per_unit: f64,
        /// Stock level at or below which the material should be reordered
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        reorder_level: f64,
        vendor_id: Option<uuid::Uuid>,
    }
);

impl Lifecycle for RawMaterial {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.unit = self.unit.trim().to_string();
    }
}

impl RawMaterial {
    pub fn stock_value(&self) -> f64 {
        self.quantity * self.cost_per_unit
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

impl_resource!(
    /// Goods bought to be resold unchanged
    TradingGood,
    "trading_good",
    unique: ["sku"],
    search: ["name", "sku"],
    filter: ["unit", "quantity"],
    references: [Reference::one("vendorId", "vendor", "vendor")],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(length(min = 1, message = "is required"))]
        sku: String,
        #[validate(length(min = 1, message = "is required"))]
        unit: String,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        quantity: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        cost_price: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        selling_price: f64,
        vendor_id: Option<uuid::Uuid>,
    }
);

impl Lifecycle for TradingGood {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.unit = self.unit.trim().to_string();
    }
}

impl TradingGood {
    pub fn stock_value(&self) -> f64 {
        self.quantity * self.cost_price
    }
}

impl_resource!(
    /// Products manufactured from raw materials
    FinishedGood,
    "finished_good",
    unique: ["sku"],
    search: ["name", "sku"],
    filter: ["unit", "quantity"],
    references: [Reference::many("rawMaterialIds", "raw_material", "rawMaterials")],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(length(min = 1, message = "is required"))]
        sku: String,
        #[validate(length(min = 1, message = "is required"))]
        unit: String,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        quantity: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        production_cost: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        selling_price: f64,
        #[serde(default)]
        raw_material_ids: Vec<uuid::Uuid>,
    }
);

impl Lifecycle for FinishedGood {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.unit = self.unit.trim().to_string();
        let mut seen = std::collections::HashSet::new();
        self.raw_material_ids.retain(|id| seen.insert(*id));
    }
}

impl FinishedGood {
    pub fn stock_value(&self) -> f64 {
        self.quantity * self.production_cost
    }
}

/// Totals for one stock category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTotals {
    pub item_count: usize,
    pub total_quantity: f64,
    pub total_value: f64,
    pub low_stock_count: usize,
}

impl StockTotals {
    fn add(&mut self, quantity: f64, value: f64, low_stock: bool) {
        self.item_count += 1;
        self.total_quantity += quantity;
        self.total_value += value;
        if low_stock {
            self.low_stock_count += 1;
        }
    }

    fn rounded(mut self) -> Self {
        self.total_quantity = round2(self.total_quantity);
        self.total_value = round2(self.total_value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub raw_materials: StockTotals,
    pub trading_goods: StockTotals,
    pub finished_goods: StockTotals,
    pub total_value: f64,
}

impl InventorySummary {
    pub fn compute(raw: &[RawMaterial], trading: &[TradingGood], finished: &[FinishedGood]) -> Self {
        let mut raw_totals = StockTotals::default();
        for item in raw {
            raw_totals.add(item.quantity, item.stock_value(), item.is_low_stock());
        }

        let mut trading_totals = StockTotals::default();
        for item in trading {
            trading_totals.add(item.quantity, item.stock_value(), false);
        }

        let mut finished_totals = StockTotals::default();
        for item in finished {
            finished_totals.add(item.quantity, item.stock_value(), false);
        }

        let total_value =
            raw_totals.total_value + trading_totals.total_value + finished_totals.total_value;

        Self {
            raw_materials: raw_totals.rounded(),
            trading_goods: trading_totals.rounded(),
            finished_goods: finished_totals.rounded(),
            total_value: round2(total_value),
        }
    }
}
