//! Fixed assets and straight-line depreciation

use super::{clean_optional, round2};
use crate::core::entity::{Lifecycle, Reference};
use crate::core::error::BooksError;
use crate::entities::impl_resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Active,
    UnderMaintenance,
    Disposed,
}

/// Smallest non-zero yearly rate, in percent; the schedule has at most 1000 rows
pub const MIN_DEPRECIATION_RATE: f64 = 0.1;

impl_resource!(
    /// Equipment, vehicles, property and other long-lived assets
    Asset,
    "asset",
    unique: [],
    search: ["name", "category", "location"],
    filter: ["category", "status", "purchaseDate", "purchaseValue"],
    references: [Reference::one("vendorId", "vendor", "vendor")],
    {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
        #[validate(length(min = 1, message = "is required"))]
        category: String,
        purchase_date: NaiveDate,
        #[validate(range(min = 0.0, message = "must not be negative"))]
        purchase_value: f64,
        /// Yearly depreciation in percent of the depreciable amount
        #[serde(default)]
        #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
        depreciation_rate: f64,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        salvage_value: f64,
        #[serde(default)]
        status: AssetStatus,
        location: Option<String>,
        vendor_id: Option<uuid::Uuid>,
        notes: Option<String>,
    }
);

impl Lifecycle for Asset {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        clean_optional(&mut self.location);
        clean_optional(&mut self.notes);
    }

    fn check_rules(&self) -> Result<(), BooksError> {
        if self.salvage_value > self.purchase_value {
            return Err(BooksError::field(
                "salvageValue",
                "must not exceed purchaseValue",
            ));
        }
        if self.depreciation_rate > 0.0 && self.depreciation_rate < MIN_DEPRECIATION_RATE {
            return Err(BooksError::field(
                "depreciationRate",
                format!("must be 0 or at least {}", MIN_DEPRECIATION_RATE),
            ));
        }
        Ok(())
    }
}

/// One year of the depreciation schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationYear {
    pub year: u32,
    pub period_start: NaiveDate,
    pub opening_value: f64,
    pub depreciation: f64,
    pub closing_value: f64,
}

/// Straight-line depreciation of an asset as of a given date
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationReport {
    pub asset_id: uuid::Uuid,
    pub name: String,
    pub purchase_date: NaiveDate,
    pub purchase_value: f64,
    pub salvage_value: f64,
    pub depreciation_rate: f64,
    pub annual_depreciation: f64,
    pub years_elapsed: u32,
    pub accumulated_depreciation: f64,
    pub book_value: f64,
    pub as_of: NaiveDate,
    pub schedule: Vec<DepreciationYear>,
}

impl Asset {
    /// Depreciation charged per full year
    pub fn annual_depreciation(&self) -> f64 {
        let depreciable = (self.purchase_value - self.salvage_value).max(0.0);
        depreciable * self.depreciation_rate / 100.0
    }

    /// Value after the full years elapsed up to `as_of`, never below salvage value
    pub fn book_value(&self, as_of: NaiveDate) -> f64 {
        let years = as_of.years_since(self.purchase_date).unwrap_or(0);
        let value = self.purchase_value - self.annual_depreciation() * f64::from(years);
        round2(value.max(self.salvage_value))
    }

    /// Full schedule until the asset reaches its salvage value
    pub fn depreciation(&self, as_of: NaiveDate) -> DepreciationReport {
        let annual = self.annual_depreciation();
        let mut schedule = Vec::new();

        if annual > 0.0 {
            let depreciable = self.purchase_value - self.salvage_value;
            let periods = (depreciable / annual).ceil() as u32;
            let mut value = self.purchase_value;
            let mut year = 0u32;
            // stop on the last period, or once less than a cent is left
            while year < periods && value - self.salvage_value >= 0.005 {
                let charge = annual.min(value - self.salvage_value);
                let period_start = self
                    .purchase_date
                    .checked_add_months(chrono::Months::new(12 * year))
                    .unwrap_or(self.purchase_date);
                year += 1;
                schedule.push(DepreciationYear {
                    year,
                    period_start,
                    opening_value: round2(value),
                    depreciation: round2(charge),
                    closing_value: round2(value - charge),
                });
                value -= charge;
            }
        }

        let book_value = self.book_value(as_of);
        DepreciationReport {
            asset_id: self.id,
            name: self.name.clone(),
            purchase_date: self.purchase_date,
            purchase_value: self.purchase_value,
            salvage_value: self.salvage_value,
            depreciation_rate: self.depreciation_rate,
            annual_depreciation: round2(annual),
            years_elapsed: as_of.years_since(self.purchase_date).unwrap_or(0),
            accumulated_depreciation: round2(self.purchase_value - book_value),
            book_value,
            as_of,
            schedule,
        }
    }
}
