//! The bookkeeping domain: resource definitions, the module that exposes
//! them, and the read-only reports built on top of them

mod asset;
mod client;
mod expense;
mod inventory;
mod loan;
mod payment;
mod procurement;
pub mod reports;

pub use asset::{Asset, AssetStatus, DepreciationReport, DepreciationYear, MIN_DEPRECIATION_RATE};
pub use client::{Client, Vendor};
pub use expense::Expense;
pub use inventory::{FinishedGood, InventorySummary, RawMaterial, StockTotals, TradingGood};
pub use loan::{InterestFrequency, InterestPayment, LoanAccount, LoanStatus, LoanSummary};
pub use payment::{Payment, PaymentDirection};
pub use procurement::{ProcuredItemKind, Procurement, ProcurementStatus};

use crate::core::entity::{Entity, Resource};
use crate::core::module::{EntityFetcher, Module, ServiceFetcher};
use crate::core::service::DataService;
use crate::server::entity_registry::{EntityRegistry, ResourceDescriptor};
use crate::storage::{InMemoryDataService, Storage};
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

/// One data service per resource
#[derive(Clone)]
pub struct BookServices {
    pub clients: Arc<dyn DataService<Client>>,
    pub vendors: Arc<dyn DataService<Vendor>>,
    pub assets: Arc<dyn DataService<Asset>>,
    pub expenses: Arc<dyn DataService<Expense>>,
    pub raw_materials: Arc<dyn DataService<RawMaterial>>,
    pub trading_goods: Arc<dyn DataService<TradingGood>>,
    pub finished_goods: Arc<dyn DataService<FinishedGood>>,
    pub loan_accounts: Arc<dyn DataService<LoanAccount>>,
    pub interest_payments: Arc<dyn DataService<InterestPayment>>,
    pub payments: Arc<dyn DataService<Payment>>,
    pub procurements: Arc<dyn DataService<Procurement>>,
}

impl BookServices {
    /// Open every resource's service on the given storage
    pub async fn connect(storage: &Storage) -> Result<Self> {
        Ok(Self {
            clients: storage.service().await?,
            vendors: storage.service().await?,
            assets: storage.service().await?,
            expenses: storage.service().await?,
            raw_materials: storage.service().await?,
            trading_goods: storage.service().await?,
            finished_goods: storage.service().await?,
            loan_accounts: storage.service().await?,
            interest_payments: storage.service().await?,
            payments: storage.service().await?,
            procurements: storage.service().await?,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            clients: Arc::new(InMemoryDataService::new()),
            vendors: Arc::new(InMemoryDataService::new()),
            assets: Arc::new(InMemoryDataService::new()),
            expenses: Arc::new(InMemoryDataService::new()),
            raw_materials: Arc::new(InMemoryDataService::new()),
            trading_goods: Arc::new(InMemoryDataService::new()),
            finished_goods: Arc::new(InMemoryDataService::new()),
            loan_accounts: Arc::new(InMemoryDataService::new()),
            interest_payments: Arc::new(InMemoryDataService::new()),
            payments: Arc::new(InMemoryDataService::new()),
            procurements: Arc::new(InMemoryDataService::new()),
        }
    }
}

/// Registers every bookkeeping resource and the report routes
pub struct BookkeepingModule {
    services: BookServices,
}

impl BookkeepingModule {
    pub fn new(services: BookServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &BookServices {
        &self.services
    }
}

fn fetcher<T: Resource>(service: &Arc<dyn DataService<T>>) -> Arc<dyn EntityFetcher> {
    Arc::new(ServiceFetcher::new(service.clone()))
}

impl Module for BookkeepingModule {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn entity_types(&self) -> Vec<&str> {
        vec![
            Client::resource_name_singular(),
            Vendor::resource_name_singular(),
            Asset::resource_name_singular(),
            Expense::resource_name_singular(),
            RawMaterial::resource_name_singular(),
            TradingGood::resource_name_singular(),
            FinishedGood::resource_name_singular(),
            LoanAccount::resource_name_singular(),
            InterestPayment::resource_name_singular(),
            Payment::resource_name_singular(),
            Procurement::resource_name_singular(),
        ]
    }

    fn register_entities(&self, registry: &mut EntityRegistry) {
        let s = &self.services;
        registry.register(Box::new(ResourceDescriptor::new(s.clients.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.vendors.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.assets.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.expenses.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.raw_materials.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.trading_goods.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.finished_goods.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.loan_accounts.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.interest_payments.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.payments.clone())));
        registry.register(Box::new(ResourceDescriptor::new(s.procurements.clone())));
    }

    fn get_entity_fetcher(&self, entity_type: &str) -> Option<Arc<dyn EntityFetcher>> {
        let s = &self.services;
        let found = match entity_type {
            "client" => fetcher(&s.clients),
            "vendor" => fetcher(&s.vendors),
            "asset" => fetcher(&s.assets),
            "expense" => fetcher(&s.expenses),
            "raw_material" => fetcher(&s.raw_materials),
            "trading_good" => fetcher(&s.trading_goods),
            "finished_good" => fetcher(&s.finished_goods),
            "loan_account" => fetcher(&s.loan_accounts),
            "interest_payment" => fetcher(&s.interest_payments),
            "payment" => fetcher(&s.payments),
            "procurement" => fetcher(&s.procurements),
            _ => return None,
        };
        Some(found)
    }

    fn routes(&self) -> Result<Router> {
        Ok(Router::new()
            .route("/inventory/summary", get(reports::inventory_summary))
            .route("/assets/{id}/depreciation", get(reports::asset_depreciation))
            .route("/loan-accounts/{id}/summary", get(reports::loan_summary))
            .route("/dashboard", get(reports::dashboard))
            .with_state(self.services.clone()))
    }
}

/// Trim, lowercase, and drop empty emails
pub(crate) fn normalize_email(email: &mut Option<String>) {
    *email = email
        .take()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
}

/// Trim optional text, turning blank values into `None`
pub(crate) fn clean_optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

/// Round a money amount to cents
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
