//! Read-only aggregations over the bookkeeping records

use super::{
    AssetStatus, BookServices, DepreciationReport, InventorySummary, LoanStatus, LoanSummary,
    Payment, PaymentDirection, ProcurementStatus, round2,
};
use crate::core::entity::Entity;
use crate::core::error::BooksError;
use crate::core::response::ApiResponse;
use crate::server::handlers::parse_id;
use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

type ReportResult<T> = Result<Json<ApiResponse<T>>, BooksError>;

/// GET /api/inventory/summary
pub async fn inventory_summary(State(books): State<BookServices>) -> ReportResult<InventorySummary> {
    let raw = books.raw_materials.all().await?;
    let trading = books.trading_goods.all().await?;
    let finished = books.finished_goods.all().await?;

    Ok(Json(ApiResponse::ok(InventorySummary::compute(
        &raw, &trading, &finished,
    ))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationParams {
    /// Valuation date, defaults to today
    pub as_of: Option<NaiveDate>,
}

/// GET /api/assets/{id}/depreciation
pub async fn asset_depreciation(
    State(books): State<BookServices>,
    Path(id): Path<String>,
    params: Result<Query<DepreciationParams>, axum::extract::rejection::QueryRejection>,
) -> ReportResult<DepreciationReport> {
    let id = parse_id(&id)?;
    let Query(params) = params.map_err(|e| BooksError::bad_request(e.body_text()))?;

    let asset = books
        .assets
        .get(&id)
        .await?
        .filter(|a| !a.is_deleted())
        .ok_or_else(|| BooksError::not_found("asset", id))?;

    let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(ApiResponse::ok(asset.depreciation(as_of))))
}

/// GET /api/loan-accounts/{id}/summary
pub async fn loan_summary(
    State(books): State<BookServices>,
    Path(id): Path<String>,
) -> ReportResult<LoanSummary> {
    let id = parse_id(&id)?;

    let account = books
        .loan_accounts
        .get(&id)
        .await?
        .filter(|a| !a.is_deleted())
        .ok_or_else(|| BooksError::not_found("loan_account", id))?;

    let payments = books
        .interest_payments
        .find_by_field("loanAccountId", &serde_json::json!(id.to_string()))
        .await?
        .into_iter()
        .filter(|p| !p.is_deleted())
        .collect::<Vec<_>>();

    Ok(Json(ApiResponse::ok(account.summary(&payments))))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub clients: usize,
    pub vendors: usize,
    pub assets: usize,
    pub expenses: usize,
    pub raw_materials: usize,
    pub trading_goods: usize,
    pub finished_goods: usize,
    pub loan_accounts: usize,
    pub interest_payments: usize,
    pub payments: usize,
    pub procurements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Sum of client outstanding balances
    pub receivables: f64,
    /// Sum of vendor outstanding balances
    pub payables: f64,
    pub total_expenses: f64,
    pub payments_received: f64,
    pub payments_paid: f64,
    /// Payments received minus payments paid minus expenses
    pub net_cash_flow: f64,
    /// Book value of assets that are not disposed
    pub asset_book_value: f64,
    pub inventory_value: f64,
    /// Principal of active loans
    pub outstanding_loan_principal: f64,
    pub pending_procurement_cost: f64,
    pub counts: RecordCounts,
}

impl Dashboard {
    pub async fn compute(books: &BookServices, as_of: NaiveDate) -> Result<Self, BooksError> {
        let clients = books.clients.all().await?;
        let vendors = books.vendors.all().await?;
        let assets = books.assets.all().await?;
        let expenses = books.expenses.all().await?;
        let raw = books.raw_materials.all().await?;
        let trading = books.trading_goods.all().await?;
        let finished = books.finished_goods.all().await?;
        let loans = books.loan_accounts.all().await?;
        let interest = books.interest_payments.all().await?;
        let payments = books.payments.all().await?;
        let procurements = books.procurements.all().await?;

        let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();
        let sum_direction = |direction: PaymentDirection| -> f64 {
            payments
                .iter()
                .filter(|p| p.direction == direction)
                .map(|p| p.amount)
                .sum()
        };
        let payments_received = sum_direction(PaymentDirection::Received);
        let payments_paid = sum_direction(PaymentDirection::Paid);
        let net_payments: f64 = payments.iter().map(Payment::signed_amount).sum();

        let asset_book_value: f64 = assets
            .iter()
            .filter(|a| a.status != AssetStatus::Disposed)
            .map(|a| a.book_value(as_of))
            .sum();

        Ok(Self {
            receivables: round2(clients.iter().map(|c| c.outstanding_balance).sum()),
            payables: round2(vendors.iter().map(|v| v.outstanding_balance).sum()),
            total_expenses: round2(total_expenses),
            payments_received: round2(payments_received),
            payments_paid: round2(payments_paid),
            net_cash_flow: round2(net_payments - total_expenses),
            asset_book_value: round2(asset_book_value),
            inventory_value: InventorySummary::compute(&raw, &trading, &finished).total_value,
            outstanding_loan_principal: round2(
                loans
                    .iter()
                    .filter(|l| l.status == LoanStatus::Active)
                    .map(|l| l.principal)
                    .sum(),
            ),
            pending_procurement_cost: round2(
                procurements
                    .iter()
                    .filter(|p| p.status == ProcurementStatus::Ordered)
                    .map(|p| p.total_cost)
                    .sum(),
            ),
            counts: RecordCounts {
                clients: clients.len(),
                vendors: vendors.len(),
                assets: assets.len(),
                expenses: expenses.len(),
                raw_materials: raw.len(),
                trading_goods: trading.len(),
                finished_goods: finished.len(),
                loan_accounts: loans.len(),
                interest_payments: interest.len(),
                payments: payments.len(),
                procurements: procurements.len(),
            },
        })
    }
}

/// GET /api/dashboard
pub async fn dashboard(State(books): State<BookServices>) -> ReportResult<Dashboard> {
    let as_of = Utc::now().date_naive();
    Ok(Json(ApiResponse::ok(Dashboard::compute(&books, as_of).await?)))
}
