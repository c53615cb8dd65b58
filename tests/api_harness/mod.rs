//! Shared HTTP test harness.
//!
//! `api_contract_tests!` generates the CRUD contract suite for one storage
//! backend. The server factory passed to the macro must evaluate to an
//! `axum_test::TestServer` built over empty storage.

#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use pocketbooks::books::{BookServices, BookkeepingModule};
use pocketbooks::config::PaginationConfig;
use pocketbooks::server::ServerBuilder;
use serde_json::Value;

/// Build a test server exposing the bookkeeping module over `services`
pub fn build_server(services: BookServices) -> TestServer {
    let router = ServerBuilder::new()
        .with_pagination(PaginationConfig {
            default_limit: 20,
            max_limit: 50,
        })
        .register_module(BookkeepingModule::new(services))
        .unwrap()
        .build()
        .unwrap();
    TestServer::new(router)
}

/// POST `body` to `path`, assert 201 and return the created record
pub async fn create(server: &TestServer, path: &str, body: Value) -> Value {
    let response = server.post(path).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let envelope: Value = response.json();
    assert_eq!(envelope["success"], true);
    envelope["data"].clone()
}

pub fn id_of(record: &Value) -> String {
    record["id"].as_str().expect("record has an id").to_string()
}

/// Generate the CRUD contract suite for a storage backend.
///
/// # Generated Tests
///
/// - create / get / update / delete round-trips and their envelopes
/// - pagination, filters, sort and search on list endpoints
/// - validation, duplicate and reference errors (400) and missing records (404)
/// - soft delete, `includeDeleted` and hard delete
/// - population of single and list references
#[macro_export]
macro_rules! api_contract_tests {
    ($server_factory:expr) => {
        mod api_contract_tests {
            use super::*;
            use crate::api_harness::{create, id_of};
            use axum::http::StatusCode;
            use serde_json::{Value, json};

            async fn make_server() -> axum_test::TestServer {
                $server_factory
            }

            fn expense(title: &str, category: &str, amount: f64) -> Value {
                json!({
                    "title": title,
                    "category": category,
                    "amount": amount,
                    "date": "2024-05-01"
                })
            }

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_create_returns_envelope() {
                let server = make_server().await;

                let response = server
                    .post("/api/clients")
                    .json(&json!({
                        "name": "Jane Doe",
                        "email": "Jane@Example.com",
                        "company": "Doe & Co"
                    }))
                    .await;

                response.assert_status(StatusCode::CREATED);
                let body: Value = response.json();
                assert_eq!(body["success"], true);
                assert!(body.get("pagination").is_none());

                let data = &body["data"];
                assert_eq!(data["name"], "Jane Doe");
                assert_eq!(data["email"], "jane@example.com");
                assert_eq!(data["outstandingBalance"], 0.0);
                assert_eq!(data["deletedAt"], Value::Null);
                assert_eq!(data["createdAt"], data["updatedAt"]);
                uuid::Uuid::parse_str(data["id"].as_str().unwrap()).unwrap();
            }

            #[tokio::test]
            async fn test_get_by_id() {
                let server = make_server().await;
                let vendor = create(&server, "/api/vendors", json!({"name": "Acme"})).await;

                let response = server.get(&format!("/api/vendors/{}", id_of(&vendor))).await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["success"], true);
                assert_eq!(body["data"]["name"], "Acme");
                assert_eq!(body["data"]["id"], vendor["id"]);
            }

            #[tokio::test]
            async fn test_update_merges_fields() {
                let server = make_server().await;
                let asset = create(
                    &server,
                    "/api/assets",
                    json!({
                        "name": "Laptop",
                        "category": "it",
                        "purchaseDate": "2024-01-10",
                        "purchaseValue": 1500.0
                    }),
                )
                .await;

                let response = server
                    .put(&format!("/api/assets/{}", id_of(&asset)))
                    .json(&json!({"status": "under_maintenance", "createdAt": "2000-01-01T00:00:00Z"}))
                    .await;
                response.assert_status_ok();

                let data = response.json::<Value>()["data"].clone();
                assert_eq!(data["status"], "under_maintenance");
                assert_eq!(data["name"], "Laptop");
                assert_eq!(data["createdAt"], asset["createdAt"]);
                assert!(data["updatedAt"].as_str() >= asset["updatedAt"].as_str());
            }

            #[tokio::test]
            async fn test_blank_optional_text_is_stored_as_null() {
                let server = make_server().await;

                let vendor = create(
                    &server,
                    "/api/vendors",
                    json!({"name": "Acme", "address": " 2 Dock Rd ", "notes": "  "}),
                )
                .await;
                assert_eq!(vendor["address"], "2 Dock Rd");
                assert_eq!(vendor["notes"], Value::Null);

                let loan = create(
                    &server,
                    "/api/loan-accounts",
                    json!({
                        "accountNumber": "LN-N",
                        "lender": "Bank",
                        "principal": 100,
                        "interestRate": 5,
                        "startDate": "2024-01-01",
                        "tenureMonths": 6,
                        "notes": ""
                    }),
                )
                .await;
                assert_eq!(loan["notes"], Value::Null);

                let response = server
                    .put(&format!("/api/vendors/{}", id_of(&vendor)))
                    .json(&json!({"notes": " paid late "}))
                    .await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["data"]["notes"], "paid late");
            }

            #[tokio::test]
            async fn test_update_rejects_invalid_values() {
                let server = make_server().await;
                let e = create(&server, "/api/expenses", expense("Ink", "supplies", 20.0)).await;

                let response = server
                    .put(&format!("/api/expenses/{}", id_of(&e)))
                    .json(&json!({"amount": -3}))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["success"], false);
                assert!(body["details"]["fields"]["amount"].is_array());
            }

            // ==============================================================
            // Errors
            // ==============================================================

            #[tokio::test]
            async fn test_missing_and_invalid_ids() {
                let server = make_server().await;

                let response = server.get(&format!("/api/clients/{}", uuid::Uuid::new_v4())).await;
                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["success"], false);
                assert!(body["error"].as_str().unwrap().contains("not found"));

                server
                    .get("/api/clients/not-a-uuid")
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
                server
                    .put(&format!("/api/clients/{}", uuid::Uuid::new_v4()))
                    .json(&json!({"name": "x"}))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
                server
                    .delete(&format!("/api/clients/{}", uuid::Uuid::new_v4()))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_validation_errors() {
                let server = make_server().await;

                // missing required field
                let response = server.post("/api/clients").json(&json!({"email": "a@b.co"})).await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["success"], false);

                // present but invalid
                let response = server
                    .post("/api/loan-accounts")
                    .json(&json!({
                        "accountNumber": "LN-1",
                        "lender": "Bank",
                        "principal": 0,
                        "interestRate": 120,
                        "startDate": "2024-01-01",
                        "tenureMonths": 12
                    }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert!(body["details"]["fields"]["principal"].is_array());
                assert!(body["details"]["fields"]["interestRate"].is_array());

                // not an object
                server
                    .post("/api/clients")
                    .json(&json!(["Jane"]))
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_duplicates_are_rejected() {
                let server = make_server().await;
                create(&server, "/api/clients", json!({"name": "A", "email": "a@shop.io"})).await;

                let response = server
                    .post("/api/clients")
                    .json(&json!({"name": "B", "email": "A@Shop.io"}))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert!(response.json::<Value>()["error"]
                    .as_str()
                    .unwrap()
                    .contains("already exists"));

                let flour = json!({"name": "Flour", "sku": "RM-001", "unit": "kg"});
                create(&server, "/api/raw-materials", flour.clone()).await;
                server
                    .post("/api/raw-materials")
                    .json(&flour)
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);

                // changing another record onto a taken value fails too
                let other = create(&server, "/api/clients", json!({"name": "C"})).await;
                server
                    .put(&format!("/api/clients/{}", id_of(&other)))
                    .json(&json!({"email": "a@shop.io"}))
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_unique_values_stay_taken_after_soft_delete() {
                let server = make_server().await;
                let first = create(
                    &server,
                    "/api/trading-goods",
                    json!({"name": "Jam", "sku": "TG-1", "unit": "jar"}),
                )
                .await;
                server
                    .delete(&format!("/api/trading-goods/{}", id_of(&first)))
                    .await
                    .assert_status_ok();

                server
                    .post("/api/trading-goods")
                    .json(&json!({"name": "Jam 2", "sku": "TG-1", "unit": "jar"}))
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Listing
            // ==============================================================

            #[tokio::test]
            async fn test_list_pagination() {
                let server = make_server().await;
                for (i, amount) in [10.0, 20.0, 30.0, 40.0, 50.0].iter().enumerate() {
                    create(&server, "/api/expenses", expense(&format!("E{}", i), "misc", *amount)).await;
                }

                let response = server
                    .get("/api/expenses")
                    .add_query_param("page", 2)
                    .add_query_param("limit", 2)
                    .add_query_param("sort", "amount:asc")
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                let amounts: Vec<f64> = body["data"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e["amount"].as_f64().unwrap())
                    .collect();
                assert_eq!(amounts, vec![30.0, 40.0]);
                assert_eq!(
                    body["pagination"],
                    json!({
                        "page": 2,
                        "limit": 2,
                        "total": 5,
                        "totalPages": 3,
                        "hasNext": true,
                        "hasPrev": true
                    })
                );
            }

            #[tokio::test]
            async fn test_list_page_beyond_range_is_empty() {
                let server = make_server().await;
                create(&server, "/api/clients", json!({"name": "Only"})).await;

                let response = server
                    .get("/api/clients")
                    .add_query_param("page", "18446744073709551615")
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["data"], json!([]));
                assert_eq!(body["pagination"]["total"], 1);
                assert_eq!(body["pagination"]["hasNext"], false);
            }

            #[tokio::test]
            async fn test_list_limit_is_capped() {
                let server = make_server().await;
                let response = server.get("/api/clients").add_query_param("limit", 1000).await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["pagination"]["limit"], 50);
            }

            #[tokio::test]
            async fn test_list_filter_sort_and_search() {
                let server = make_server().await;
                create(&server, "/api/expenses", expense("Office rent", "rent", 1200.0)).await;
                create(&server, "/api/expenses", expense("Warehouse rent", "rent", 800.0)).await;
                create(&server, "/api/expenses", expense("Printer ink", "supplies", 45.5)).await;

                let response = server
                    .get("/api/expenses")
                    .add_query_param("category", "rent")
                    .add_query_param("sort", "amount:desc")
                    .await;
                let body: Value = response.json();
                let titles: Vec<&str> = body["data"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e["title"].as_str().unwrap())
                    .collect();
                assert_eq!(titles, vec!["Office rent", "Warehouse rent"]);

                let response = server.get("/api/expenses").add_query_param("amount", "45.5").await;
                assert_eq!(response.json::<Value>()["pagination"]["total"], 1);

                let response = server.get("/api/expenses").add_query_param("search", "RENT").await;
                assert_eq!(response.json::<Value>()["pagination"]["total"], 2);

                // regex metacharacters are matched literally
                let response = server.get("/api/expenses").add_query_param("search", "r.nt").await;
                assert_eq!(response.json::<Value>()["pagination"]["total"], 0);
            }

            #[tokio::test]
            async fn test_list_rejects_unknown_fields() {
                let server = make_server().await;
                server
                    .get("/api/expenses")
                    .add_query_param("password", "x")
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
                server
                    .get("/api/expenses")
                    .add_query_param("sort", "secret:asc")
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
                server
                    .get("/api/expenses")
                    .add_query_param("page", "first")
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Deletion
            // ==============================================================

            #[tokio::test]
            async fn test_soft_delete_hides_records() {
                let server = make_server().await;
                let keep = create(&server, "/api/clients", json!({"name": "Keep"})).await;
                let gone = create(&server, "/api/clients", json!({"name": "Gone"})).await;

                let response = server.delete(&format!("/api/clients/{}", id_of(&gone))).await;
                response.assert_status_ok();
                assert!(response.json::<Value>()["data"]["deletedAt"].is_string());

                server
                    .get(&format!("/api/clients/{}", id_of(&gone)))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
                server
                    .delete(&format!("/api/clients/{}", id_of(&gone)))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);

                let listed: Value = server.get("/api/clients").await.json();
                assert_eq!(listed["pagination"]["total"], 1);
                assert_eq!(listed["data"][0]["id"], keep["id"]);

                let listed: Value = server
                    .get("/api/clients")
                    .add_query_param("includeDeleted", true)
                    .await
                    .json();
                assert_eq!(listed["pagination"]["total"], 2);
            }

            #[tokio::test]
            async fn test_hard_delete_removes_records() {
                let server = make_server().await;
                let gone = create(&server, "/api/clients", json!({"name": "Gone"})).await;

                server
                    .delete(&format!("/api/clients/{}", id_of(&gone)))
                    .add_query_param("hard", true)
                    .await
                    .assert_status_ok();

                let listed: Value = server
                    .get("/api/clients")
                    .add_query_param("includeDeleted", true)
                    .await
                    .json();
                assert_eq!(listed["pagination"]["total"], 0);
            }

            // ==============================================================
            // References
            // ==============================================================

            #[tokio::test]
            async fn test_references_are_checked() {
                let server = make_server().await;
                let mut body = expense("Fuel", "travel", 60.0);
                body["vendorId"] = json!(uuid::Uuid::new_v4());

                let response = server.post("/api/expenses").json(&body).await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert!(response.json::<Value>()["error"]
                    .as_str()
                    .unwrap()
                    .contains("vendorId"));

                server
                    .post("/api/interest-payments")
                    .json(&json!({
                        "loanAccountId": "nope",
                        "amount": 10.0,
                        "paymentDate": "2024-01-01"
                    }))
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_population() {
                let server = make_server().await;
                let vendor = create(&server, "/api/vendors", json!({"name": "Mill Co"})).await;

                let mut body = expense("Flour delivery", "supplies", 90.0);
                body["vendorId"] = vendor["id"].clone();
                let created = create(&server, "/api/expenses", body).await;
                assert!(created.get("vendor").is_none());

                let path = format!("/api/expenses/{}", id_of(&created));
                let populated: Value = server.get(&path).await.json();
                assert_eq!(populated["data"]["vendor"]["name"], "Mill Co");
                assert_eq!(populated["data"]["vendorId"], vendor["id"]);

                let plain: Value = server.get(&path).add_query_param("populate", false).await.json();
                assert!(plain["data"].get("vendor").is_none());

                let listed: Value = server.get("/api/expenses").await.json();
                assert_eq!(listed["data"][0]["vendor"]["id"], vendor["id"]);
            }

            #[tokio::test]
            async fn test_population_of_id_lists() {
                let server = make_server().await;
                let flour = create(
                    &server,
                    "/api/raw-materials",
                    json!({"name": "Flour", "sku": "RM-1", "unit": "kg"}),
                )
                .await;
                let salt = create(
                    &server,
                    "/api/raw-materials",
                    json!({"name": "Salt", "sku": "RM-2", "unit": "kg"}),
                )
                .await;

                let bread = create(
                    &server,
                    "/api/finished-goods",
                    json!({
                        "name": "Bread",
                        "sku": "FG-1",
                        "unit": "loaf",
                        "rawMaterialIds": [flour["id"], salt["id"]]
                    }),
                )
                .await;

                // a dangling reference disappears from the populated list
                server
                    .delete(&format!("/api/raw-materials/{}", id_of(&salt)))
                    .await
                    .assert_status_ok();

                let body: Value = server
                    .get(&format!("/api/finished-goods/{}", id_of(&bread)))
                    .await
                    .json();
                let names: Vec<&str> = body["data"]["rawMaterials"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m["name"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["Flour"]);
                assert_eq!(body["data"]["rawMaterialIds"].as_array().unwrap().len(), 2);
            }
        }
    };
}
