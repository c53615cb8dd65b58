//! Generic CRUD handlers shared by every resource
//!
//! Each resource gets the same five routes:
//!
//! ```text
//! GET    /api/{segment}        -> handle_get_all
//! POST   /api/{segment}        -> handle_create
//! GET    /api/{segment}/{id}   -> handle_get_by_id
//! PUT    /api/{segment}/{id}   -> handle_update
//! DELETE /api/{segment}/{id}   -> handle_delete
//! ```

use crate::config::PaginationConfig;
use crate::core::entity::{BASE_FIELDS, Resource};
use crate::core::error::BooksError;
use crate::core::query::{ItemQuery, ListQuery, PaginationMeta};
use crate::core::response::ApiResponse;
use crate::core::service::DataService;
use crate::core::timestamp;
use crate::server::resolver::ReferenceResolver;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Per-resource state handed to the generic handlers
pub struct ResourceState<T: Resource> {
    pub service: Arc<dyn DataService<T>>,
    pub resolver: Arc<ReferenceResolver>,
    pub pagination: PaginationConfig,
}

impl<T: Resource> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            resolver: self.resolver.clone(),
            pagination: self.pagination.clone(),
        }
    }
}

type JsonResult = Result<Json<ApiResponse<Value>>, BooksError>;

/// Parse a record id taken from the URL
pub fn parse_id(raw: &str) -> Result<Uuid, BooksError> {
    Uuid::parse_str(raw.trim()).map_err(|_| BooksError::InvalidId(raw.to_string()))
}

fn to_json<S: Serialize>(value: &S) -> Result<Value, BooksError> {
    serde_json::to_value(value).map_err(|e| BooksError::Storage(e.into()))
}

fn body_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, BooksError> {
    let Json(body) = body.map_err(|e| BooksError::bad_request(e.body_text()))?;
    match body {
        Value::Object(object) => Ok(object),
        _ => Err(BooksError::bad_request("Request body must be a JSON object")),
    }
}

fn from_json<T: Resource>(record: Map<String, Value>) -> Result<T, BooksError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        BooksError::bad_request(format!("Invalid {}: {}", T::resource_name_singular(), e))
    })
}

async fn find_live<T: Resource>(
    service: &Arc<dyn DataService<T>>,
    id: &Uuid,
) -> Result<T, BooksError> {
    service
        .get(id)
        .await?
        .filter(|record| !record.is_deleted())
        .ok_or_else(|| BooksError::not_found(T::resource_name_singular(), id))
}

/// Reject `record` when one of its unique fields is already taken by another
/// record, soft-deleted records included
async fn ensure_unique<T: Resource>(
    service: &Arc<dyn DataService<T>>,
    record: &Value,
    own_id: Option<Uuid>,
) -> Result<(), BooksError> {
    for field in T::unique_fields() {
        let value = match record.get(*field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(value) => value,
        };

        let taken = service
            .find_by_field(field, value)
            .await?
            .iter()
            .any(|existing| Some(existing.id()) != own_id);

        if taken {
            return Err(BooksError::Duplicate {
                resource: T::resource_name_singular().to_string(),
                field: field.to_string(),
                value: value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
            });
        }
    }
    Ok(())
}

/// Run normalization, validation, reference and uniqueness checks, returning
/// the JSON form of the record ready to be stored
async fn prepare_for_write<T: Resource>(
    state: &ResourceState<T>,
    record: &mut T,
    own_id: Option<Uuid>,
) -> Result<Value, BooksError> {
    record.prepare()?;
    let json = to_json(record)?;
    state.resolver.check::<T>(&json).await?;
    ensure_unique(&state.service, &json, own_id).await?;
    Ok(json)
}

/// GET /api/{segment}
pub async fn handle_get_all<T: Resource>(
    State(state): State<ResourceState<T>>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult {
    let query = ListQuery::from_params::<T>(&params, &state.pagination)?;
    let page = state.service.list(&query).await?;

    let mut items = page
        .items
        .iter()
        .map(to_json)
        .collect::<Result<Vec<_>, _>>()?;
    if query.populate {
        state.resolver.populate::<T>(&mut items).await?;
    }

    let meta = PaginationMeta::new(query.page, query.limit, page.total);
    Ok(Json(ApiResponse::paginated(Value::Array(items), meta)))
}

/// GET /api/{segment}/{id}
pub async fn handle_get_by_id<T: Resource>(
    State(state): State<ResourceState<T>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult {
    let id = parse_id(&id)?;
    let flags = ItemQuery::from_params(&params)?;
    let record = find_live(&state.service, &id).await?;

    let mut items = [to_json(&record)?];
    if flags.populate {
        state.resolver.populate::<T>(&mut items).await?;
    }
    let [json] = items;
    Ok(Json(ApiResponse::ok(json)))
}

/// POST /api/{segment}
pub async fn handle_create<T: Resource>(
    State(state): State<ResourceState<T>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), BooksError> {
    let mut object = body_object(body)?;
    for field in BASE_FIELDS {
        object.remove(*field);
    }

    let now = timestamp::format(&timestamp::now());
    object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    object.insert("createdAt".into(), Value::String(now.clone()));
    object.insert("updatedAt".into(), Value::String(now));

    let mut record: T = from_json(object)?;
    prepare_for_write(&state, &mut record, None).await?;

    let created = state.service.create(record).await?;
    tracing::info!(
        resource = T::resource_name_singular(),
        id = %created.id(),
        "record created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(to_json(&created)?))))
}

/// PUT /api/{segment}/{id}
///
/// Fields present in the body replace the stored ones; base fields are kept.
pub async fn handle_update<T: Resource>(
    State(state): State<ResourceState<T>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = parse_id(&id)?;
    let patch = body_object(body)?;
    let existing = find_live(&state.service, &id).await?;

    let mut object = match to_json(&existing)? {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if !BASE_FIELDS.contains(&key.as_str()) {
            object.insert(key, value);
        }
    }
    object.insert(
        "updatedAt".into(),
        Value::String(timestamp::format(&timestamp::now())),
    );

    let mut record: T = from_json(object)?;
    prepare_for_write(&state, &mut record, Some(id)).await?;

    let updated = state.service.update(&id, record).await?;
    tracing::info!(resource = T::resource_name_singular(), id = %id, "record updated");
    Ok(Json(ApiResponse::ok(to_json(&updated)?)))
}

/// DELETE /api/{segment}/{id}
///
/// Soft delete unless `?hard=true`. A hard delete also purges records that
/// were already soft-deleted.
pub async fn handle_delete<T: Resource>(
    State(state): State<ResourceState<T>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult {
    let id = parse_id(&id)?;
    let flags = ItemQuery::from_params(&params)?;

    let mut record = state
        .service
        .get(&id)
        .await?
        .filter(|record| flags.hard || !record.is_deleted())
        .ok_or_else(|| BooksError::not_found(T::resource_name_singular(), id))?;

    if flags.hard {
        if !state.service.delete(&id).await? {
            return Err(BooksError::not_found(T::resource_name_singular(), id));
        }
        tracing::info!(resource = T::resource_name_singular(), id = %id, "record deleted");
    } else {
        record.mark_deleted(timestamp::now());
        record = state.service.update(&id, record).await?;
        tracing::info!(resource = T::resource_name_singular(), id = %id, "record soft-deleted");
    }

    Ok(Json(ApiResponse::ok(to_json(&record)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::Client;
    use crate::storage::InMemoryDataService;
    use serde_json::json;

    fn state() -> ResourceState<Client> {
        ResourceState {
            service: Arc::new(InMemoryDataService::new()),
            resolver: Arc::new(ReferenceResolver::new(HashMap::new())),
            pagination: PaginationConfig::default(),
        }
    }

    async fn create(state: &ResourceState<Client>, body: Value) -> Result<Value, BooksError> {
        let (status, Json(response)) =
            handle_create(State(state.clone()), Ok(Json(body))).await?;
        assert_eq!(status, StatusCode::CREATED);
        Ok(response.data)
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("42"), Err(BooksError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_create_ignores_system_fields() {
        let state = state();
        let forged = Uuid::new_v4();
        let data = create(
            &state,
            json!({"id": forged, "name": "Acme", "createdAt": "1999-01-01T00:00:00Z", "deletedAt": "2000-01-01T00:00:00Z"}),
        )
        .await
        .unwrap();

        assert_ne!(data["id"], json!(forged));
        assert_ne!(data["createdAt"], "1999-01-01T00:00:00Z");
        assert_eq!(data["deletedAt"], Value::Null);
    }

    #[tokio::test]
    async fn test_create_rejects_non_objects_and_duplicates() {
        let state = state();
        let err = handle_create(State(state.clone()), Ok(Json(json!([1, 2]))))
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::BadRequest(_)));

        create(&state, json!({"name": "A", "email": "a@x.io"})).await.unwrap();
        let err = create(&state, json!({"name": "B", "email": " A@X.io "}))
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::Duplicate { .. }));

        // blank emails never collide
        create(&state, json!({"name": "C", "email": ""})).await.unwrap();
        create(&state, json!({"name": "D", "email": ""})).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_base_fields() {
        let state = state();
        let data = create(&state, json!({"name": "Acme", "phone": "123"})).await.unwrap();
        let id = data["id"].as_str().unwrap().to_string();

        let Json(response) = handle_update(
            State(state.clone()),
            Path(id.clone()),
            Ok(Json(json!({"company": "Acme Ltd", "id": Uuid::new_v4()}))),
        )
        .await
        .unwrap();

        assert_eq!(response.data["id"], json!(id));
        assert_eq!(response.data["phone"], "123");
        assert_eq!(response.data["company"], "Acme Ltd");
        assert_eq!(response.data["createdAt"], data["createdAt"]);
    }

    #[tokio::test]
    async fn test_update_allows_own_unique_value() {
        let state = state();
        let data = create(&state, json!({"name": "Acme", "email": "hi@acme.io"})).await.unwrap();
        let id = data["id"].as_str().unwrap().to_string();

        handle_update(
            State(state.clone()),
            Path(id),
            Ok(Json(json!({"email": "HI@acme.io", "name": "Acme 2"}))),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_soft_then_hard_delete() {
        let state = state();
        let data = create(&state, json!({"name": "Acme"})).await.unwrap();
        let id = data["id"].as_str().unwrap().to_string();

        let Json(response) =
            handle_delete(State(state.clone()), Path(id.clone()), Query(HashMap::new()))
                .await
                .unwrap();
        assert!(response.data["deletedAt"].is_string());

        let err = handle_get_by_id(State(state.clone()), Path(id.clone()), Query(HashMap::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::NotFound { .. }));

        let hard = HashMap::from([("hard".to_string(), "true".to_string())]);
        handle_delete(State(state.clone()), Path(id.clone()), Query(hard.clone()))
            .await
            .unwrap();
        let err = handle_delete(State(state.clone()), Path(id), Query(hard))
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::NotFound { .. }));
    }
}
