//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Storage model
//!
//! Each resource gets its own collection named after `T::resource_name()`
//! (e.g., "clients", "raw_materials").
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are stored as
//! strings. The `id` field is mapped to MongoDB's `_id` convention.

use crate::core::entity::Resource;
use crate::core::error::BooksError;
use crate::core::query::{ListQuery, Page, SortDirection};
use crate::core::service::DataService;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id`.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value, renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

fn duplicate_key_message(err: &mongodb::error::Error) -> Option<&str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY => {
            Some(e.message.as_str())
        }
        ErrorKind::Command(e) if e.code == DUPLICATE_KEY => Some(e.message.as_str()),
        _ => None,
    }
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// Map an API field name to its document key
fn field_key(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// BSON values a raw query-string value may be stored as.
///
/// Query parameters are always strings while documents keep native BSON types,
/// so a filter matches any of the plausible typed variants.
fn filter_variants(raw: &str) -> Vec<Bson> {
    let mut variants = vec![Bson::String(raw.to_string())];

    match raw {
        "true" => variants.push(Bson::Boolean(true)),
        "false" => variants.push(Bson::Boolean(false)),
        "null" => variants.push(Bson::Null),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                variants.push(Bson::Int64(i));
            }
            if let Ok(f) = raw.parse::<f64>() {
                variants.push(Bson::Double(f));
            }
        }
    }

    variants
}

/// Build the MongoDB filter document for a list query
fn build_filter(query: &ListQuery, search_fields: &[&str]) -> Document {
    let mut filter = Document::new();

    if !query.include_deleted {
        filter.insert("deletedAt", Bson::Null);
    }

    for (field, raw) in &query.filters {
        filter.insert(field_key(field), doc! { "$in": filter_variants(raw) });
    }

    if let Some(term) = &query.search
        && !search_fields.is_empty()
    {
        let pattern = regex::escape(term);
        let clauses: Vec<Bson> = search_fields
            .iter()
            .map(|field| Bson::Document(doc! { *field: { "$regex": pattern.clone(), "$options": "i" } }))
            .collect();
        filter.insert("$or", clauses);
    }

    filter
}

fn build_sort(query: &ListQuery) -> Document {
    let direction = match query.sort.direction {
        SortDirection::Asc => 1,
        SortDirection::Desc => -1,
    };
    let mut sort = doc! { field_key(&query.sort.field): direction };
    if query.sort.field != "id" {
        sort.insert("_id", 1);
    }
    sort
}

// ---------------------------------------------------------------------------
// MongoDataService<T>
// ---------------------------------------------------------------------------

/// Generic data storage service backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use pocketbooks::storage::MongoDataService;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let service = MongoDataService::<Client>::new(client.database("pocketbooks"));
/// service.ensure_indexes().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoDataService<T> {
    database: Database,
    _marker: std::marker::PhantomData<T>,
}

impl<T> MongoDataService<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Resource> MongoDataService<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    /// Turn a duplicate key error into [`BooksError::Duplicate`], naming the
    /// unique field whose index (`<field>_1`) was violated
    fn write_error(entity: &T, err: mongodb::error::Error, action: &str) -> anyhow::Error {
        let Some(message) = duplicate_key_message(&err) else {
            return anyhow!("Failed to {} {}: {}", action, T::resource_name_singular(), err);
        };

        let json = serde_json::to_value(entity).unwrap_or_default();
        let (field, value) = T::unique_fields()
            .iter()
            .find(|field| message.contains(&format!("{}_1", field)))
            .map(|field| {
                let value = match json.get(*field) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                (field.to_string(), value)
            })
            .unwrap_or_else(|| ("id".to_string(), entity.id().to_string()));

        BooksError::Duplicate {
            resource: T::resource_name_singular().to_string(),
            field,
            value,
        }
        .into()
    }

    fn entity_to_document(entity: &T) -> Result<Document> {
        let json = serde_json::to_value(entity)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", T::resource_name_singular(), e))?;
        json_to_document(json)
    }

    fn document_to_entity(doc: Document) -> Result<T> {
        let json = document_to_json(doc);
        serde_json::from_value(json).map_err(|e| {
            anyhow!(
                "Failed to deserialize {} from document: {}",
                T::resource_name_singular(),
                e
            )
        })
    }

    async fn collect(&self, cursor: mongodb::Cursor<Document>) -> Result<Vec<T>> {
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;

        docs.into_iter().map(Self::document_to_entity).collect()
    }

    /// Create unique indexes for the resource's unique fields and an index on
    /// `deletedAt`.
    ///
    /// Unique indexes are partial (string values only) so several records may
    /// leave an optional unique field empty. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let mut indexes = vec![IndexModel::builder().keys(doc! { "deletedAt": 1 }).build()];

        for field in T::unique_fields() {
            let options = IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { *field: { "$type": "string" } })
                .build();
            indexes.push(
                IndexModel::builder()
                    .keys(doc! { *field: 1 })
                    .options(options)
                    .build(),
            );
        }

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(|e| anyhow!("Failed to create indexes on {}: {}", T::resource_name(), e))?;

        Ok(())
    }
}

#[async_trait]
impl<T: Resource> DataService<T> for MongoDataService<T> {
    async fn create(&self, entity: T) -> Result<T> {
        let doc = Self::entity_to_document(&entity)?;
        let id_bson = uuid_bson(&entity.id());

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| Self::write_error(&entity, e, "create"))?;

        let stored = self
            .collection()
            .find_one(doc! { "_id": id_bson })
            .await
            .map_err(|e| anyhow!("Failed to read back created record: {}", e))?
            .ok_or_else(|| anyhow!("Record not found after insert"))?;

        Self::document_to_entity(stored)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", T::resource_name_singular(), e))?;

        doc.map(Self::document_to_entity).transpose()
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<T>> {
        let filter = build_filter(query, T::search_fields());

        let total = self
            .collection()
            .count_documents(filter.clone())
            .await
            .map_err(|e| anyhow!("Failed to count {}: {}", T::resource_name(), e))?;

        let offset = query.offset() as u64;
        if offset >= total {
            return Ok(Page {
                items: Vec::new(),
                total: total as usize,
            });
        }

        let cursor = self
            .collection()
            .find(filter)
            .sort(build_sort(query))
            .skip(offset)
            .limit(query.limit as i64)
            .await
            .map_err(|e| anyhow!("Failed to list {}: {}", T::resource_name(), e))?;

        Ok(Page {
            items: self.collect(cursor).await?,
            total: total as usize,
        })
    }

    async fn update(&self, id: &Uuid, entity: T) -> Result<T> {
        let doc = Self::entity_to_document(&entity)?;
        let id_bson = uuid_bson(id);

        let result = self
            .collection()
            .replace_one(doc! { "_id": &id_bson }, doc)
            .await
            .map_err(|e| Self::write_error(&entity, e, "update"))?;

        if result.matched_count == 0 {
            return Err(anyhow!("{} not found: {}", T::resource_name_singular(), id));
        }

        let updated = self
            .collection()
            .find_one(doc! { "_id": id_bson })
            .await
            .map_err(|e| anyhow!("Failed to read back updated record: {}", e))?
            .ok_or_else(|| anyhow!("Record not found after update"))?;

        Self::document_to_entity(updated)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete {}: {}", T::resource_name_singular(), e))?;

        Ok(result.deleted_count > 0)
    }

    async fn find_by_field(&self, field: &str, value: &serde_json::Value) -> Result<Vec<T>> {
        let value = mongodb::bson::to_bson(value)
            .map_err(|e| anyhow!("Failed to convert lookup value to BSON: {}", e))?;

        let cursor = self
            .collection()
            .find(doc! { field_key(field): value })
            .await
            .map_err(|e| anyhow!("Failed to look up {} by {}: {}", T::resource_name(), field, e))?;

        self.collect(cursor).await
    }

    async fn all(&self) -> Result<Vec<T>> {
        let cursor = self
            .collection()
            .find(doc! { "deletedAt": Bson::Null })
            .await
            .map_err(|e| anyhow!("Failed to load {}: {}", T::resource_name(), e))?;

        self.collect(cursor).await
    }
}
