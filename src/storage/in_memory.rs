//! In-memory implementation of DataService for testing and development

use crate::core::entity::Resource;
use crate::core::query::{ListQuery, Page, SortDirection};
use crate::core::service::DataService;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory data service implementation
///
/// Filtering, search and sorting run over the JSON form of each record so
/// they see the same camelCase field names as the MongoDB backend.
#[derive(Clone)]
pub struct InMemoryDataService<T> {
    records: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T> InMemoryDataService<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> InMemoryDataService<T> {
    fn snapshot(&self, include_deleted: bool) -> Result<Vec<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .values()
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl<T: Resource> DataService<T> for InMemoryDataService<T> {
    async fn create(&self, entity: T) -> Result<T> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if records.contains_key(&entity.id()) {
            return Err(anyhow!(
                "{} {} already exists",
                T::resource_name_singular(),
                entity.id()
            ));
        }

        records.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.get(id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<T>> {
        let mut rows = Vec::new();
        for entity in self.snapshot(query.include_deleted)? {
            let json = serde_json::to_value(&entity)?;
            rows.push((json, entity));
        }

        rows.retain(|(json, _)| {
            query
                .filters
                .iter()
                .all(|(field, raw)| matches_filter(json.get(field), raw))
        });

        if let Some(term) = &query.search {
            let needle = term.to_lowercase();
            rows.retain(|(json, _)| {
                T::search_fields().iter().any(|field| {
                    json.get(*field)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            });
        }

        let field = query.sort.field.as_str();
        rows.sort_by(|(a, ea), (b, eb)| {
            let ordering = compare_json(a.get(field), b.get(field));
            let ordering = match query.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then_with(|| ea.id().cmp(&eb.id()))
        });

        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .map(|(_, entity)| entity)
            .collect();

        Ok(Page { items, total })
    }

    async fn update(&self, id: &Uuid, entity: T) -> Result<T> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let slot = records
            .get_mut(id)
            .ok_or_else(|| anyhow!("{} not found: {}", T::resource_name_singular(), id))?;
        *slot = entity.clone();

        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(records.remove(id).is_some())
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let mut found = Vec::new();
        for entity in self.snapshot(true)? {
            if serde_json::to_value(&entity)?.get(field) == Some(value) {
                found.push(entity);
            }
        }
        Ok(found)
    }

    async fn all(&self) -> Result<Vec<T>> {
        self.snapshot(false)
    }
}

/// Match a stored JSON value against a raw query-string value.
///
/// Numbers compare numerically, booleans by `true`/`false`, `null` matches
/// missing or null fields, and arrays match when any element matches.
pub(crate) fn matches_filter(value: Option<&Value>, raw: &str) -> bool {
    match value {
        None | Some(Value::Null) => raw == "null",
        Some(Value::String(s)) => s == raw,
        Some(Value::Number(n)) => match (n.as_f64(), raw.parse::<f64>()) {
            (Some(stored), Ok(wanted)) => stored == wanted,
            _ => false,
        },
        Some(Value::Bool(b)) => raw.parse::<bool>().is_ok_and(|wanted| *b == wanted),
        Some(Value::Array(items)) => items.iter().any(|item| matches_filter(Some(item), raw)),
        Some(Value::Object(_)) => false,
    }
}

/// Total order over JSON values: null < numbers < strings < others < booleans
pub(crate) fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
            Some(Value::Bool(_)) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
