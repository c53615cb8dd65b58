//! Reference checks and population across resources
//!
//! The resolver only knows resources by their singular type name and talks to
//! them through [`EntityFetcher`], so handlers for one resource can look up
//! records of another without knowing its concrete type.

use crate::core::entity::{Reference, Resource};
use crate::core::error::BooksError;
use crate::core::module::EntityFetcher;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct ReferenceResolver {
    fetchers: HashMap<String, Arc<dyn EntityFetcher>>,
}

impl ReferenceResolver {
    pub fn new(fetchers: HashMap<String, Arc<dyn EntityFetcher>>) -> Self {
        Self { fetchers }
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    fn fetcher(&self, reference: &Reference) -> Result<&Arc<dyn EntityFetcher>, BooksError> {
        self.fetchers.get(reference.resource).ok_or_else(|| {
            BooksError::Storage(anyhow::anyhow!(
                "no fetcher registered for '{}'",
                reference.resource
            ))
        })
    }

    /// Reject `record` if any of its references point to a missing or
    /// soft-deleted record
    pub async fn check<T: Resource>(&self, record: &Value) -> Result<(), BooksError> {
        for reference in T::references() {
            let ids = reference.ids_in(record)?;
            if ids.is_empty() {
                continue;
            }

            let fetcher = self.fetcher(reference)?;
            for id in ids {
                if fetcher.fetch_as_json(&id).await?.is_none() {
                    return Err(BooksError::InvalidReference {
                        field: reference.field.to_string(),
                        resource: reference.resource.to_string(),
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Embed referenced records under each reference's `populate_as` key.
    ///
    /// A dangling single reference becomes `null`; dangling entries of a list
    /// reference are left out.
    pub async fn populate<T: Resource>(&self, records: &mut [Value]) -> Result<(), BooksError> {
        let mut cache: HashMap<(&'static str, Uuid), Option<Value>> = HashMap::new();

        for reference in T::references() {
            let fetcher = self.fetcher(reference)?;

            for record in records.iter_mut() {
                // stored ids were checked on write, anything unparsable is treated as dangling
                let ids = reference.ids_in(record).unwrap_or_default();

                let mut found = Vec::with_capacity(ids.len());
                for id in ids {
                    let key = (reference.resource, id);
                    let value = match cache.get(&key) {
                        Some(hit) => hit.clone(),
                        None => {
                            let fetched = fetcher.fetch_as_json(&id).await?;
                            cache.insert(key, fetched.clone());
                            fetched
                        }
                    };
                    found.push(value);
                }

                let embedded = if reference.many {
                    Value::Array(found.into_iter().flatten().collect())
                } else {
                    found.into_iter().flatten().next().unwrap_or(Value::Null)
                };

                if let Some(object) = record.as_object_mut() {
                    object.insert(reference.populate_as.to_string(), embedded);
                }
            }
        }
        Ok(())
    }
}
