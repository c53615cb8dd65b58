//! Entity traits defining the core abstraction for all bookkeeping records

use crate::core::error::BooksError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

/// JSON names of the base fields every record carries
pub const BASE_FIELDS: &[&str] = &["id", "createdAt", "updatedAt", "deletedAt"];

/// Base trait for all records stored by the service.
///
/// All entities have:
/// - id: Unique identifier, generated on create
/// - createdAt / updatedAt: timestamps managed by the CRUD helpers
/// - deletedAt: soft deletion timestamp (optional)
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The plural resource name, used as the collection name (e.g., "raw_materials")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "raw_material")
    fn resource_name_singular() -> &'static str;

    /// URL segment under `/api` (e.g., "raw-materials")
    fn route_segment() -> String {
        Self::resource_name().replace('_', "-")
    }

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp the record as soft-deleted
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    /// Check if the entity has been soft-deleted
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// A foreign key from one resource to another.
///
/// `field` holds the referenced id (or a list of ids when `many` is set).
/// When populating, the referenced document is embedded under `populate_as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub resource: &'static str,
    pub populate_as: &'static str,
    pub many: bool,
}

impl Reference {
    pub const fn one(field: &'static str, resource: &'static str, populate_as: &'static str) -> Self {
        Self {
            field,
            resource,
            populate_as,
            many: false,
        }
    }

    pub const fn many(field: &'static str, resource: &'static str, populate_as: &'static str) -> Self {
        Self {
            field,
            resource,
            populate_as,
            many: true,
        }
    }

    /// Collect the ids held by this reference in a serialized record.
    ///
    /// Null or missing values yield nothing; non-UUID strings are returned as errors.
    pub fn ids_in(&self, record: &serde_json::Value) -> Result<Vec<Uuid>, BooksError> {
        let parse = |value: &serde_json::Value| -> Result<Option<Uuid>, BooksError> {
            match value {
                serde_json::Value::Null => Ok(None),
                serde_json::Value::String(s) => Uuid::parse_str(s)
                    .map(Some)
                    .map_err(|_| BooksError::field(self.field, format!("'{}' is not a valid id", s))),
                _ => Err(BooksError::field(self.field, "must be an id string")),
            }
        };

        match record.get(self.field) {
            None => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) if self.many => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(id) = parse(item)? {
                        ids.push(id);
                    }
                }
                Ok(ids)
            }
            Some(value) => Ok(parse(value)?.into_iter().collect()),
        }
    }
}

/// Per-resource business rules applied by the create and update helpers.
///
/// Both hooks run after the payload has been deserialized and before the
/// record is written.
pub trait Lifecycle {
    /// Fill derived fields and canonicalize values (trim, lowercase emails, ...)
    fn normalize(&mut self) {}

    /// Cross-field rules that `validator` attributes cannot express
    fn check_rules(&self) -> Result<(), BooksError> {
        Ok(())
    }
}

/// A record type exposed through the generic CRUD helpers.
///
/// Usually generated by `impl_resource!`.
pub trait Resource: Entity + Lifecycle + Validate {
    /// Fields that must be unique across non-deleted records
    fn unique_fields() -> &'static [&'static str];

    /// Fields matched by the `search` query parameter
    fn search_fields() -> &'static [&'static str];

    /// Extra fields usable as exact-match filters and sort keys
    fn filter_fields() -> &'static [&'static str];

    /// Foreign keys to other resources
    fn references() -> &'static [Reference];

    /// Whether `field` can be used in a filter or as a sort key
    fn is_queryable(field: &str) -> bool {
        BASE_FIELDS.contains(&field)
            || Self::unique_fields().contains(&field)
            || Self::search_fields().contains(&field)
            || Self::filter_fields().contains(&field)
            || Self::references().iter().any(|r| r.field == field)
    }

    /// Run normalization, field validation and business rules in order
    fn prepare(&mut self) -> Result<(), BooksError> {
        self.normalize();
        self.validate()?;
        self.check_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, Serialize, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct TestEntity {
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
        #[validate(length(min = 1))]
        name: String,
        owner_id: Option<Uuid>,
    }

    impl Entity for TestEntity {
        fn resource_name() -> &'static str {
            "test_entities"
        }

        fn resource_name_singular() -> &'static str {
            "test_entity"
        }

        fn id(&self) -> Uuid {
            self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }

        fn mark_deleted(&mut self, at: DateTime<Utc>) {
            self.deleted_at = Some(at);
            self.updated_at = at;
        }
    }

    impl Lifecycle for TestEntity {
        fn normalize(&mut self) {
            self.name = self.name.trim().to_string();
        }
    }

    impl Resource for TestEntity {
        fn unique_fields() -> &'static [&'static str] {
            &["name"]
        }

        fn search_fields() -> &'static [&'static str] {
            &[]
        }

        fn filter_fields() -> &'static [&'static str] {
            &[]
        }

        fn references() -> &'static [Reference] {
            const REFS: &[Reference] = &[Reference::one("ownerId", "client", "owner")];
            REFS
        }
    }

    fn entity(name: &str) -> TestEntity {
        let now = Utc::now();
        TestEntity {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: name.to_string(),
            owner_id: None,
        }
    }

    #[test]
    fn test_entity_is_deleted() {
        let mut e = entity("desk");
        assert!(!e.is_deleted());

        e.mark_deleted(Utc::now());
        assert!(e.is_deleted());
    }

    #[test]
    fn test_route_segment_uses_dashes() {
        assert_eq!(TestEntity::route_segment(), "test-entities");
    }

    #[test]
    fn test_queryable_fields() {
        assert!(TestEntity::is_queryable("createdAt"));
        assert!(TestEntity::is_queryable("name"));
        assert!(TestEntity::is_queryable("ownerId"));
        assert!(!TestEntity::is_queryable("$where"));
    }

    #[test]
    fn test_prepare_normalizes_then_validates() {
        let mut e = entity("  chair ");
        e.prepare().unwrap();
        assert_eq!(e.name, "chair");

        let mut blank = entity("   ");
        assert!(matches!(blank.prepare(), Err(BooksError::Validation(_))));
    }

    #[test]
    fn test_reference_ids_in() {
        let id = Uuid::new_v4();
        let single = Reference::one("ownerId", "client", "owner");
        assert_eq!(single.ids_in(&json!({"ownerId": id.to_string()})).unwrap(), vec![id]);
        assert!(single.ids_in(&json!({"ownerId": null})).unwrap().is_empty());
        assert!(single.ids_in(&json!({})).unwrap().is_empty());
        assert!(single.ids_in(&json!({"ownerId": "nope"})).is_err());

        let many = Reference::many("partIds", "raw_material", "parts");
        let other = Uuid::new_v4();
        let ids = many
            .ids_in(&json!({"partIds": [id.to_string(), other.to_string()]}))
            .unwrap();
        assert_eq!(ids, vec![id, other]);
    }
}
