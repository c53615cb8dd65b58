//! Macros for reducing boilerplate when defining resources
//!
//! `impl_resource!` generates the record struct with its base fields and the
//! `Entity` and `Resource` implementations. Business rules stay hand-written
//! through an `impl Lifecycle for ...` block next to the definition.

/// Define a resource type
///
/// # Example
///
/// ```rust,ignore
/// impl_resource!(
///     /// A customer that owes us money
///     Client,
///     "client",
///     unique: ["email"],
///     search: ["name", "email"],
///     filter: [],
///     references: [],
///     {
///         #[validate(length(min = 1))]
///         name: String,
///         email: Option<String>,
///     }
/// );
///
/// impl Lifecycle for Client {}
/// ```
///
/// Field attributes (`#[validate(...)]`, `#[serde(...)]`, doc comments) are
/// passed through unchanged. The struct serializes with camelCase names.
macro_rules! impl_resource {
    (
        $(#[$struct_meta:meta])*
        $type:ident,
        $type_name:expr,
        unique: [ $( $unique:expr ),* $(,)? ],
        search: [ $( $search:expr ),* $(,)? ],
        filter: [ $( $filter:expr ),* $(,)? ],
        references: [ $( $reference:expr ),* $(,)? ],
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_ty:ty ),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::validator::Validate,
        )]
        #[serde(rename_all = "camelCase")]
        pub struct $type {
            pub id: ::uuid::Uuid,

            #[serde(with = "crate::core::timestamp")]
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            #[serde(with = "crate::core::timestamp")]
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            #[serde(default, with = "crate::core::timestamp::option")]
            pub deleted_at: Option<::chrono::DateTime<::chrono::Utc>>,

            $(
                $(#[$field_meta])*
                pub $field : $field_ty,
            )*
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                use std::sync::OnceLock;
                static PLURAL: OnceLock<String> = OnceLock::new();
                PLURAL
                    .get_or_init(|| $crate::core::pluralize::Pluralizer::pluralize($type_name))
                    .as_str()
            }

            fn resource_name_singular() -> &'static str {
                $type_name
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn deleted_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.deleted_at
            }

            fn mark_deleted(&mut self, at: ::chrono::DateTime<::chrono::Utc>) {
                self.deleted_at = Some(at);
                self.updated_at = at;
            }
        }

        impl $crate::core::entity::Resource for $type {
            fn unique_fields() -> &'static [&'static str] {
                &[ $( $unique ),* ]
            }

            fn search_fields() -> &'static [&'static str] {
                &[ $( $search ),* ]
            }

            fn filter_fields() -> &'static [&'static str] {
                &[ $( $filter ),* ]
            }

            fn references() -> &'static [$crate::core::entity::Reference] {
                const REFS: &[$crate::core::entity::Reference] = &[ $( $reference ),* ];
                REFS
            }
        }
    };
}

pub(crate) use impl_resource;
