//! Typed error handling for the PocketBooks API
//!
//! Every handler returns `Result<_, BooksError>`. The error renders itself as
//! the JSON error envelope `{ "success": false, "error": "..." }` with the
//! matching HTTP status code.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = service
//!     .get(&id)
//!     .await?
//!     .ok_or_else(|| BooksError::not_found("client", id))?;
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use validator::{ValidationErrors, ValidationErrorsKind};

/// The main error type returned by every API handler
#[derive(Debug, thiserror::Error)]
pub enum BooksError {
    /// The requested record does not exist (or was soft-deleted)
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: String },

    /// No route matches the request path
    #[error("Route '{0}' not found")]
    RouteNotFound(String),

    /// A path parameter could not be parsed as a record id
    #[error("Invalid id '{0}'")]
    InvalidId(String),

    /// The request was malformed (bad JSON, bad query parameter, ...)
    #[error("{0}")]
    BadRequest(String),

    /// The payload failed field validation
    #[error("Validation failed: {}", summarize(.0))]
    Validation(BTreeMap<String, Vec<String>>),

    /// A unique field collides with an existing record
    #[error("{resource} with {field} '{value}' already exists")]
    Duplicate {
        resource: String,
        field: String,
        value: String,
    },

    /// A foreign key points to a missing record
    #[error("{field} references unknown {resource} '{id}'")]
    InvalidReference {
        field: String,
        resource: String,
        id: String,
    },

    /// A query parameter names a field the resource cannot be filtered or sorted by
    #[error("Unknown field '{field}' for {resource}")]
    UnknownField { resource: String, field: String },

    /// Anything raised by the storage backend
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

/// Storage backends return `anyhow::Error`; a `BooksError` raised inside a
/// backend (e.g. a unique index violation) keeps its own status
impl From<anyhow::Error> for BooksError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BooksError>() {
            Ok(books) => books,
            Err(err) => BooksError::Storage(err),
        }
    }
}

/// Error envelope written to the response body
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl BooksError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        BooksError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        BooksError::BadRequest(message.into())
    }

    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        BooksError::Validation(errors)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BooksError::NotFound { .. } | BooksError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            BooksError::InvalidId(_)
            | BooksError::BadRequest(_)
            | BooksError::Validation(_)
            | BooksError::Duplicate { .. }
            | BooksError::InvalidReference { .. }
            | BooksError::UnknownField { .. } => StatusCode::BAD_REQUEST,
            BooksError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to the error envelope.
    ///
    /// Storage failures are reported generically; the cause is only logged.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let error = match self {
            BooksError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let details = match self {
            BooksError::Validation(fields) => Some(serde_json::json!({ "fields": fields })),
            _ => None,
        };

        ErrorEnvelope {
            success: false,
            error,
            details,
        }
    }
}

impl IntoResponse for BooksError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }
        (status, Json(self.to_envelope())).into_response()
    }
}

impl From<ValidationErrors> for BooksError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        flatten_validation_errors(&errors, String::new(), &mut fields);
        BooksError::Validation(fields)
    }
}

fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: String,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let field = camel_case(field);
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                for err in list {
                    messages.push(
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string()),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(inner, path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(inner, format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// Validation reports Rust field names; clients see the JSON ones
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn summarize(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{} ({})", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate(range(min = 0.0))]
        amount: f64,
        #[validate(range(min = 1))]
        tenure_months: u32,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BooksError::not_found("client", "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BooksError::InvalidId("abc".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BooksError::Duplicate {
                resource: "client".into(),
                field: "email".into(),
                value: "a@b.co".into(),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BooksError::Storage(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_message_is_hidden() {
        let envelope = BooksError::Storage(anyhow::anyhow!("connection refused")).to_envelope();
        assert!(!envelope.success);
        assert_eq!(envelope.error, "Internal server error");
        assert!(envelope.details.is_none());
    }

    #[test]
    fn test_duplicate_message() {
        let err = BooksError::Duplicate {
            resource: "vendor".into(),
            field: "email".into(),
            value: "sales@acme.io".into(),
        };
        assert_eq!(err.to_string(), "vendor with email 'sales@acme.io' already exists");
    }

    #[test]
    fn test_backend_errors_keep_their_kind() {
        let raised: anyhow::Error = BooksError::Duplicate {
            resource: "raw_material".into(),
            field: "sku".into(),
            value: "RM-1".into(),
        }
        .into();
        let err = BooksError::from(raised);
        assert!(matches!(err, BooksError::Duplicate { ref field, .. } if field == "sku"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = BooksError::from(anyhow::anyhow!("socket closed"));
        assert!(matches!(err, BooksError::Storage(_)));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("outstanding_balance"), "outstandingBalance");
        assert_eq!(camel_case("name"), "name");
        assert_eq!(camel_case("rawMaterialIds"), "rawMaterialIds");
    }

    #[test]
    fn test_validation_errors_are_flattened() {
        let sample = Sample {
            email: "nope".into(),
            amount: -1.0,
            tenure_months: 0,
        };
        let err: BooksError = sample.validate().unwrap_err().into();

        let envelope = err.to_envelope();
        let details = envelope.details.expect("validation carries details");
        assert_eq!(details["fields"]["email"][0], "must be a valid email");
        assert_eq!(details["fields"]["amount"][0], "range");
        assert_eq!(details["fields"]["tenureMonths"][0], "range");
        assert!(envelope.error.starts_with("Validation failed"));
    }
}
