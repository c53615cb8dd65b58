//! Success envelope shared by every endpoint

use crate::core::query::PaginationMeta;
use serde::Serialize;

/// `{ "success": true, "data": ..., "pagination"?: ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: PaginationMeta) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
        }
    }
}
