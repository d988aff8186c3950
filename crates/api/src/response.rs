//! Shared response envelope for API handlers.
//!
//! Successful responses use `{ "success": true, "message": ..., "data": ... }`.
//! Errors are rendered by [`crate::error::AppError`].

use serde::Serialize;

/// Standard success envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(ApiResponse::ok(job, "Job retrieved successfully")))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: &'static str) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}
