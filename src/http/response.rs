use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Minimal acknowledgement body: `{"status": "success"}`.
///
/// Used by write endpoints that have nothing else to report (reaction
/// toggles, newsletter signups, ad clicks, webhook receipts).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    #[must_use]
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Paginated data wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedData<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T: Serialize> PaginatedData<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        Self {
            items,
            pagination: PaginationMeta {
                total,
                page,
                per_page,
                total_pages: (total as f64 / per_page as f64).ceil() as u32,
            },
        }
    }
}

/// Convenience type alias for JSON responses.
pub type JsonResponse<T> = Result<Json<T>, crate::error::AppError>;
