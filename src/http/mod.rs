//! HTTP response types, pagination, and the route-module trait.

pub mod query;
pub mod response;
pub mod routes;

pub use query::PaginationQuery;
pub use response::{JsonResponse, PaginatedData, PaginationMeta, StatusResponse};
pub use routes::RouteModule;
