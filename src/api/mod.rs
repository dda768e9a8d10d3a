//! HTTP surface over the named reports and the raw query.

pub mod handlers;
pub mod routes;

pub use routes::create_api_router;
