pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod period;
pub mod provider;
pub mod query;
pub mod reports;

pub use client::{AnalyticsClient, AnalyticsClientFactory};
pub use error::{AnalyticsError, Result};
pub use period::Period;
pub use query::{FlatRow, QueryDescriptor};
pub use reports::{Analytics, Report, ReportKind};
