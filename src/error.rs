use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("at least one metric must be requested")]
    EmptyMetrics,

    #[error("remote query failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    RemoteQuery {
        /// HTTP status returned by the provider, if it answered at all
        status: Option<u16>,
        message: String,
    },

    #[error("cache backend error: {0}")]
    CacheBackend(#[source] anyhow::Error),

    #[error("malformed row in {report} report: {reason}")]
    MalformedRow { report: &'static str, reason: String },

    #[error("unknown report '{0}'")]
    UnknownReport(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("extra field '{0}' cannot override a field built from the query")]
    ReservedExtraField(String),
}

impl AnalyticsError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteQuery {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure is worth retrying by the caller (rate limits and provider-side errors).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteQuery {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            Self::RemoteQuery { status: None, .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
