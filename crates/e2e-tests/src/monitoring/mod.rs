//! Cloud Monitoring v3 client: auth, `timeSeries.list`, and the metric poller.

pub mod auth;
pub mod client;
pub mod poller;
pub mod types;

pub use auth::Authenticator;
pub use client::MetricsClient;
pub use poller::{fetch_float64_metric, fetch_with_policy};
pub use types::{Metric, MonitoredResource};

use reqwest::StatusCode;
use thiserror::Error;

/// Monitoring query errors.
///
/// Exactly one API failure is retryable: HTTP 400, which the backend returns
/// while a just-created metric descriptor is not queryable yet. Everything
/// else aborts the poll. [`MonitoringError::is_transient`] is the single
/// source of truth for that split.
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("query rejected by the monitoring API: {body}")]
    InvalidQuery { body: String },

    #[error("monitoring API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("cannot decode time series response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected exactly 1 time series, got {count}; narrow the resource/metric labels")]
    AmbiguousSeries { count: usize },

    #[error("no time series matched the filter yet")]
    NoSeries,

    #[error("expected exactly 1 point in the time series, got {count}")]
    PointCount { count: usize },
}

impl MonitoringError {
    /// Whether the condition may clear if the query is retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitoringError::InvalidQuery { .. }
                | MonitoringError::NoSeries
                | MonitoringError::PointCount { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_query_and_empty_results_are_transient() {
        assert!(MonitoringError::InvalidQuery {
            body: "metric not found".to_string()
        }
        .is_transient());
        assert!(MonitoringError::NoSeries.is_transient());
        assert!(MonitoringError::PointCount { count: 3 }.is_transient());

        assert!(!MonitoringError::AmbiguousSeries { count: 2 }.is_transient());
        assert!(!MonitoringError::Api {
            status: StatusCode::FORBIDDEN,
            body: "permission denied".to_string()
        }
        .is_transient());
    }
}
