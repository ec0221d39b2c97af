//! REST client for `timeSeries.list`.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tracing::debug;

use super::auth::Authenticator;
use super::types::ListTimeSeriesResponse;
use super::MonitoringError;

/// Production monitoring endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://monitoring.googleapis.com";

/// Query parameters for one `timeSeries.list` call.
#[derive(Debug, Clone)]
pub struct ListTimeSeriesParams<'a> {
    pub filter: &'a str,
    pub alignment_period: &'a str,
    pub per_series_aligner: &'a str,
    pub interval_end: DateTime<Utc>,
}

impl<'a> ListTimeSeriesParams<'a> {
    /// Parameters that reduce each matching series to its newest sample:
    /// 300s alignment window, `ALIGN_NEXT_OLDER` aligner.
    pub fn aligned_latest(filter: &'a str, interval_end: DateTime<Utc>) -> Self {
        Self {
            filter,
            alignment_period: "300s",
            per_series_aligner: "ALIGN_NEXT_OLDER",
            interval_end,
        }
    }
}

/// Client for the monitoring query API.
pub struct MetricsClient {
    http: reqwest::Client,
    endpoint: String,
    auth: Authenticator,
}

impl MetricsClient {
    pub fn new(auth: Authenticator) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, auth)
    }

    /// Point the client at a different endpoint, e.g. a mock server.
    pub fn with_endpoint(endpoint: impl Into<String>, auth: Authenticator) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// List the time series matching `params` in the given project.
    ///
    /// HTTP 400 maps to [`MonitoringError::InvalidQuery`], the one API error
    /// the poller treats as transient. Other failures are permanent.
    pub async fn list_time_series(
        &self,
        project_id: &str,
        params: &ListTimeSeriesParams<'_>,
    ) -> Result<ListTimeSeriesResponse, MonitoringError> {
        let url = format!("{}/v3/projects/{}/timeSeries", self.endpoint, project_id);
        let interval_end = params
            .interval_end
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        debug!(%url, filter = %params.filter, %interval_end, "listing time series");

        let mut request = self.http.get(&url).query(&[
            ("filter", params.filter),
            ("aggregation.alignmentPeriod", params.alignment_period),
            ("aggregation.perSeriesAligner", params.per_series_aligner),
            ("interval.endTime", interval_end.as_str()),
        ]);
        if let Some(header) = self.auth.make_token() {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitoringError::InvalidQuery {
                body: body.trim().to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitoringError::Api {
                status,
                body: body.trim().to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client =
            MetricsClient::with_endpoint("http://localhost:9090/", Authenticator::None);
        assert_eq!(client.endpoint, "http://localhost:9090");
    }

    #[test]
    fn aligned_latest_uses_the_fixed_aggregation() {
        let params = ListTimeSeriesParams::aligned_latest("metric.type=\"x\"", Utc::now());
        assert_eq!(params.alignment_period, "300s");
        assert_eq!(params.per_series_aligner, "ALIGN_NEXT_OLDER");
    }
}
