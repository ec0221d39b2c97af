//! The metric poller: wait until a query resolves to one series with one
//! point, then return that point's value.

use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::client::{ListTimeSeriesParams, MetricsClient};
use super::types::{value_as_f64, Metric, MonitoredResource};
use super::MonitoringError;
use crate::retry::{retry, BackoffPolicy, RetryError};

/// Backoff schedule for metric polling: the backend takes tens of seconds to
/// make fresh points queryable, so the first wait is already 10s.
pub fn poll_policy() -> BackoffPolicy {
    BackoffPolicy {
        initial_interval: Duration::from_secs(10),
        ..BackoffPolicy::default()
    }
}

/// Build the label clauses for one selector: `<selector>.labels.<key>="<value>"`
/// per entry, space-joined. Clause order follows map iteration order and is
/// not guaranteed. Values are interpolated verbatim; quotes inside label
/// values are not escaped.
pub fn label_filter(selector: &str, labels: &HashMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{selector}.labels.{key}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The full filter for a resource/metric pair: both type clauses plus both
/// label filters, space-joined.
pub fn series_filter(resource: &MonitoredResource, metric: &Metric) -> String {
    let mut parts = vec![
        format!("resource.type=\"{}\"", resource.resource_type),
        format!("metric.type=\"{}\"", metric.metric_type),
    ];
    let resource_labels = label_filter("resource", &resource.labels);
    if !resource_labels.is_empty() {
        parts.push(resource_labels);
    }
    let metric_labels = label_filter("metric", &metric.labels);
    if !metric_labels.is_empty() {
        parts.push(metric_labels);
    }
    parts.join(" ")
}

/// Fetch the newest point for the series identified by `resource` and
/// `metric`, blocking through the default poll schedule until it appears.
///
/// Assumes the caller's labels pin down a single series. Zero matching
/// series (or a series without exactly one aligned point) is retried;
/// more than one series means the labels were not specific enough and
/// fails immediately.
pub async fn fetch_float64_metric(
    client: &MetricsClient,
    project_id: &str,
    resource: &MonitoredResource,
    metric: &Metric,
) -> Result<f64, MonitoringError> {
    fetch_with_policy(client, project_id, resource, metric, &poll_policy()).await
}

/// [`fetch_float64_metric`] with an explicit backoff schedule.
pub async fn fetch_with_policy(
    client: &MetricsClient,
    project_id: &str,
    resource: &MonitoredResource,
    metric: &Metric,
    policy: &BackoffPolicy,
) -> Result<f64, MonitoringError> {
    let filter = series_filter(resource, metric);

    retry(policy, || {
        let filter = filter.clone();
        async move {
            // The interval end is recomputed on every attempt.
            let params = ListTimeSeriesParams::aligned_latest(&filter, Utc::now());
            let response = client
                .list_time_series(project_id, &params)
                .await
                .map_err(classify)?;

            debug!(series = response.time_series.len(), "list time series response");

            match response.time_series.as_slice() {
                [] => Err(RetryError::Transient(MonitoringError::NoSeries)),
                [series] => match series.points.as_slice() {
                    [point] => Ok(value_as_f64(point.value.as_ref())),
                    points => Err(RetryError::Transient(MonitoringError::PointCount {
                        count: points.len(),
                    })),
                },
                many => Err(RetryError::Permanent(MonitoringError::AmbiguousSeries {
                    count: many.len(),
                })),
            }
        }
    })
    .await
}

fn classify(error: MonitoringError) -> RetryError<MonitoringError> {
    if error.is_transient() {
        RetryError::Transient(error)
    } else {
        RetryError::Permanent(error)
    }
}
