//! Wire types for the `timeSeries.list` response.
//!
//! Field names follow the API's camelCase JSON. Only the fields the harness
//! reads are modeled; unknown fields are ignored on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The entity a metric describes, e.g. a container in a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// The measurement being queried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "type")]
    pub metric_type: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// One of the numeric representations a point's value may carry.
///
/// The API encodes `int64Value` as a JSON string; accept both that and a
/// plain integer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    #[serde(default, deserialize_with = "int64_from_string_or_number")]
    pub int64_value: Option<i64>,
    #[serde(default)]
    pub double_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// A single (timestamp, value) sample.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    #[serde(default)]
    pub interval: Option<TimeInterval>,
    #[serde(default)]
    pub value: Option<TypedValue>,
}

/// An ordered sequence of points for one metric/resource combination.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    #[serde(default)]
    pub metric: Option<Metric>,
    #[serde(default)]
    pub resource: Option<MonitoredResource>,
    #[serde(default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTimeSeriesResponse {
    #[serde(default)]
    pub time_series: Vec<TimeSeries>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Extract a point's value as f64.
///
/// Integer values are cast; anything without a recognized representation
/// (including a missing value) is zero.
pub fn value_as_f64(value: Option<&TypedValue>) -> f64 {
    match value {
        Some(TypedValue {
            int64_value: Some(n),
            ..
        }) => *n as f64,
        Some(TypedValue {
            double_value: Some(x),
            ..
        }) => *x,
        _ => 0.0,
    }
}

fn int64_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        String(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Number(n)) => Ok(Some(n)),
        Some(Repr::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
