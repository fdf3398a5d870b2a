use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{NwsError, NwsResult};

/// A geographic point, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    latitude: f64,
    longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> NwsResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(NwsError::invalid(format!(
                "latitude must be a number between -90 and 90, got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(NwsError::invalid(format!(
                "longitude must be a number between -180 and 180, got {longitude}"
            )));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Renders as `lat,lon`, the form used in `/points/...` paths and the `point` alert filter.
impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Query parameters for the `/alerts` endpoints.
///
/// Example:
/// ```
/// # use nws_core::{AlertQuery, Point};
/// let query = AlertQuery::new()
///     .point(Point::new(39.0693, -94.6716).unwrap())
///     .severity("severe");
/// assert_eq!(query.get("point"), Some("39.0693,-94.6716"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertQuery {
    params: BTreeMap<String, String>,
}

impl AlertQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary parameter, replacing any earlier value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn point(self, point: Point) -> Self {
        self.param("point", point.to_string())
    }

    pub fn zone(self, zone: impl Into<String>) -> Self {
        self.param("zone", zone)
    }

    /// State or marine area code, e.g. `KS`.
    pub fn area(self, area: impl Into<String>) -> Self {
        self.param("area", area)
    }

    pub fn status(self, status: impl Into<String>) -> Self {
        self.param("status", status)
    }

    pub fn severity(self, severity: impl Into<String>) -> Self {
        self.param("severity", severity)
    }

    pub fn urgency(self, urgency: impl Into<String>) -> Self {
        self.param("urgency", urgency)
    }

    pub fn certainty(self, certainty: impl Into<String>) -> Self {
        self.param("certainty", certainty)
    }

    pub fn limit(self, limit: u32) -> Self {
        self.param("limit", limit.to_string())
    }

    pub fn start(self, start: DateTime<Utc>) -> Self {
        self.param("start", start.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn end(self, end: DateTime<Utc>) -> Self {
        self.param("end", end.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Checks every pair and returns them in key order, ready to be URL-encoded.
    pub fn validated_pairs(&self) -> NwsResult<Vec<(&str, &str)>> {
        self.params
            .iter()
            .map(|(key, value)| {
                let key_ok = !key.is_empty()
                    && key
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
                if !key_ok {
                    return Err(NwsError::invalid(format!(
                        "malformed alert query parameter name '{key}'"
                    )));
                }
                if value.trim().is_empty() {
                    return Err(NwsError::invalid(format!(
                        "alert query parameter '{key}' has an empty value"
                    )));
                }
                Ok((key.as_str(), value.as_str()))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AlertQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |query, (k, v)| query.param(k, v))
    }
}

/// Body returned by the API: decoded for JSON formats, verbatim text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WeatherResponse {
    Json(Map<String, Value>),
    Raw(String),
}

impl WeatherResponse {
    /// Decode `body` according to whether the requested format is JSON.
    pub fn from_body(body: String, json: bool) -> NwsResult<Self> {
        if !json {
            return Ok(WeatherResponse::Raw(body));
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => Ok(WeatherResponse::Json(map)),
            Ok(other) => Err(NwsError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(NwsError::Decode(e.to_string())),
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            WeatherResponse::Json(map) => Some(map),
            WeatherResponse::Raw(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            WeatherResponse::Json(_) => None,
            WeatherResponse::Raw(text) => Some(text),
        }
    }

    pub fn into_json(self) -> Option<Map<String, Value>> {
        match self {
            WeatherResponse::Json(map) => Some(map),
            WeatherResponse::Raw(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            WeatherResponse::Json(_) => None,
            WeatherResponse::Raw(text) => Some(text),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
