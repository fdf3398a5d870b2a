use std::time::Duration;

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderValue},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{NwsError, NwsResult},
    format::Format,
    model::{AlertQuery, Point, WeatherResponse},
};

pub const DEFAULT_API_HOST: &str = "api.weather.gov";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROBLEM_JSON: &str = "application/problem+json";

/// Client for api.weather.gov.
///
/// The API asks every caller to identify itself; the contact string (usually an
/// email address) is sent in the `User-Agent` header of each request.
#[derive(Debug, Clone)]
pub struct NwsClient {
    http: Client,
    base_url: String,
    user_agent: String,
}

#[derive(Debug, Clone)]
pub struct NwsClientBuilder {
    contact: String,
    base_url: String,
    timeout: Duration,
}

impl NwsClientBuilder {
    /// Talk to `https://{host}` instead of the public API host. Use [`base_url`] for
    /// anything with a scheme.
    ///
    /// [`base_url`]: NwsClientBuilder::base_url
    pub fn api_host(mut self, host: impl AsRef<str>) -> Self {
        self.base_url = format!("https://{}", host.as_ref().trim_end_matches('/'));
        self
    }

    /// Full base URL including scheme, e.g. `http://127.0.0.1:8080`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> NwsResult<NwsClient> {
        let contact = self.contact.trim();
        if contact.is_empty() {
            return Err(NwsError::Config(
                "a contact identifier (e.g. an email address) is required".to_string(),
            ));
        }

        let user_agent = format!(
            "{} {} [{}]",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            contact
        );
        HeaderValue::from_str(&user_agent).map_err(|_| {
            NwsError::Config(format!("contact '{contact}' cannot be sent in a User-Agent header"))
        })?;

        let host = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"));
        match host {
            None => {
                return Err(NwsError::Config(format!(
                    "base URL '{}' must start with http:// or https://",
                    self.base_url
                )));
            }
            Some(host) if host.is_empty() || host.contains("://") => {
                return Err(NwsError::Config(format!(
                    "base URL '{}' has a malformed host; pass only the host name to api_host",
                    self.base_url
                )));
            }
            Some(_) => {}
        }

        let http = Client::builder()
            .user_agent(user_agent.as_str())
            .timeout(self.timeout)
            .build()
            .map_err(|e| NwsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(NwsClient { http, base_url: self.base_url, user_agent })
    }
}

#[derive(Debug, Deserialize)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
}

impl NwsClient {
    /// Client for the public API with default settings.
    pub fn new(contact: impl Into<String>) -> NwsResult<Self> {
        Self::builder(contact).build()
    }

    pub fn builder(contact: impl Into<String>) -> NwsClientBuilder {
        NwsClientBuilder {
            contact: contact.into(),
            base_url: format!("https://{DEFAULT_API_HOST}"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Metadata for a point: grid coordinates, forecast office, forecast URLs.
    pub async fn point(&self, point: Point, format: Option<Format>) -> NwsResult<WeatherResponse> {
        self.get(&format!("points/{point}"), None, format).await
    }

    /// Twelve-hour period forecast for a point.
    pub async fn point_forecast(
        &self,
        point: Point,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        self.get(&format!("points/{point}/forecast"), None, format).await
    }

    /// Hourly forecast for a point.
    pub async fn point_hourly_forecast(
        &self,
        point: Point,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        self.get(&format!("points/{point}/forecast/hourly"), None, format).await
    }

    /// Observation stations near a point, nearest first.
    pub async fn point_stations(
        &self,
        point: Point,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        self.get(&format!("points/{point}/stations"), None, format).await
    }

    /// Raw gridded forecast data for a forecast office grid cell.
    pub async fn gridpoint(
        &self,
        office: &str,
        grid_x: u32,
        grid_y: u32,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        validate_office(office)?;
        self.get(&format!("gridpoints/{office}/{grid_x},{grid_y}"), None, format).await
    }

    pub async fn gridpoint_forecast(
        &self,
        office: &str,
        grid_x: u32,
        grid_y: u32,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        validate_office(office)?;
        self.get(&format!("gridpoints/{office}/{grid_x},{grid_y}/forecast"), None, format)
            .await
    }

    /// All alerts matching `query`, active or not.
    pub async fn alerts(
        &self,
        query: &AlertQuery,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        self.get("alerts", Some(query), format).await
    }

    pub async fn active_alerts(
        &self,
        query: &AlertQuery,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        self.get("alerts/active", Some(query), format).await
    }

    /// A single alert by id, e.g. `urn:oid:2.49.0.1.840.0.0ff3...`.
    pub async fn alert(&self, id: &str, format: Option<Format>) -> NwsResult<WeatherResponse> {
        if id.trim().is_empty() || id.contains(['/', '?', '#']) {
            return Err(NwsError::invalid(format!("malformed alert id '{id}'")));
        }
        self.get(&format!("alerts/{id}"), None, format).await
    }

    /// GET any endpoint relative to the base URL.
    ///
    /// `format` defaults to GeoJSON. JSON formats come back decoded, everything else
    /// as the unmodified body text. No endpoint restricts formats client-side; the
    /// upstream answers combinations it does not serve with an error status.
    pub async fn get(
        &self,
        endpoint: &str,
        query: Option<&AlertQuery>,
        format: Option<Format>,
    ) -> NwsResult<WeatherResponse> {
        let format = format.unwrap_or_default();
        let pairs = match query {
            Some(query) => query.validated_pairs()?,
            None => Vec::new(),
        };

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!(%url, %format, "sending request");

        let mut request = self.http.get(&url).header(ACCEPT, format.content_type());
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        let res = request.send().await?;

        let status = res.status();
        let problem = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(PROBLEM_JSON));
        let bytes = res.bytes().await?.to_vec();

        debug!(%url, status = status.as_u16(), bytes = bytes.len(), "received response");

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(upstream_error(status, problem, body));
        }

        WeatherResponse::from_body(body_text(bytes)?, format.is_json())
    }
}

fn upstream_error(status: StatusCode, problem: bool, body: String) -> NwsError {
    let detail = if problem {
        serde_json::from_str::<Problem>(&body).ok().and_then(|p| p.detail.or(p.title))
    } else {
        None
    };

    warn!(status = status.as_u16(), detail = detail.as_deref(), "upstream request failed");

    NwsError::Upstream { status: status.as_u16(), detail, body }
}

/// Successful bodies are handed back byte-for-byte, so invalid UTF-8 is an error
/// rather than being patched with replacement characters.
fn body_text(bytes: Vec<u8>) -> NwsResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| NwsError::Decode(format!("response body is not valid UTF-8: {e}")))
}

fn validate_office(office: &str) -> NwsResult<()> {
    if office.is_empty() || !office.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(NwsError::invalid(format!("malformed forecast office id '{office}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_contact_is_a_config_error() {
        let err = NwsClient::new("   ").unwrap_err();
        assert!(matches!(err, NwsError::Config(_)));
    }

    #[test]
    fn contact_with_control_characters_is_rejected() {
        let err = NwsClient::new("me@example.com\r\nX-Evil: 1").unwrap_err();
        assert!(matches!(err, NwsError::Config(ref msg) if msg.contains("User-Agent")));
    }

    #[test]
    fn user_agent_carries_contact() {
        let client = NwsClient::new("me@example.com").unwrap();
        assert!(client.user_agent().starts_with("nws-core "));
        assert!(client.user_agent().ends_with("[me@example.com]"));
        assert_eq!(client.base_url(), "https://api.weather.gov");
    }

    #[test]
    fn builder_overrides_host() {
        let client = NwsClient::builder("me@example.com")
            .api_host("staging.weather.gov/")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://staging.weather.gov");

        let client = NwsClient::builder("me@example.com")
            .base_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        let err = NwsClient::builder("me@example.com").base_url("api.weather.gov").build();
        assert!(matches!(err, Err(NwsError::Config(_))));
    }

    #[test]
    fn host_with_scheme_is_rejected() {
        let err = NwsClient::builder("me@example.com")
            .api_host("http://localhost:8080")
            .build()
            .unwrap_err();
        assert!(matches!(err, NwsError::Config(ref msg) if msg.contains("malformed host")));

        let err = NwsClient::builder("me@example.com").base_url("https://").build();
        assert!(matches!(err, Err(NwsError::Config(_))));
    }

    #[test]
    fn body_text_keeps_valid_utf8_and_rejects_the_rest() {
        let text = body_text("<feed>°F</feed>".as_bytes().to_vec()).unwrap();
        assert_eq!(text, "<feed>°F</feed>");

        let err = body_text(vec![b'<', 0xff, b'>']).unwrap_err();
        assert!(matches!(err, NwsError::Decode(ref msg) if msg.contains("not valid UTF-8")));
    }

    #[test]
    fn office_ids_are_validated() {
        assert!(validate_office("TOP").is_ok());
        assert!(validate_office("").is_err());
        assert!(validate_office("TOP/../x").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn problem_detail_is_extracted() {
        let body = r#"{"title":"Not Found","detail":"Data Unavailable For Requested Point"}"#;
        let err = upstream_error(StatusCode::NOT_FOUND, true, body.to_string());

        match err {
            NwsError::Upstream { status, detail, body: raw } => {
                assert_eq!(status, 404);
                assert_eq!(detail.as_deref(), Some("Data Unavailable For Requested Point"));
                assert_eq!(raw, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn problem_title_is_used_without_detail() {
        let body = r#"{"type":"https://api.weather.gov/problems/NotFound","title":"Not Found"}"#;
        let err = upstream_error(StatusCode::NOT_FOUND, true, body.to_string());

        assert!(matches!(
            err,
            NwsError::Upstream { status: 404, detail: Some(ref d), .. } if d == "Not Found"
        ));
    }

    #[test]
    fn plain_error_body_has_no_detail() {
        let err = upstream_error(StatusCode::BAD_GATEWAY, false, "bad gateway".to_string());
        assert!(matches!(err, NwsError::Upstream { status: 502, detail: None, .. }));
    }
}
