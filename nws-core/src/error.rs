use thiserror::Error;

/// Result type alias using [`NwsError`].
pub type NwsResult<T> = Result<T, NwsError>;

/// Errors surfaced by the API client. Nothing is retried.
#[derive(Debug, Error)]
pub enum NwsError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "Unsupported format '{0}'. Supported formats: geojson, json-ld, dwml, oxml, cap, atom."
    )]
    UnsupportedFormat(String),

    #[error("api.weather.gov responded with status {status}: {}", upstream_message(.detail, .body))]
    Upstream {
        status: u16,
        /// `detail` (or `title`) of an `application/problem+json` body.
        detail: Option<String>,
        body: String,
    },

    #[error("Request to api.weather.gov failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl NwsError {
    /// True for errors raised while validating arguments, before any request is sent.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, NwsError::InvalidArgument(_) | NwsError::UnsupportedFormat(_))
    }

    /// HTTP status of an upstream error.
    pub fn status(&self) -> Option<u16> {
        match self {
            NwsError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        NwsError::InvalidArgument(msg.into())
    }
}

fn upstream_message<'a>(detail: &'a Option<String>, body: &'a str) -> &'a str {
    detail.as_deref().unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_prefers_problem_detail() {
        let err = NwsError::Upstream {
            status: 404,
            detail: Some("Unable to provide data for requested point".into()),
            body: "{...}".into(),
        };

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("status 404"));
        assert!(err.to_string().contains("Unable to provide data"));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn upstream_message_falls_back_to_body() {
        let err = NwsError::Upstream { status: 500, detail: None, body: "oops".into() };
        assert!(err.to_string().ends_with("oops"));
    }

    #[test]
    fn config_error_has_no_status() {
        let err = NwsError::Config("contact is empty".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_invalid_argument());
    }
}
