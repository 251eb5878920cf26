//! Trafiklab client error types.

/// Errors from the Trafiklab/ResRobot HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum TrafiklabError {
    /// Authentication failed (bad or missing API key)
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Stop or area id unknown to the upstream API
    #[error("stop not found: {0}")]
    StopNotFound(String),

    /// Request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// Any other network-layer failure
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// API returned an unexpected error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl From<reqwest::Error> for TrafiklabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TrafiklabError::Timeout
        } else {
            TrafiklabError::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TrafiklabError::Unauthorized;
        assert_eq!(err.to_string(), "unauthorized (invalid API key)");

        let err = TrafiklabError::StopNotFound("740098000".into());
        assert_eq!(err.to_string(), "stop not found: 740098000");

        let err = TrafiklabError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");
    }
}
