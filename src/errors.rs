use thiserror::Error;

/// Error taxonomy for the dashboard client.
///
/// `Auth` covers the whole session lifecycle: missing identity, a failed
/// forced refresh, and the retry-after-401 path exhausting its single retry.
/// `Http` is any non-401 non-2xx backend response and is never retried.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Parse(err.to_string())
        } else {
            DashboardError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

impl DashboardError {
    /// True when the error should tear the session down (login required again)
    pub fn is_auth(&self) -> bool {
        matches!(self, DashboardError::Auth(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DashboardError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = DashboardError::Http {
            status: 503,
            body: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_auth());
    }

    #[test]
    fn test_auth_error_classification() {
        let err = DashboardError::Auth("refresh failed".to_string());
        assert!(err.is_auth());
        assert_eq!(err.status(), None);
    }
}
