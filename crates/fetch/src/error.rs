use thiserror::Error;

/// Errors produced while downloading or decoding one image.
///
/// Every variant except [`InvalidConfig`](FetchError::InvalidConfig)
/// concerns a single URL. Callers are expected to drop the affected item
/// and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    /// Transport failure: DNS, connect, TLS, or a broken body stream.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The response body exceeded `max_image_bytes`.
    #[error("body of {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    /// The body was received but is not a decodable image.
    #[error("failed to decode image from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid fetch config: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Request { .. } => "request",
            FetchError::Status { .. } => "status",
            FetchError::Timeout { .. } => "timeout",
            FetchError::TooLarge { .. } => "too_large",
            FetchError::Decode { .. } => "decode",
            FetchError::InvalidConfig(_) => "invalid_config",
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_url() {
        let err = FetchError::Status {
            url: "https://cdn/x.png".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "https://cdn/x.png returned HTTP 404");
        assert_eq!(err.kind(), "status");

        let err = FetchError::TooLarge {
            url: "u".into(),
            limit: 10,
        };
        assert!(err.to_string().contains("10 bytes"));
        assert_eq!(err.kind(), "too_large");
    }
}
