use thiserror::Error;

/// Error type returned by the Gemini client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP / transport errors (DNS, connection reset, timeout, broken body).
    /// The request URL, which carries the API key, is stripped.
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),

    /// Non-success status on a call that expects a success body (streaming).
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// A streamed chunk could not be decoded.
    #[error("failed to decode chunk: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.without_url())
    }
}

impl ClientError {
    /// Message including the chain of underlying causes.
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
