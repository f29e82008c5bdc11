//! A tiny, configurable client for the Gemini `generateContent` API.
//!
//! The crate plays the part of the "client library" in gemini-bench and also
//! exposes the raw one-shot call used by the direct REST strategy:
//! - `base_url` is provided by the caller (defaults to [`DEFAULT_BASE_URL`]).
//! - [`GeminiClient::stream_generate_content`] posts to
//!   `models/{model}:streamGenerateContent?alt=sse` and yields decoded chunks.
//! - [`GeminiClient::generate_content`] posts to `models/{model}:generateContent`
//!   and hands back the status and body untouched, whatever the status.
//!
//! Both calls sit behind [`GeminiTransport`] so callers can swap in an
//! in-memory backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Url;

pub mod error;
pub mod sse;
pub mod types;

pub use error::ClientError;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

/// Public Generative Language endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

const API_VERSION: &str = "v1beta";

/// Stream of decoded chunks from a streaming call.
pub type ChunkStream = BoxStream<'static, Result<GenerateContentResponse, ClientError>>;

/// Status and body of a one-shot call, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The two calls a generation strategy can issue.
#[async_trait]
pub trait GeminiTransport: Send + Sync + 'static {
    /// One-shot `generateContent`. Any HTTP status is returned as `Ok`; only
    /// transport failures are `Err`.
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<RawResponse, ClientError>;

    /// Streaming `streamGenerateContent`. A non-success status is an `Err`.
    async fn stream_generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, ClientError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    base: Url,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client with the given `base_url` (e.g. [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    /// Same as [`GeminiClient::new`] with an overall per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        let user_agent = concat!("gemini-bench/", env!("CARGO_PKG_VERSION"));
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { base, client })
    }

    /// `<base>/v1beta/models/{model}:{method}?[alt=sse&]key=...`
    fn endpoint(&self, model: &str, method: &str, api_key: &str, sse: bool) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!(
            "{}/{}/models/{}:{}",
            url.path().trim_end_matches('/'),
            API_VERSION,
            model,
            method
        ));
        {
            let mut query = url.query_pairs_mut();
            if sse {
                query.append_pair("alt", "sse");
            }
            query.append_pair("key", api_key);
        }
        url
    }
}

#[async_trait]
impl GeminiTransport for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<RawResponse, ClientError> {
        let url = self.endpoint(model, "generateContent", api_key, false);
        let res = self.client.post(url).json(request).send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        tracing::debug!(model, status, bytes = body.len(), "generateContent finished");
        Ok(RawResponse { status, body })
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, ClientError> {
        let url = self.endpoint(model, "streamGenerateContent", api_key, true);
        let res = self.client.post(url).json(request).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(model, "streamGenerateContent opened");
        Ok(sse::decode_chunks(res.bytes_stream().boxed()))
    }
}
