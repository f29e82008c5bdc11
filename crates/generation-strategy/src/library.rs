use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use gemini_client::{ClientError, GeminiTransport, GenerateContentRequest};

use crate::{ErrorInfo, GenerationRequest, GenerationResult, GenerationStrategy, StrategyKind};

/// Streaming call through the client library.
///
/// Chunk texts are concatenated in arrival order; chunks without text (usage
/// or finish metadata only) are skipped. Any client failure, including an
/// error status on the stream, is reported as a transport error.
pub struct LibraryStrategy {
    transport: Arc<dyn GeminiTransport>,
}

impl LibraryStrategy {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self { transport }
    }

    async fn collect(
        &self,
        request: &GenerationRequest,
        body: &GenerateContentRequest,
    ) -> Result<String, ClientError> {
        let mut stream = self
            .transport
            .stream_generate_content(request.model(), request.credential().expose(), body)
            .await?;

        let mut full_response = String::new();
        while let Some(chunk) = stream.next().await {
            if let Some(text) = chunk?.text() {
                full_response.push_str(&text);
            }
        }
        Ok(full_response)
    }
}

#[async_trait]
impl GenerationStrategy for LibraryStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Library
    }

    async fn execute(&self, request: &GenerationRequest) -> GenerationResult {
        let body = request.to_wire_body();

        let started = Instant::now();
        let outcome = self.collect(request, &body).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(text) => {
                tracing::debug!(
                    model = request.model(),
                    ?elapsed,
                    chars = text.chars().count(),
                    "library call finished"
                );
                GenerationResult::success(text, elapsed)
            }
            Err(e) => {
                tracing::warn!(
                    model = request.model(),
                    ?elapsed,
                    error = %e,
                    "library call failed"
                );
                let status = e.status_code();
                let error = ErrorInfo::transport(e.detailed()).with_status(status);
                GenerationResult::failure(error, elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;
    use futures::stream;
    use gemini_client::{ChunkStream, GenerateContentResponse, RawResponse};
    use std::sync::Mutex;

    /// Streams a fixed list of chunks; `None` entries become metadata-only chunks.
    struct ChunkBackend {
        chunks: Vec<Option<&'static str>>,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl GeminiTransport for ChunkBackend {
        async fn generate_content(
            &self,
            _model: &str,
            _api_key: &str,
            _request: &GenerateContentRequest,
        ) -> Result<RawResponse, ClientError> {
            unreachable!("library strategy never issues a one-shot call")
        }

        async fn stream_generate_content(
            &self,
            model: &str,
            api_key: &str,
            _request: &GenerateContentRequest,
        ) -> Result<ChunkStream, ClientError> {
            self.seen.lock().unwrap().push((model.to_string(), api_key.to_string()));
            let items: Vec<Result<GenerateContentResponse, ClientError>> = self
                .chunks
                .iter()
                .map(|c| {
                    Ok(match c {
                        Some(text) => GenerateContentResponse::from_text(*text),
                        None => GenerateContentResponse::default(),
                    })
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::builder("greet", "gemini-2.0-flash-lite", Credential::new("key-1"))
            .build()
    }

    #[tokio::test]
    async fn concatenates_chunks_and_skips_textless_ones() {
        let backend = Arc::new(ChunkBackend {
            chunks: vec![Some("Hel"), None, Some("lo, "), Some("world"), None],
            seen: Mutex::new(Vec::new()),
        });
        let strategy = LibraryStrategy::new(backend.clone());

        let result = strategy.execute(&request()).await;
        assert_eq!(result.error, None);
        assert_eq!(result.text, "Hello, world");
        assert!(result.elapsed_ms >= 0.0);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("gemini-2.0-flash-lite".to_string(), "key-1".to_string())]);
    }

    #[tokio::test]
    async fn empty_stream_is_an_empty_success() {
        let strategy = LibraryStrategy::new(Arc::new(ChunkBackend {
            chunks: vec![None],
            seen: Mutex::new(Vec::new()),
        }));
        let result = strategy.execute(&request()).await;
        assert!(result.is_success());
        assert_eq!(result.text, "");
    }
}
