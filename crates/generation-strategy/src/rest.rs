use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use gemini_client::{GeminiTransport, RawResponse};
use serde_json::Value;

use crate::{ErrorInfo, GenerationRequest, GenerationResult, GenerationStrategy, StrategyKind};

/// Direct `generateContent` POST.
///
/// Response handling:
/// - status other than 200: `ApiError` with the raw body as message;
/// - 200 with a body that is not JSON: `MalformedResponse`;
/// - 200 with JSON: lenient. Missing `candidates`, `content.parts` or `text`
///   fields give a successful result made of whatever text is present,
///   possibly empty.
pub struct RestStrategy {
    transport: Arc<dyn GeminiTransport>,
}

impl RestStrategy {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl GenerationStrategy for RestStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rest
    }

    async fn execute(&self, request: &GenerationRequest) -> GenerationResult {
        let body = request.to_wire_body();

        let started = Instant::now();
        let outcome = match self
            .transport
            .generate_content(request.model(), request.credential().expose(), &body)
            .await
        {
            Ok(raw) => interpret(raw),
            Err(e) => Err(ErrorInfo::transport(e.detailed()).with_status(e.status_code())),
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(text) => {
                tracing::debug!(
                    model = request.model(),
                    ?elapsed,
                    chars = text.chars().count(),
                    "rest call finished"
                );
                GenerationResult::success(text, elapsed)
            }
            Err(error) => {
                tracing::warn!(model = request.model(), ?elapsed, %error, "rest call failed");
                GenerationResult::failure(error, elapsed)
            }
        }
    }
}

fn interpret(raw: RawResponse) -> Result<String, ErrorInfo> {
    if raw.status != 200 {
        return Err(ErrorInfo::api(raw.status, raw.body));
    }
    let value: Value = serde_json::from_str(&raw.body)
        .map_err(|e| ErrorInfo::malformed(format!("response body is not JSON: {}", e)))?;
    Ok(extract_text(&value))
}

/// Concatenate `candidates[0].content.parts[*].text`, defaulting to empty.
fn extract_text(response: &Value) -> String {
    let first = match response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
    {
        Some(candidate) => candidate,
        None => {
            tracing::warn!("200 response without candidates; treating as empty output");
            return String::new();
        }
    };

    first
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
