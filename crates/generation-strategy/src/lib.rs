//! Generation strategies for benchmarking the Gemini API.
//!
//! A [`GenerationStrategy`] executes one prompt and reports the generated
//! text together with the elapsed wall-clock time. Two implementations exist:
//!
//! - [`LibraryStrategy`] streams the response through the client library and
//!   concatenates chunk texts.
//! - [`RestStrategy`] issues one direct `generateContent` POST and navigates
//!   the JSON envelope itself.
//!
//! Timing is identical for both: the clock starts right before the call is
//! issued (after the request body is built) and stops once the last byte or
//! terminal chunk has been consumed and converted to text.
//!
//! Neither strategy returns `Err`: every failure becomes an [`ErrorInfo`]
//! inside the [`GenerationResult`]. [`GenerationDispatcher`] picks the
//! strategy named by the request.

use async_trait::async_trait;

pub mod dispatcher;
pub mod error;
pub mod library;
pub mod request;
pub mod rest;
pub mod result;

pub use dispatcher::GenerationDispatcher;
pub use error::{ErrorInfo, ErrorKind, ParseStrategyError};
pub use library::LibraryStrategy;
pub use request::{
    clamp_unit, Credential, GenerationRequest, GenerationRequestBuilder, StrategyKind,
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};
pub use rest::RestStrategy;
pub use result::{duration_ms, GenerationResult};

pub use gemini_client::{GeminiClient, GeminiTransport, DEFAULT_BASE_URL};

/// Async trait implemented by both call strategies.
#[async_trait]
pub trait GenerationStrategy: Send + Sync + 'static {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Execute one request. Failures are reported in the result, never raised.
    async fn execute(&self, request: &GenerationRequest) -> GenerationResult;
}
