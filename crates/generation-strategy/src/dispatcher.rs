//! ストラテジーの選択と呼び出し

use std::sync::Arc;

use gemini_client::{GeminiClient, GeminiTransport};

use crate::{
    GenerationRequest, GenerationResult, GenerationStrategy, LibraryStrategy, RestStrategy,
    StrategyKind,
};

/// Routes a request to the strategy it names. No fallback, no retry.
pub struct GenerationDispatcher {
    library: LibraryStrategy,
    rest: RestStrategy,
}

impl GenerationDispatcher {
    /// Both strategies share one transport.
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            library: LibraryStrategy::new(Arc::clone(&transport)),
            rest: RestStrategy::new(transport),
        }
    }

    pub fn from_client(client: GeminiClient) -> Self {
        Self::new(Arc::new(client))
    }

    pub fn strategy(&self, kind: StrategyKind) -> &dyn GenerationStrategy {
        match kind {
            StrategyKind::Library => &self.library,
            StrategyKind::Rest => &self.rest,
        }
    }

    /// 選択されたストラテジーでリクエストを実行
    pub async fn dispatch(&self, request: &GenerationRequest) -> GenerationResult {
        let strategy = self.strategy(request.strategy());
        tracing::debug!(strategy = %strategy.kind(), model = request.model(), "dispatching");
        strategy.execute(request).await
    }
}
