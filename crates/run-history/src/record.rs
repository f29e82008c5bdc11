//! 履歴レコード型定義

use chrono::{DateTime, Utc};
use generation_strategy::{GenerationRequest, GenerationResult, StrategyKind};
use serde::{Deserialize, Serialize};

/// 1 回の実行の要約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub strategy: StrategyKind,
    pub model: String,
    /// 入力テキスト文字数
    pub input_length: usize,
    /// 出力テキスト文字数
    pub output_length: usize,
    pub elapsed_ms: f64,
}

impl HistoryRecord {
    /// リクエストと結果から記録を作成
    pub fn from_run(request: &GenerationRequest, result: &GenerationResult) -> Self {
        Self::at(Utc::now(), request, result)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        request: &GenerationRequest,
        result: &GenerationResult,
    ) -> Self {
        Self {
            timestamp,
            strategy: request.strategy(),
            model: request.model().to_string(),
            input_length: request.prompt().chars().count(),
            output_length: result.text.chars().count(),
            elapsed_ms: result.elapsed_ms,
        }
    }
}
