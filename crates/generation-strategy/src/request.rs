//! リクエスト型定義

use gemini_client::{GenerateContentRequest, GenerationConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseStrategyError;

/// 呼び出し方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// クライアントライブラリ経由のストリーミング呼び出し
    Library,
    /// REST API の直接呼び出し
    Rest,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Library, StrategyKind::Rest];

    /// Stable token used on the command line and in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Library => "library",
            StrategyKind::Rest => "rest",
        }
    }

    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Library => "Client library (streaming)",
            StrategyKind::Rest => "REST API (direct)",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" | "lib" => Ok(StrategyKind::Library),
            "rest" | "rest_api" | "rest-api" => Ok(StrategyKind::Rest),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// API キー。表示・デバッグ出力ではマスクされる。
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw secret, for placing on the wire only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// 1 回分の生成リクエスト。構築後は変更できない。
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    prompt: String,
    model: String,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    strategy: StrategyKind,
    credential: Credential,
}

impl GenerationRequest {
    pub fn builder(
        prompt: impl Into<String>,
        model: impl Into<String>,
        credential: Credential,
    ) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            prompt: prompt.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            strategy: StrategyKind::Library,
            credential,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn top_p(&self) -> f64 {
        self.top_p
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// A fresh request identical to this one except for the strategy.
    pub fn with_strategy(&self, strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..self.clone()
        }
    }

    /// Sampling parameters in wire form.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// JSON body shared by both endpoints.
    pub fn to_wire_body(&self) -> GenerateContentRequest {
        GenerateContentRequest::from_prompt(&self.prompt, self.generation_config())
    }
}

pub struct GenerationRequestBuilder {
    prompt: String,
    model: String,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    strategy: StrategyKind,
    credential: Credential,
}

impl GenerationRequestBuilder {
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Clamps parameters into range: temperature/top_p ∈ [0,1], top_k ≥ 1,
    /// max_output_tokens ≥ 1. NaN falls back to the default.
    pub fn build(self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt,
            model: self.model,
            temperature: clamp_unit(self.temperature, DEFAULT_TEMPERATURE),
            top_p: clamp_unit(self.top_p, DEFAULT_TOP_P),
            top_k: self.top_k.max(1),
            max_output_tokens: self.max_output_tokens.max(1),
            strategy: self.strategy,
            credential: self.credential,
        }
    }
}

/// Clamp into [0, 1]; NaN becomes `fallback`.
pub fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tokens() {
        assert_eq!("library".parse::<StrategyKind>().unwrap(), StrategyKind::Library);
        assert_eq!("REST_API".parse::<StrategyKind>().unwrap(), StrategyKind::Rest);
        assert_eq!(" rest ".parse::<StrategyKind>().unwrap(), StrategyKind::Rest);
        assert!("grpc".parse::<StrategyKind>().is_err());
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn builder_clamps_out_of_range_parameters() {
        let req = GenerationRequest::builder("p", "m", Credential::new("k"))
            .temperature(1.7)
            .top_p(-0.2)
            .top_k(0)
            .max_output_tokens(0)
            .build();
        assert_eq!(req.temperature(), 1.0);
        assert_eq!(req.top_p(), 0.0);
        assert_eq!(req.top_k(), 1);
        assert_eq!(req.max_output_tokens(), 1);

        let req = GenerationRequest::builder("p", "m", Credential::new("k"))
            .temperature(f64::NAN)
            .build();
        assert_eq!(req.temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn credential_is_redacted() {
        let req = GenerationRequest::builder("p", "m", Credential::new("super-secret")).build();
        let debug = format!("{:?}", req);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("Credential(***)"));
        assert_eq!(req.credential().expose(), "super-secret");
    }

    #[test]
    fn with_strategy_keeps_everything_else() {
        let req = GenerationRequest::builder("p", "m", Credential::new("k"))
            .top_k(7)
            .build();
        let rest = req.with_strategy(StrategyKind::Rest);
        assert_eq!(rest.strategy(), StrategyKind::Rest);
        assert_eq!(req.strategy(), StrategyKind::Library);
        assert_eq!(rest.top_k(), 7);
        assert_eq!(rest.to_wire_body(), req.to_wire_body());
    }
}
