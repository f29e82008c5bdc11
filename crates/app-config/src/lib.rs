//! アプリケーション設定管理
//!
//! このクレートは gemini-bench の設定を管理します。
//! - デフォルト設定の提供（読み込み失敗時のフォールバック）
//! - TOML / JSON ファイルからの読み込み
//! - 設定の保存

use anyhow::{Context, Result};
use generation_strategy::{
    clamp_unit, DEFAULT_BASE_URL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K,
    DEFAULT_TOP_P,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 選択可能なモデル
pub const CURATED_MODELS: &[&str] = &[
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-2.0-pro-exp-02-05",
    "gemini-2.0-flash-lite",
];

/// 一覧にないモデルが指定された場合に使うモデル
pub const FALLBACK_MODEL: &str = "gemini-2.0-flash-lite";

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub api_settings: ApiSettings,
    #[serde(default)]
    pub generation_params: GenerationParams,
    #[serde(default)]
    pub preset_prompts: PresetPrompts,
    #[serde(default)]
    pub app_config: AppSettings,
}

/// API 設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// API キー（空なら環境変数・コマンドライン引数を使用）
    #[serde(default)]
    pub gemini_api_key: String,

    /// デフォルトモデル名
    #[serde(default = "default_model")]
    pub default_model: String,

    /// API ベース URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP クライアントのタイムアウト（秒）。0 なら無制限
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// 生成パラメータのデフォルト値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// プリセットプロンプト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetPrompts {
    #[serde(default = "default_short_question")]
    pub short_question: String,
    #[serde(default = "default_medium_question")]
    pub medium_question: String,
    #[serde(default = "default_long_question")]
    pub long_question: String,
}

/// 動作設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// 実行時間を表示するかどうか
    #[serde(default = "default_true")]
    pub measure_execution_time: bool,

    /// 実行履歴を保持するかどうか
    #[serde(default = "default_true")]
    pub save_history: bool,

    /// 最大履歴数（メモリ内保持）
    #[serde(default = "default_max_history_items")]
    pub max_history_items: usize,
}

fn default_model() -> String {
    FALLBACK_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_short_question() -> String {
    "東京の天気はどうですか？".to_string()
}

fn default_medium_question() -> String {
    "人工知能の歴史と現在の発展状況について500文字程度で説明してください。".to_string()
}

fn default_long_question() -> String {
    "気候変動の原因、影響、および対策について詳細に説明し、各国の取り組みと今後の展望についても言及してください。1000文字以上で回答してください。".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_history_items() -> usize {
    50
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            default_model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for PresetPrompts {
    fn default() -> Self {
        Self {
            short_question: default_short_question(),
            medium_question: default_medium_question(),
            long_question: default_long_question(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            measure_execution_time: true,
            save_history: true,
            max_history_items: default_max_history_items(),
        }
    }
}

impl PresetPrompts {
    /// (名前, プロンプト) の一覧
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("short", self.short_question.as_str()),
            ("medium", self.medium_question.as_str()),
            ("long", self.long_question.as_str()),
        ]
    }

    /// 名前からプリセットを取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, prompt)| prompt)
    }
}

/// ファイル形式（拡張子で判定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

impl BenchConfig {
    /// デフォルト設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルから設定を読み込み（`.json` は JSON、それ以外は TOML）
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BenchConfig = match Format::of(path) {
            Format::Json => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Format::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
        };

        Ok(config.normalized())
    }

    /// 設定を読み込み（失敗時は警告を出してデフォルト設定を返す）
    ///
    /// `path` が `None` ならデフォルトの設定ファイルパスを使う。ファイルが
    /// 存在しない場合は警告なしでデフォルト設定を返す。
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(get_default_config_path);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
            return Self::default();
        }

        Self::load_from_file(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config ({:#}), using defaults", e);
            Self::default()
        })
    }

    /// 設定をファイルに保存
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        // 親ディレクトリを作成
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = match Format::of(path) {
            Format::Json => {
                serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?
            }
            Format::Toml => {
                toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?
            }
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// 範囲外の値を補正
    ///
    /// temperature / top_p は [0, 1]、top_k・max_output_tokens・max_history_items は 1 以上。
    pub fn normalized(mut self) -> Self {
        let params = &mut self.generation_params;
        params.temperature = clamp_unit(params.temperature, default_temperature());
        params.top_p = clamp_unit(params.top_p, default_top_p());
        params.top_k = params.top_k.max(1);
        params.max_output_tokens = params.max_output_tokens.max(1);
        self.app_config.max_history_items = self.app_config.max_history_items.max(1);
        self
    }

    /// 一覧にあるモデルならそのまま、なければフォールバックモデル
    pub fn resolved_default_model(&self) -> &str {
        let model = self.api_settings.default_model.as_str();
        if CURATED_MODELS.contains(&model) {
            model
        } else {
            FALLBACK_MODEL
        }
    }

    /// 表示用（API キーをマスク）
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_settings.gemini_api_key.is_empty() {
            copy.api_settings.gemini_api_key = "***".to_string();
        }
        copy
    }
}

/// デフォルトのデータディレクトリを取得
/// Windows: %USERPROFILE%\.gemini-bench
/// Unix: ~/.gemini-bench
pub fn get_default_data_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".gemini-bench")
    } else {
        PathBuf::from(".gemini-bench")
    }
}

/// デフォルトの設定ファイルパスを取得
pub fn get_default_config_path() -> PathBuf {
    get_default_data_dir().join("config.toml")
}
