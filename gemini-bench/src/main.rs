use anyhow::{bail, Context};
use app_config::{get_default_config_path, BenchConfig, CURATED_MODELS};
use clap::{Args, Parser, Subcommand};
use gemini_client::GeminiClient;
use generation_strategy::{
    Credential, GenerationDispatcher, GenerationRequest, GenerationResult, StrategyKind,
};
use run_history::{HistoryBuffer, HistoryRecord};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod report;

/// Measure Gemini API latency through the client library or direct REST calls.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Config file, TOML or JSON (defaults to ~/.gemini-bench/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a prompt with one strategy and report the elapsed time
    Run {
        /// Call strategy: `library` (streaming) or `rest` (direct POST)
        #[arg(short, long, default_value = "library")]
        strategy: StrategyKind,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the same prompt with both strategies, one after the other
    Compare {
        #[command(flatten)]
        run: RunArgs,
    },
    /// List preset prompts
    Presets,
    /// List selectable models
    Models,
    /// Show or initialise the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key masked)
    Show,
    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Prompt text
    #[arg(short, long, conflicts_with = "preset")]
    prompt: Option<String>,

    /// Use a preset prompt from the configuration
    #[arg(long, value_parser = ["short", "medium", "long"])]
    preset: Option<String>,

    /// Model id (defaults to the configured model)
    #[arg(short, long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    top_p: Option<f64>,

    #[arg(long)]
    top_k: Option<u32>,

    #[arg(long)]
    max_output_tokens: Option<u32>,

    /// API key (falls back to the configuration file)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Number of rounds to run
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,
}

/// 1 セッション分の状態（設定・ディスパッチャ・履歴）
struct Session {
    config: BenchConfig,
    dispatcher: GenerationDispatcher,
    history: HistoryBuffer,
}

impl Session {
    fn new(config: BenchConfig) -> anyhow::Result<Self> {
        let timeout = match config.api_settings.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = GeminiClient::with_timeout(&config.api_settings.base_url, timeout)
            .context("Failed to create Gemini client")?;
        Ok(Self::with_dispatcher(config, GenerationDispatcher::from_client(client)))
    }

    fn with_dispatcher(config: BenchConfig, dispatcher: GenerationDispatcher) -> Self {
        let history = HistoryBuffer::new(config.app_config.max_history_items);
        Self {
            config,
            dispatcher,
            history,
        }
    }

    fn build_request(
        &self,
        args: &RunArgs,
        strategy: StrategyKind,
    ) -> anyhow::Result<GenerationRequest> {
        let prompt = match (&args.prompt, &args.preset) {
            (Some(prompt), _) => prompt.clone(),
            (None, Some(name)) => self
                .config
                .preset_prompts
                .get(name)
                .with_context(|| format!("Unknown preset: {}", name))?
                .to_string(),
            (None, None) => bail!("No prompt given. Use --prompt or --preset."),
        };
        if prompt.trim().is_empty() {
            bail!("Prompt is empty.");
        }

        let api_key = args
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| self.config.api_settings.gemini_api_key.clone());
        let credential = Credential::new(api_key);
        if credential.is_empty() {
            bail!("No API key. Pass --api-key, set GEMINI_API_KEY, or add it to the config file.");
        }

        let model = match &args.model {
            Some(model) => {
                if !CURATED_MODELS.contains(&model.as_str()) {
                    tracing::warn!(model = %model, "model is not in the curated list");
                }
                model.clone()
            }
            None => self.config.resolved_default_model().to_string(),
        };

        let params = &self.config.generation_params;
        Ok(GenerationRequest::builder(prompt, model, credential)
            .temperature(args.temperature.unwrap_or(params.temperature))
            .top_p(args.top_p.unwrap_or(params.top_p))
            .top_k(args.top_k.unwrap_or(params.top_k))
            .max_output_tokens(args.max_output_tokens.unwrap_or(params.max_output_tokens))
            .strategy(strategy)
            .build())
    }

    /// 1 回実行して結果を表示し、成功したら履歴に追加
    async fn run_once(&mut self, request: &GenerationRequest) -> GenerationResult {
        eprintln!(
            "Waiting for a response from the Gemini API ({})...",
            request.strategy().label()
        );
        let result = self.dispatcher.dispatch(request).await;

        report::print_result(request, &result, &self.config.app_config);

        if result.is_success() && self.config.app_config.save_history {
            self.history.append(HistoryRecord::from_run(request, &result));
        }
        result
    }

    async fn run_rounds(
        &mut self,
        args: &RunArgs,
        strategies: &[StrategyKind],
    ) -> anyhow::Result<()> {
        let base = self.build_request(args, strategies[0])?;

        for round in 1..=args.repeat {
            if args.repeat > 1 {
                println!("\n=== Round {}/{} ===", round, args.repeat);
            }
            let mut results = Vec::with_capacity(strategies.len());
            for &kind in strategies {
                let request = base.with_strategy(kind);
                let result = self.run_once(&request).await;
                results.push((kind, result));
            }
            if results.len() > 1 && self.config.app_config.measure_execution_time {
                report::print_comparison(&results);
            }
        }

        if self.config.app_config.save_history && !self.history.is_empty() {
            report::print_history(&self.history, self.config.app_config.measure_execution_time);
        }
        Ok(())
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_default_config_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = BenchConfig::load_or_default(cli.config.as_deref());

    match cli.cmd {
        Some(Commands::Run { strategy, run }) => {
            Session::new(config)?.run_rounds(&run, &[strategy]).await?;
        }
        Some(Commands::Compare { run }) => {
            Session::new(config)?.run_rounds(&run, &StrategyKind::ALL).await?;
        }
        Some(Commands::Presets) => {
            for (name, prompt) in config.preset_prompts.entries() {
                println!("- {:<7} {}", name, prompt);
            }
        }
        Some(Commands::Models) => {
            let default = config.resolved_default_model();
            for model in CURATED_MODELS {
                let marker = if *model == default { " (default)" } else { "" };
                println!("- {}{}", model, marker);
            }
        }
        Some(Commands::Config { action: ConfigAction::Show }) => {
            println!("# {}", config_path(cli.config.as_deref()).display());
            print!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        Some(Commands::Config { action: ConfigAction::Init { force } }) => {
            let path = config_path(cli.config.as_deref());
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            BenchConfig::default().save_to_file(&path)?;
            println!("Config saved to: {}", path.display());
        }
        None => {
            println!("No command specified. Use --help for usage.");
        }
    }

    Ok(())
}
