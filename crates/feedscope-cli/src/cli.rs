//! Command-line surface of the feedback-insights dashboard.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use feedscope_core::{QueueKind, ToastCenter, ToastKind};
use feedscope_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span};
use reqwest::Url;
use tokio::io::BufReader;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::{EnvToken, FileToken, StaticToken, TOKEN_ENV, TokenProvider};
use crate::client::{ApiClient, CliResult, parse_url};
use crate::commands::AppContext;
use crate::commands::dashboard::handle_dashboard;
use crate::commands::products::{
    handle_add, handle_ask, handle_list, handle_queue, handle_remove, handle_whoami,
};
use crate::output::format_toast;
use crate::prompt::{AssumeYes, Confirm, LineConfirm, shared_lines};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Parses CLI arguments, executes the requested command, and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format,
        build_sha: option_env!("FEEDSCOPE_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = feedscope_telemetry::init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let trace_id = Uuid::new_v4().to_string();
    let span = command_span(command_label(&cli.command), &trace_id);
    let result = dispatch(cli, &trace_id).instrument(span).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    let http = ApiClient::build_http(Duration::from_secs(cli.timeout), trace_id)?;
    let tokens = token_provider(cli.token, cli.token_file);
    let toasts = match cli.command {
        Command::Dashboard => ToastCenter::new(),
        _ => progress_toasts(io::stderr().is_terminal()),
    };
    let ctx = AppContext {
        api: ApiClient::new(http, cli.api_url.clone(), tokens),
        api_url: cli.api_url,
        toasts,
        output: cli.output,
    };
    tracing::debug!(api_url = %ctx.api_url, "dispatching command");

    let mut out = io::stdout();
    match cli.command {
        Command::Ls => handle_list(&ctx, &mut out).await,
        Command::Add(args) => handle_add(&ctx, args, &mut out).await,
        Command::Rm(args) => {
            let confirm: Arc<dyn Confirm> = if args.yes {
                Arc::new(AssumeYes)
            } else {
                Arc::new(LineConfirm::new(shared_lines(BufReader::new(
                    tokio::io::stdin(),
                ))))
            };
            handle_remove(&ctx, args, confirm, &mut out).await
        }
        Command::Ingest(args) => handle_queue(&ctx, args, QueueKind::Scrape, &mut out).await,
        Command::Report(args) => handle_queue(&ctx, args, QueueKind::Report, &mut out).await,
        Command::Ask(args) => handle_ask(&ctx, args, &mut out).await,
        Command::Whoami => handle_whoami(&ctx, &mut out).await,
        Command::Dashboard => handle_dashboard(&ctx, &mut out).await,
    }
}

/// Explicit `--token` wins, then `--token-file`, then the environment.
fn token_provider(token: Option<String>, token_file: Option<PathBuf>) -> Arc<dyn TokenProvider> {
    match (token, token_file) {
        (Some(token), _) => Arc::new(StaticToken(Some(token))),
        (None, Some(path)) => Arc::new(FileToken { path }),
        (None, None) => Arc::new(EnvToken {
            var: TOKEN_ENV.to_string(),
        }),
    }
}

/// One-shot commands print their outcome on stdout; only progress goes to stderr.
fn progress_toasts(show_progress: bool) -> ToastCenter {
    ToastCenter::with_observer(move |toast| {
        tracing::debug!(kind = ?toast.kind, message = %toast.message, "notification");
        if show_progress && toast.kind == ToastKind::Loading {
            eprintln!("{}", format_toast(toast));
        }
    })
}

#[derive(Parser)]
#[command(
    name = "feedscope",
    about = "Manage tracked products and queue feedback jobs"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "FEEDSCOPE_API_BASE_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(long, global = true, help = "Bearer token (overrides FEEDSCOPE_TOKEN)")]
    token: Option<String>,
    #[arg(
        long,
        global = true,
        env = "FEEDSCOPE_TOKEN_FILE",
        help = "File holding the bearer token, re-read on every request"
    )]
    token_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "FEEDSCOPE_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "FEEDSCOPE_LOG_FORMAT",
        value_parser = parse_log_format,
        default_value = "auto"
    )]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List tracked products.
    Ls,
    /// Track a new product.
    Add(AddArgs),
    /// Delete a product and its collected feedback.
    Rm(RemoveArgs),
    /// Queue feedback collection for a product.
    Ingest(ProductIdArgs),
    /// Queue report generation and email delivery for a product.
    Report(ProductIdArgs),
    /// Ask a question about a product's collected feedback.
    Ask(AskArgs),
    /// Show the API endpoint and whether a token is available.
    Whoami,
    /// Interactive dashboard.
    Dashboard,
}

#[derive(Args)]
pub(crate) struct AddArgs {
    #[arg(help = "Product display name")]
    pub(crate) name: String,
    #[arg(long, help = "Optional web search query")]
    pub(crate) search_query: Option<String>,
    #[arg(
        long = "youtube",
        help = "Comma-separated YouTube keywords (e.g. \"review, unboxing\")"
    )]
    pub(crate) youtube_keywords: String,
    #[arg(
        long = "reddit",
        help = "Comma-separated subreddit names (e.g. \"headphones, audiophile\")"
    )]
    pub(crate) reddit_subreddits: String,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    #[arg(help = "Product identifier")]
    pub(crate) id: i64,
    #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct ProductIdArgs {
    #[arg(help = "Product identifier")]
    pub(crate) id: i64,
}

#[derive(Args)]
pub(crate) struct AskArgs {
    #[arg(help = "Product identifier")]
    pub(crate) id: i64,
    #[arg(help = "Question about the collected feedback")]
    pub(crate) question: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ls => "ls",
        Command::Add(_) => "add",
        Command::Rm(_) => "rm",
        Command::Ingest(_) => "ingest",
        Command::Report(_) => "report",
        Command::Ask(_) => "ask",
        Command::Whoami => "whoami",
        Command::Dashboard => "dashboard",
    }
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}
