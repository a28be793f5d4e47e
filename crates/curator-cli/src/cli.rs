//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use curator_session::{Action, ItemId};
use curator_telemetry::{LogFormat, LoggingConfig, command_span, init_logging, record_entity};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::actions::{handle_act, handle_bulk};
use crate::commands::inspect::{handle_stats, handle_view};
use crate::commands::list::{handle_filter, handle_search};
use crate::commands::watch::handle_watch;
use crate::profile::Profile;

pub(crate) const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub(crate) const DEFAULT_ENTITY: &str = "stories";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command, and reports errors on
/// stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let request_id = Uuid::new_v4().to_string();

    let profile = match cli.profile.as_deref().map(Profile::load).transpose() {
        Ok(profile) => profile.unwrap_or_default(),
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    let format = cli
        .log_format
        .or(profile.log_format)
        .unwrap_or_else(LogFormat::infer);
    let logging = LoggingConfig {
        level: &cli.log_level,
        format,
        build_sha: option_env!("CURATOR_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let span = command_span(command_label(&cli.command), &request_id);
    let result = async move {
        let ctx = AppContext::from_cli(&cli, &request_id, profile)?;
        record_entity(&tracing::Span::current(), ctx.entity());
        dispatch(&ctx, cli.command, cli.output).await
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(
    ctx: &AppContext,
    command: Command,
    output: OutputFormat,
) -> CliResult<()> {
    match command {
        Command::Search(args) => handle_search(ctx, args, output).await,
        Command::Filter(args) => handle_filter(ctx, args, output).await,
        Command::Act(args) => handle_act(ctx, args, output).await,
        Command::Bulk(args) => handle_bulk(ctx, args, output).await,
        Command::Stats => handle_stats(ctx, output).await,
        Command::View(args) => handle_view(ctx, args, output).await,
        Command::Watch(args) => handle_watch(ctx, args, output).await,
    }
}

#[derive(Parser)]
#[command(name = "curator", about = "Manage entity lists on a Curator admin server")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "CURATOR_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "CURATOR_ENTITY",
        help = "Entity list to operate on [default: stories]"
    )]
    pub(crate) entity: Option<String>,
    #[arg(long, global = true, env = "CURATOR_CSRF_TOKEN")]
    pub(crate) csrf_token: Option<String>,
    #[arg(
        long,
        global = true,
        env = "CURATOR_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "CURATOR_PROFILE",
        help = "JSON file with session timings, entity labels, and route overrides"
    )]
    pub(crate) profile: Option<PathBuf>,
    #[arg(
        long,
        short = 'y',
        global = true,
        help = "Accept confirmation prompts without asking"
    )]
    pub(crate) yes: bool,
    #[arg(
        long,
        global = true,
        env = "CURATOR_LOG",
        default_value = DEFAULT_CLI_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "CURATOR_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a text search and print the matching rows.
    Search(SearchArgs),
    /// Apply categorical filters and print the rows of the returned list.
    Filter(FilterArgs),
    /// Run one action against one item.
    Act(ActArgs),
    /// Run one action against many items in a single request.
    Bulk(BulkArgs),
    /// Print aggregate statistics.
    Stats,
    /// Print one item.
    View(ViewArgs),
    /// Follow server-push notifications.
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SearchArgs {
    #[arg(default_value = "")]
    pub(crate) term: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    #[arg(long = "set", value_parser = parse_filter, help = "Filter as key=value; an empty value clears it")]
    pub(crate) filters: Vec<(String, String)>,
    #[arg(long)]
    pub(crate) search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ActArgs {
    #[arg(value_parser = parse_item_id)]
    pub(crate) id: ItemId,
    #[arg(value_parser = parse_action)]
    pub(crate) action: Action,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct BulkArgs {
    #[arg(value_parser = parse_action)]
    pub(crate) action: Action,
    #[arg(value_parser = parse_item_id, num_args = 1.., required = true)]
    pub(crate) ids: Vec<ItemId>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ViewArgs {
    #[arg(value_parser = parse_item_id)]
    pub(crate) id: ItemId,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub(crate) struct WatchArgs {
    #[arg(long, help = "Stop after this many seconds instead of waiting for Ctrl-C")]
    pub(crate) seconds: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Search(_) => "search",
        Command::Filter(_) => "filter",
        Command::Act(_) => "act",
        Command::Bulk(_) => "bulk",
        Command::Stats => "stats",
        Command::View(_) => "view",
        Command::Watch(_) => "watch",
    }
}

pub(crate) fn parse_action(input: &str) -> Result<Action, String> {
    input.parse::<Action>().map_err(|_| {
        let known = Action::ALL
            .iter()
            .map(|action| action.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown action '{input}' (expected one of: {known})")
    })
}

pub(crate) fn parse_item_id(input: &str) -> Result<ItemId, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("item id must not be empty".to_string());
    }
    Ok(ItemId::from(trimmed))
}

pub(crate) fn parse_filter(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("filter '{input}' must be key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter '{input}' has an empty key"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub(crate) fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input
        .parse::<LogFormat>()
        .map_err(|err| format!("{err}: '{}' (expected json or pretty)", err.value))
}
