use anyhow::anyhow;
use curator_session::{InputDecision, QueryOutcome};

use crate::cli::{FilterArgs, OutputFormat, SearchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_rows;

pub(crate) async fn handle_search(
    ctx: &AppContext,
    args: SearchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let SearchArgs { term } = args;
    stage_term(ctx, &term)?;
    settle(ctx, ctx.session.search_now().await)?;
    render_rows(&ctx.session.snapshot(), output)
}

pub(crate) async fn handle_filter(
    ctx: &AppContext,
    args: FilterArgs,
    output: OutputFormat,
) -> CliResult<()> {
    if args.filters.is_empty() {
        return Err(CliError::validation(
            "pass at least one --set key=value filter",
        ));
    }
    if let Some(term) = &args.search {
        stage_term(ctx, term)?;
    }
    for (key, value) in args.filters {
        let outcome = ctx.session.change_filter(&key, Some(value)).await;
        settle(ctx, outcome)?;
    }
    render_rows(&ctx.session.snapshot(), output)
}

/// Record the search term without waiting out the debounce window; the next
/// dispatch carries it.
fn stage_term(ctx: &AppContext, term: &str) -> CliResult<()> {
    if term.trim().is_empty() {
        return Ok(());
    }
    match ctx.session.search_input(term) {
        InputDecision::Suppressed => Err(CliError::validation(format!(
            "search term must be at least {} characters",
            ctx.session.config().min_term_len
        ))),
        InputDecision::Scheduled | InputDecision::Dispatched => Ok(()),
    }
}

fn settle(ctx: &AppContext, outcome: QueryOutcome) -> CliResult<()> {
    match outcome {
        QueryOutcome::Applied(_) => Ok(()),
        QueryOutcome::Stale(ticket) => Err(CliError::failure(anyhow!(
            "query {} was superseded before it completed",
            ticket.get()
        ))),
        QueryOutcome::Failed(err) => Err(ctx.fail(&err)),
    }
}
