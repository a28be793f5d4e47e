use crate::cli::{OutputFormat, ViewArgs};
use crate::client::{AppContext, CliResult};
use crate::output::{render_record, render_stats};

pub(crate) async fn handle_stats(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    ctx.session
        .refresh_stats()
        .await
        .map_err(|err| ctx.fail(&err))?;
    render_stats(&ctx.session.snapshot().stats, output)
}

pub(crate) async fn handle_view(
    ctx: &AppContext,
    args: ViewArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let ViewArgs { id } = args;
    let record = ctx
        .session
        .view_item(&id)
        .await
        .map_err(|err| ctx.fail(&err))?;
    render_record(&record, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::context_with;
    use curator_session::ItemId;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn stats_are_fetched_and_stored() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/admin/episodes/statistics")
                .header("x-request-id", "req-test");
            then.status(200)
                .json_body(json!({"success": true, "stats": {"total": 40, "pending": 6}}));
        });

        let ctx = context_with(&server, &["--entity", "episodes"]);
        handle_stats(&ctx, OutputFormat::Table)
            .await
            .expect("stats should succeed");

        mock.assert();
        assert_eq!(ctx.session.snapshot().stats.count("pending"), Some(6));
    }

    #[tokio::test]
    async fn missing_items_report_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/admin/stories/77");
            then.status(404).json_body(json!({"message": "Story not found"}));
        });

        let ctx = context_with(&server, &[]);
        let err = handle_view(
            &ctx,
            ViewArgs {
                id: ItemId::from(77),
            },
            OutputFormat::Json,
        )
        .await
        .expect_err("missing item should fail");

        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("Story not found"));
    }
}
