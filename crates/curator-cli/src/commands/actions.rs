use curator_session::{ItemId, Record, SearchPage, Stats};
use serde_json::Map;

use crate::cli::{ActArgs, BulkArgs, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::output::render_outcome;

pub(crate) async fn handle_act(
    ctx: &AppContext,
    args: ActArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let ActArgs { id, action } = args;
    ctx.session.mount(target_page(vec![id.clone()]));
    let outcome = ctx
        .session
        .act(&id, action)
        .await
        .map_err(|err| ctx.fail(&err))?;
    render_outcome(&outcome, &ctx.session.snapshot(), output)
}

pub(crate) async fn handle_bulk(
    ctx: &AppContext,
    args: BulkArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let BulkArgs { action, ids } = args;
    ctx.session.mount(target_page(ids.clone()));
    ctx.session.select_all(&ids);
    let outcome = ctx
        .session
        .run_bulk(Some(action))
        .await
        .map_err(|err| ctx.fail(&err))?;
    render_outcome(&outcome, &ctx.session.snapshot(), output)
}

/// Rows for the targeted ids so the patcher has something to update.
fn target_page(ids: Vec<ItemId>) -> SearchPage<Record> {
    SearchPage {
        items: ids
            .into_iter()
            .map(|id| Record {
                id,
                fields: Map::new(),
            })
            .collect(),
        stats: Stats::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::context_with;
    use curator_session::Action;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn act_patches_the_row_badge() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/admin/stories/12/suspend")
                .header("x-requested-with", "XMLHttpRequest")
                .header("x-csrf-token", "tok");
            then.status(200)
                .json_body(json!({"success": true, "message": "Story suspended"}));
        });

        let ctx = context_with(&server, &["--csrf-token", "tok"]);
        let args = ActArgs {
            id: ItemId::from(12),
            action: Action::Suspend,
        };
        handle_act(&ctx, args, OutputFormat::Table)
            .await
            .expect("act should succeed");

        mock.assert();
        let snapshot = ctx.session.snapshot();
        let badge = snapshot.rows[0].badge.clone().expect("badge after suspend");
        assert_eq!(badge.label, "suspended");
    }

    #[tokio::test]
    async fn delete_removes_the_row_after_success() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/admin/stories/5");
            then.status(200).json_body(json!({"success": true}));
        });

        let ctx = context_with(&server, &[]);
        let args = ActArgs {
            id: ItemId::from(5),
            action: Action::Delete,
        };
        handle_act(&ctx, args, OutputFormat::Json)
            .await
            .expect("delete should succeed");

        mock.assert();
        assert!(ctx.session.snapshot().rows.is_empty());
    }

    #[tokio::test]
    async fn bulk_submits_one_form_and_clears_selection() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/admin/stories/bulk-action")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200)
                .json_body(json!({"success": true, "message": "2 stories archived"}));
        });

        let ctx = context_with(&server, &[]);
        let args = BulkArgs {
            action: Action::Archive,
            ids: vec![ItemId::from(1), ItemId::from(2)],
        };
        handle_bulk(&ctx, args, OutputFormat::Table)
            .await
            .expect("bulk should succeed");

        mock.assert_calls(1);
        let snapshot = ctx.session.snapshot();
        assert!(snapshot.selection.is_empty());
        assert!(
            snapshot
                .rows
                .iter()
                .all(|row| row.badge.as_ref().is_some_and(|badge| badge.label == "archived"))
        );
    }

    #[tokio::test]
    async fn rejected_actions_exit_with_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/admin/stories/8/publish");
            then.status(200)
                .json_body(json!({"success": false, "message": "Story has no body"}));
        });

        let ctx = context_with(&server, &[]);
        let args = ActArgs {
            id: ItemId::from(8),
            action: Action::Publish,
        };
        let err = handle_act(&ctx, args, OutputFormat::Table)
            .await
            .expect_err("rejected publish should fail");

        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.display_message(), "Story has no body");
        assert!(ctx.session.snapshot().rows[0].badge.is_none());
    }
}
