use std::future;
use std::time::Duration;

use anyhow::anyhow;
use curator_session::FeedStatus;
use futures_util::StreamExt;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::cli::{OutputFormat, WatchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_notification;

const FEED_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Follow the realtime feed until Ctrl-C, the optional deadline, or the server
/// closing the stream.
pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: WatchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let mut notices = ctx.session.notification_stream();
    ctx.session.start();

    let deadline = args
        .seconds
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    let mut feed_check = time::interval(FEED_CHECK_INTERVAL);
    feed_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let stop = sleep_until(deadline);
    tokio::pin!(stop);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let result = loop {
        tokio::select! {
            biased;
            notice = notices.next() => match notice {
                Some(Ok(notice)) => {
                    if let Err(err) = render_notification(&notice, output) {
                        break Err(err);
                    }
                }
                Some(Err(err)) => warn!(error = %err, "notification stream lagged"),
                None => break Ok(()),
            },
            () = &mut stop => break Ok(()),
            signal = &mut interrupt => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                break Ok(());
            }
            _ = feed_check.tick() => {
                if ctx.session.feed_status() == Some(FeedStatus::Closed) {
                    break Err(CliError::failure(anyhow!("event stream closed")));
                }
            }
        }
    };

    ctx.session.shutdown();
    info!(entity = %ctx.entity(), "watch stopped");
    result
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
