//! Periodic side effects in the main chat: quote broadcast, presence
//! simulation and video reposts.

use std::{future::Future, time::Duration};

use log::{debug, info, warn};
use rand::Rng;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{Activity, ContextId, MessagingClient, Store};

/// Runs `job` every `period` until `token` is cancelled.
///
/// The first tick fires one full period after start. A failing run is logged
/// and the schedule continues.
pub async fn run_periodic<F, Fut>(
    name: &str,
    period: Duration,
    token: CancellationToken,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    info!("Job {} scheduled every {:?}", name, period);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Job {} stopped", name);
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = job().await {
                    warn!("Job {} failed: {:#}", name, e);
                }
            }
        }
    }
}

/// Posts one random quote to `chat`. Returns whether anything was sent.
pub async fn broadcast_random_quote(
    messenger: &dyn MessagingClient,
    store: &dyn Store,
    chat: ContextId,
) -> anyhow::Result<bool> {
    let Some((text, author)) = store.random_quote().await? else {
        debug!("No quotes to broadcast");
        return Ok(false);
    };
    messenger
        .send_message(chat, &format!("{} © {}", text, author))
        .await?;
    Ok(true)
}

/// Maps a roll in `0..10` to an activity: 6 and above record audio.
pub fn pick_activity(roll: u32) -> Activity {
    if roll > 5 {
        Activity::AudioMessage
    } else {
        Activity::Typing
    }
}

pub async fn simulate_activity(
    messenger: &dyn MessagingClient,
    chat: ContextId,
) -> anyhow::Result<()> {
    let roll = rand::thread_rng().gen_range(0..10);
    let activity = pick_activity(roll);
    debug!("Simulating {} in chat {}", activity.as_str(), chat);
    messenger.set_activity(chat, activity).await?;
    Ok(())
}

/// Saves `link` on the platform and posts it to `chat`.
pub async fn repost_video(
    messenger: &dyn MessagingClient,
    chat: ContextId,
    caption: &str,
    link: &str,
) -> anyhow::Result<()> {
    let video = messenger.upload_video(link).await?;
    info!("Reposting {} as {}", link, video.attachment_ref());
    messenger.send_video(chat, caption, &video).await?;
    Ok(())
}
