//! Bots Long Poll loop delivering `message_new` updates.

use std::{fmt, time::Duration};

use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::vk_api::{LongPollServer, VkClient};
use crate::{
    application::{ContextId, InboundEvent},
    error::BotError,
};

const WAIT_SECS: u64 = 25;
const MAX_BACKOFF_SECS: u64 = 60;

/// Event cursor; the API sends it either as a string or as a number.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Ts {
    Text(String),
    Number(i64),
}

impl fmt::Display for Ts {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ts::Text(value) => write!(formatter, "{}", value),
            Ts::Number(value) => write!(formatter, "{}", value),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PollResponse {
    pub ts: Option<Ts>,
    #[serde(default)]
    pub updates: Vec<Update>,
    pub failed: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub object: Value,
}

#[derive(Debug, Deserialize)]
struct MessageNew {
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    text: String,
    peer_id: i64,
    from_id: i64,
    #[serde(default)]
    conversation_message_id: i64,
    reply_message: Option<RepliedMessage>,
}

#[derive(Debug, Deserialize)]
struct RepliedMessage {
    #[serde(default)]
    text: String,
}

/// Turns a `message_new` update into an inbound event; other updates are skipped.
pub fn parse_update(update: Update) -> Option<InboundEvent> {
    if update.kind != "message_new" {
        return None;
    }
    match serde_json::from_value::<MessageNew>(update.object) {
        Ok(MessageNew { message }) => Some(InboundEvent {
            text: message.text,
            context_id: ContextId(message.peer_id),
            message_id: message.conversation_message_id,
            submitter_id: message.from_id,
            reply_text: message.reply_message.map(|reply| reply.text),
        }),
        Err(e) => {
            warn!("Unreadable message_new update: {}", e);
            None
        }
    }
}

/// What the loop does after one poll response.
#[derive(Debug, PartialEq)]
pub enum PollStep {
    /// Deliver the events and continue from the new cursor.
    Events(String, Vec<InboundEvent>),
    /// History is out of date; continue from the given cursor.
    Resume(String),
    /// Key expired or information lost; ask for a new server.
    Reconnect,
}

pub fn next_step(current_ts: &str, response: PollResponse) -> PollStep {
    match response.failed {
        Some(1) => PollStep::Resume(
            response
                .ts
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| current_ts.to_string()),
        ),
        Some(_) => PollStep::Reconnect,
        None => {
            let ts = response
                .ts
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| current_ts.to_string());
            let events = response.updates.into_iter().filter_map(parse_update).collect();
            PollStep::Events(ts, events)
        }
    }
}

pub struct LongPoll {
    vk: VkClient,
    group_id: i64,
}

impl LongPoll {
    pub fn new(vk: VkClient, group_id: i64) -> Self {
        Self { vk, group_id }
    }

    /// Starts polling in the background. The receiver closes once `token`
    /// is cancelled.
    pub fn start(self, token: CancellationToken) -> mpsc::Receiver<InboundEvent> {
        let (tx, rx) = mpsc::channel(64);
        info!("Long poll starting for group {}", self.group_id);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => info!("Long poll stopped"),
                _ = self.poll_forever(tx) => {}
            }
        });
        rx
    }

    async fn poll_forever(&self, tx: mpsc::Sender<InboundEvent>) {
        let mut backoff_secs: u64 = 1;
        let mut server: Option<LongPollServer> = None;

        loop {
            let current = match server.take() {
                Some(current) => current,
                None => match self.vk.long_poll_server(self.group_id).await {
                    Ok(fresh) => fresh,
                    Err(e) => {
                        error!("Long poll server error (retry in {}s): {}", backoff_secs, e);
                        backoff(&mut backoff_secs).await;
                        continue;
                    }
                },
            };

            let response = match self.poll_once(&current).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Long poll error (retry in {}s): {}", backoff_secs, e);
                    server = Some(current);
                    backoff(&mut backoff_secs).await;
                    continue;
                }
            };
            backoff_secs = 1;

            match next_step(&current.ts, response) {
                PollStep::Events(ts, events) => {
                    for event in events {
                        if tx.send(event).await.is_err() {
                            info!("Event receiver dropped, long poll exiting");
                            return;
                        }
                    }
                    server = Some(LongPollServer { ts, ..current });
                }
                PollStep::Resume(ts) => {
                    warn!("Long poll history outdated, resuming from {}", ts);
                    server = Some(LongPollServer { ts, ..current });
                }
                PollStep::Reconnect => {
                    warn!("Long poll key expired, reconnecting");
                }
            }
        }
    }

    async fn poll_once(&self, server: &LongPollServer) -> Result<PollResponse, BotError> {
        let wait = WAIT_SECS.to_string();
        let response = self
            .vk
            .client
            .get(&server.server)
            .query(&[
                ("act", "a_check"),
                ("key", server.key.as_str()),
                ("ts", server.ts.as_str()),
                ("wait", wait.as_str()),
            ])
            .timeout(Duration::from_secs(WAIT_SECS + 10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

async fn backoff(backoff_secs: &mut u64) {
    tokio::time::sleep(Duration::from_secs(*backoff_secs)).await;
    *backoff_secs = (*backoff_secs * 2).min(MAX_BACKOFF_SECS);
}
