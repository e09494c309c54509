use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};
use tokio::{sync::mpsc, task::JoinSet};

use super::endpoints::{handle_chat_message, BotController};
use crate::application::{CommandRouter, ContextId, InboundEvent};

/// One worker task per chat.
///
/// Messages of a chat are handled one at a time in arrival order, while
/// different chats progress independently.
pub struct ChatWorkers {
    router: Arc<CommandRouter>,
    controller: Arc<BotController>,
    reaction_chance_percent: u32,
    queues: HashMap<ContextId, mpsc::UnboundedSender<InboundEvent>>,
    workers: JoinSet<()>,
}

impl ChatWorkers {
    pub fn new(
        router: Arc<CommandRouter>,
        controller: Arc<BotController>,
        reaction_chance_percent: u32,
    ) -> Self {
        Self {
            router,
            controller,
            reaction_chance_percent,
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queues `event` behind the earlier messages of its chat.
    pub fn deliver(&mut self, event: InboundEvent) {
        let context = event.context_id;
        let queue = self.queues.entry(context).or_insert_with(|| {
            spawn_worker(
                &mut self.workers,
                &self.router,
                &self.controller,
                self.reaction_chance_percent,
                context,
            )
        });
        if let Err(mpsc::error::SendError(event)) = queue.send(event) {
            warn!("Worker for chat {} is gone, starting a new one", context);
            *queue = spawn_worker(
                &mut self.workers,
                &self.router,
                &self.controller,
                self.reaction_chance_percent,
                context,
            );
            if queue.send(event).is_err() {
                warn!("Dropped a message for chat {}", context);
            }
        }
    }

    /// Number of chats with a running worker.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Closes every queue and waits until the queued messages are handled.
    pub async fn shutdown(mut self) {
        info!("Draining {} chat worker(s)", self.queues.len());
        self.queues.clear();
        while let Some(outcome) = self.workers.join_next().await {
            if let Err(e) = outcome {
                warn!("Chat worker aborted: {}", e);
            }
        }
    }
}

fn spawn_worker(
    workers: &mut JoinSet<()>,
    router: &Arc<CommandRouter>,
    controller: &Arc<BotController>,
    reaction_chance_percent: u32,
    context: ContextId,
) -> mpsc::UnboundedSender<InboundEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let router = Arc::clone(router);
    let controller = Arc::clone(controller);
    debug!("Starting worker for chat {}", context);
    workers.spawn(async move {
        while let Some(event) = rx.recv().await {
            handle_chat_message(&router, &controller, reaction_chance_percent, event).await;
        }
        debug!("Worker for chat {} finished", context);
    });
    tx
}
