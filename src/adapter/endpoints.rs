use std::{future::Future, sync::Arc};

use anyhow::Context;
use log::{debug, info, warn};
use rand::Rng;

use crate::{
    application::{
        CommandDefinition, CommandHandler, CommandRouter, ContextId, DispatchReport,
        ExtractedParameters, InboundEvent, MessagingClient, Store,
    },
    error::BotError,
};

/// Longest chronicle message, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 9000;
pub const REACTION_COUNT: u32 = 16;

pub const NO_QUOTES_BY_AUTHOR: &str = "Нет цитат по такому автору";
pub const NO_STORY_EVENTS: &str = "Нет событий";
pub const QUOTE_ADDED: &str = "Добавили цитату";
pub const STORY_EVENT_ADDED: &str = "Добавили событие";

/// Shared state handed to every command handler.
pub struct BotController {
    pub messenger: Arc<dyn MessagingClient>,
    pub store: Arc<dyn Store>,
    /// The chat every reply goes to.
    pub chat_id: ContextId,
}

impl BotController {
    pub fn new(
        messenger: Arc<dyn MessagingClient>,
        store: Arc<dyn Store>,
        chat_id: ContextId,
    ) -> Self {
        Self {
            messenger,
            store,
            chat_id,
        }
    }

    /// Sends to `peer`, logging instead of failing.
    pub async fn say(&self, peer: ContextId, text: &str) {
        if let Err(e) = self.messenger.send_message(peer, text).await {
            warn!("Could not send to chat {} cause: {}", peer, e);
        }
    }
}

/// Splits lines into messages no longer than `limit` bytes.
///
/// Lines are never cut or dropped; a line longer than `limit` travels alone.
pub fn paginate<I>(lines: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut pages = Vec::new();
    let mut page = String::new();
    for line in lines {
        let chunk = format!("{line}\n");
        if !page.is_empty() && page.len() + chunk.len() > limit {
            pages.push(std::mem::take(&mut page));
        }
        page.push_str(&chunk);
    }
    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

fn param<'a>(params: &'a ExtractedParameters, name: &str) -> Result<&'a str, BotError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| BotError::MalformedInput(format!("missing parameter `{name}`")))
}

pub async fn relay_speech_action(
    controller: Arc<BotController>,
    params: ExtractedParameters,
    _event: InboundEvent,
) -> anyhow::Result<()> {
    let speech = param(&params, "speech")?;
    controller.say(controller.chat_id, speech).await;
    Ok(())
}

pub async fn quotes_by_author_action(
    controller: Arc<BotController>,
    params: ExtractedParameters,
    _event: InboundEvent,
) -> anyhow::Result<()> {
    let author = param(&params, "author")?;
    let quotes = controller
        .store
        .quotes_by_author(author)
        .await
        .context("could not look up quotes")?;
    let message = if quotes.is_empty() {
        NO_QUOTES_BY_AUTHOR.to_string()
    } else {
        quotes.iter().map(|quote| format!("{quote}\n")).collect()
    };
    controller.say(controller.chat_id, &message).await;
    Ok(())
}

pub async fn chronicle_action(
    controller: Arc<BotController>,
    _params: ExtractedParameters,
    _event: InboundEvent,
) -> anyhow::Result<()> {
    let events = controller
        .store
        .story_events()
        .await
        .context("could not read the chronicle")?;
    let pages = paginate(events.iter().map(ToString::to_string), MAX_MESSAGE_BYTES);
    if pages.is_empty() {
        controller.say(controller.chat_id, NO_STORY_EVENTS).await;
    }
    for page in pages {
        controller.say(controller.chat_id, &page).await;
    }
    Ok(())
}

pub async fn add_quote_action(
    controller: Arc<BotController>,
    params: ExtractedParameters,
    event: InboundEvent,
) -> anyhow::Result<()> {
    let author = param(&params, "author")?;
    let text = event
        .reply_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .context("a quote must reply to the quoted message")?;
    controller
        .store
        .insert_quote(text, author, event.submitter_id)
        .await
        .context("could not save the quote")?;
    info!("Quote by {} added by {}", author, event.submitter_id);
    controller.say(controller.chat_id, QUOTE_ADDED).await;
    Ok(())
}

pub async fn add_story_event_action(
    controller: Arc<BotController>,
    params: ExtractedParameters,
    _event: InboundEvent,
) -> anyhow::Result<()> {
    let description = param(&params, "event")?;
    controller
        .store
        .insert_story_event(description)
        .await
        .context("could not save the chronicle entry")?;
    controller.say(controller.chat_id, STORY_EVENT_ADDED).await;
    Ok(())
}

/// Binds an action to the shared controller.
fn route<F, Fut>(controller: &Arc<BotController>, action: F) -> impl CommandHandler + 'static
where
    F: Fn(Arc<BotController>, ExtractedParameters, InboundEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let controller = Arc::clone(controller);
    move |_context: ContextId, params: ExtractedParameters, event: InboundEvent| {
        action(Arc::clone(&controller), params, event)
    }
}

/// Registers the control-chat relay and the main-chat commands.
pub fn build_router(
    controller: &Arc<BotController>,
    control_chat_id: ContextId,
) -> Result<CommandRouter, BotError> {
    let chat_id = controller.chat_id;
    let mut router = CommandRouter::new();
    router
        .register(
            control_chat_id,
            CommandDefinition::new(r"^скр\s+.+", route(controller, relay_speech_action))?
                .with_extract(r"^скр\s+(?<speech>(?s).+)")?,
        )
        .register(
            chat_id,
            CommandDefinition::new(
                r"^цитаты по автору\s\S+$",
                route(controller, quotes_by_author_action),
            )?
            .with_extract(r"^цитаты по автору\s(?<author>\S+)$")?,
        )
        .register(
            chat_id,
            CommandDefinition::new(r"^летопись$", route(controller, chronicle_action))?,
        )
        .register(
            chat_id,
            CommandDefinition::new(r"^\+цитата\s+(.+)$", route(controller, add_quote_action))?
                .with_extract(r"^\+цитата\s+(?<author>.+)$")?,
        )
        .register(
            chat_id,
            CommandDefinition::new(
                r"^\+летопись\s+(.+)$",
                route(controller, add_story_event_action),
            )?
            .with_extract(r"^\+летопись\s+(?<event>(.+))$")?,
        );
    Ok(router)
}

/// Whether a message gets a reaction, given a roll in `0..100`.
pub fn should_react(roll: u32, chance_percent: u32) -> bool {
    roll < chance_percent
}

/// Routes one inbound message, then maybe reacts to it.
pub async fn handle_chat_message(
    router: &CommandRouter,
    controller: &BotController,
    reaction_chance_percent: u32,
    event: InboundEvent,
) -> DispatchReport {
    let report = router.dispatch(event.context_id, &event.text, &event).await;
    debug!(
        "Message {} in chat {}: {:?}",
        event.message_id, event.context_id, report
    );

    let (roll, reaction_id) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(0..100), rng.gen_range(0..REACTION_COUNT))
    };
    if should_react(roll, reaction_chance_percent) {
        if let Err(e) = controller
            .messenger
            .send_reaction(event.context_id, event.message_id, reaction_id)
            .await
        {
            warn!("Could not react in chat {} cause: {}", event.context_id, e);
        }
    }
    report
}
