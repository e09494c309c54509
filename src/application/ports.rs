use async_trait::async_trait;

use super::{Activity, ContextId, Quote, StoryEvent, VideoAttachment};
use crate::error::BotError;

/// Outbound side of the messaging platform.
///
/// Implementations must be usable from several tasks at once: the router's
/// handlers and the background jobs share one client.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn send_message(&self, peer: ContextId, text: &str) -> Result<(), BotError>;

    async fn send_video(
        &self,
        peer: ContextId,
        caption: &str,
        video: &VideoAttachment,
    ) -> Result<(), BotError>;

    async fn set_activity(&self, peer: ContextId, activity: Activity) -> Result<(), BotError>;

    async fn send_reaction(
        &self,
        peer: ContextId,
        message_id: i64,
        reaction_id: u32,
    ) -> Result<(), BotError>;

    /// Saves an external video link to the platform and returns its handle.
    async fn upload_video(&self, link: &str) -> Result<VideoAttachment, BotError>;
}

/// Persistence for quotes and the chat chronicle.
#[async_trait]
pub trait Store: Send + Sync {
    /// Quotes whose author contains `pattern`, newest first.
    async fn quotes_by_author(&self, pattern: &str) -> Result<Vec<Quote>, BotError>;

    /// All chronicle entries, newest first.
    async fn story_events(&self) -> Result<Vec<StoryEvent>, BotError>;

    async fn insert_quote(
        &self,
        text: &str,
        author: &str,
        submitter_id: i64,
    ) -> Result<(), BotError>;

    async fn insert_story_event(&self, description: &str) -> Result<(), BotError>;

    /// A uniformly random `(text, author)` pair, `None` when there are no quotes.
    async fn random_quote(&self) -> Result<Option<(String, String)>, BotError>;
}
