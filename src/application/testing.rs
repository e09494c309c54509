//! In-memory collaborators for tests.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;

use super::{Activity, ContextId, MessagingClient, Quote, Store, StoryEvent, VideoAttachment};
use crate::error::BotError;

#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Message(ContextId, String),
    Video(ContextId, String, String),
    Activity(ContextId, Activity),
    Reaction(ContextId, i64, u32),
}

#[derive(Default)]
pub struct FakeMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub uploaded: Mutex<Vec<String>>,
    pub fail_sends: bool,
}

impl FakeMessenger {
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(ContextId, String)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Message(peer, text) => Some((peer, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<(), BotError> {
        if self.fail_sends {
            return Err(BotError::Platform {
                code: 9,
                message: "Flood control".to_string(),
            });
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl MessagingClient for FakeMessenger {
    async fn send_message(&self, peer: ContextId, text: &str) -> Result<(), BotError> {
        self.record(Sent::Message(peer, text.to_string()))
    }

    async fn send_video(
        &self,
        peer: ContextId,
        caption: &str,
        video: &VideoAttachment,
    ) -> Result<(), BotError> {
        self.record(Sent::Video(peer, caption.to_string(), video.attachment_ref()))
    }

    async fn set_activity(&self, peer: ContextId, activity: Activity) -> Result<(), BotError> {
        self.record(Sent::Activity(peer, activity))
    }

    async fn send_reaction(
        &self,
        peer: ContextId,
        message_id: i64,
        reaction_id: u32,
    ) -> Result<(), BotError> {
        self.record(Sent::Reaction(peer, message_id, reaction_id))
    }

    async fn upload_video(&self, link: &str) -> Result<VideoAttachment, BotError> {
        self.uploaded.lock().unwrap().push(link.to_string());
        Ok(VideoAttachment {
            owner_id: -1,
            video_id: 456,
            access_key: "key".to_string(),
            upload_url: String::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredQuote {
    pub text: String,
    pub author: String,
    pub submitter_id: i64,
}

#[derive(Default)]
pub struct FakeStore {
    pub quotes: Mutex<Vec<StoredQuote>>,
    /// Newest last.
    pub events: Mutex<Vec<StoryEvent>>,
    pub unavailable: bool,
    /// Delay applied to every chronicle insert.
    pub write_delay: Option<Duration>,
}

impl FakeStore {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn slow_writes(delay: Duration) -> Self {
        Self {
            write_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_quotes(quotes: &[(&str, &str)]) -> Self {
        let store = Self::default();
        *store.quotes.lock().unwrap() = quotes
            .iter()
            .map(|(text, author)| StoredQuote {
                text: text.to_string(),
                author: author.to_string(),
                submitter_id: 0,
            })
            .collect();
        store
    }

    fn check(&self) -> Result<(), BotError> {
        if self.unavailable {
            return Err(BotError::Store(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn quotes_by_author(&self, pattern: &str) -> Result<Vec<Quote>, BotError> {
        self.check()?;
        let quotes = self.quotes.lock().unwrap();
        Ok(quotes
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, quote)| quote.author.contains(pattern))
            .map(|(index, quote)| Quote {
                id: index as i64 + 1,
                text: quote.text.clone(),
                author: quote.author.clone(),
            })
            .collect())
    }

    async fn story_events(&self) -> Result<Vec<StoryEvent>, BotError> {
        self.check()?;
        Ok(self.events.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn insert_quote(
        &self,
        text: &str,
        author: &str,
        submitter_id: i64,
    ) -> Result<(), BotError> {
        self.check()?;
        self.quotes.lock().unwrap().push(StoredQuote {
            text: text.to_string(),
            author: author.to_string(),
            submitter_id,
        });
        Ok(())
    }

    async fn insert_story_event(&self, description: &str) -> Result<(), BotError> {
        self.check()?;
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().unwrap().push(StoryEvent {
            date: "18.10.2026".to_string(),
            event: description.to_string(),
        });
        Ok(())
    }

    async fn random_quote(&self) -> Result<Option<(String, String)>, BotError> {
        self.check()?;
        Ok(self
            .quotes
            .lock()
            .unwrap()
            .first()
            .map(|quote| (quote.text.clone(), quote.author.clone())))
    }
}
