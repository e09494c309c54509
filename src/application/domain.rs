use core::fmt;

use serde::{Deserialize, Serialize};

/// Peer identifier of a chat or group conversation.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContextId(pub i64);

impl fmt::Display for ContextId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An incoming chat message as delivered by the long poll.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InboundEvent {
    pub text: String,
    pub context_id: ContextId,
    /// Per-conversation message id, used for reactions.
    pub message_id: i64,
    pub submitter_id: i64,
    /// Text of the message this one replies to, if any.
    pub reply_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub author: String,
}

impl fmt::Display for Quote {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}. {} © {}", self.id, self.text, self.author)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoryEvent {
    /// Day of the event, already formatted as `dd.mm.YYYY`.
    pub date: String,
    pub event: String,
}

impl fmt::Display for StoryEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{} - {}", self.date, self.event)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Activity {
    Typing,
    AudioMessage,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Typing => "typing",
            Activity::AudioMessage => "audiomessage",
        }
    }
}

/// A video saved on the platform, ready to be attached to a message.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VideoAttachment {
    pub owner_id: i64,
    pub video_id: i64,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub upload_url: String,
}

impl VideoAttachment {
    pub fn attachment_ref(&self) -> String {
        format!(
            "video{}_{}_{}",
            self.owner_id, self.video_id, self.access_key
        )
    }
}
