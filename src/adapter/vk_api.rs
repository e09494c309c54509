use async_trait::async_trait;
use log::debug;
use rand::Rng;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    application::{Activity, ContextId, MessagingClient, VideoAttachment},
    config::Settings,
    error::BotError,
};

/// `{"response": ...}` or `{"error": {...}}` as returned by every API method.
#[derive(Debug, Deserialize)]
pub struct VkEnvelope<T> {
    pub response: Option<T>,
    pub error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
pub struct VkApiError {
    pub error_code: i64,
    pub error_msg: String,
}

impl<T> VkEnvelope<T> {
    pub fn into_result(self) -> Result<T, BotError> {
        if let Some(error) = self.error {
            return Err(BotError::Platform {
                code: error.error_code,
                message: error.error_msg,
            });
        }
        self.response.ok_or_else(|| BotError::Platform {
            code: 0,
            message: "empty response".to_string(),
        })
    }
}

/// Connection data for the Bots Long Poll API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    pub ts: String,
}

/// VK HTTP API client acting for the community, and optionally for a user.
#[derive(Clone)]
pub struct VkClient {
    pub client: Client,
    api_url: String,
    api_version: String,
    token: String,
    user_token: Option<String>,
}

impl VkClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            token: settings.token.clone(),
            user_token: settings.user_token.clone(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> Result<T, BotError> {
        debug!("Calling {}", method);
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", token.to_string()));
        form.push(("v", self.api_version.clone()));
        let envelope: VkEnvelope<T> = self
            .client
            .post(format!("{}/{}", self.api_url, method))
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        envelope.into_result()
    }

    async fn call_as_group<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, BotError> {
        self.call(method, &self.token, params).await
    }

    pub async fn long_poll_server(&self, group_id: i64) -> Result<LongPollServer, BotError> {
        self.call_as_group(
            "groups.getLongPollServer",
            &[("group_id", group_id.to_string())],
        )
        .await
    }

    async fn send(
        &self,
        peer: ContextId,
        text: &str,
        attachment: Option<String>,
    ) -> Result<(), BotError> {
        let random_id: i32 = rand::thread_rng().gen();
        let mut params = vec![
            ("peer_id", peer.to_string()),
            ("message", text.to_string()),
            ("random_id", random_id.to_string()),
        ];
        if let Some(attachment) = attachment {
            params.push(("attachment", attachment));
        }
        let _message_id: serde_json::Value = self.call_as_group("messages.send", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl MessagingClient for VkClient {
    async fn send_message(&self, peer: ContextId, text: &str) -> Result<(), BotError> {
        self.send(peer, text, None).await
    }

    async fn send_video(
        &self,
        peer: ContextId,
        caption: &str,
        video: &VideoAttachment,
    ) -> Result<(), BotError> {
        self.send(peer, caption, Some(video.attachment_ref())).await
    }

    async fn set_activity(&self, peer: ContextId, activity: Activity) -> Result<(), BotError> {
        let _: i64 = self
            .call_as_group(
                "messages.setActivity",
                &[
                    ("peer_id", peer.to_string()),
                    ("type", activity.as_str().to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn send_reaction(
        &self,
        peer: ContextId,
        message_id: i64,
        reaction_id: u32,
    ) -> Result<(), BotError> {
        let _: i64 = self
            .call_as_group(
                "messages.sendReaction",
                &[
                    ("peer_id", peer.to_string()),
                    ("cmid", message_id.to_string()),
                    ("reaction_id", reaction_id.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Saves an external link as a video of the user, then completes the
    /// save by visiting the returned upload URL.
    async fn upload_video(&self, link: &str) -> Result<VideoAttachment, BotError> {
        let user_token = self.user_token.as_deref().ok_or_else(|| {
            BotError::Config("USER_TOKEN is required to save videos".to_string())
        })?;
        let video: VideoAttachment = self
            .call("video.save", user_token, &[("link", link.to_string())])
            .await?;
        self.client
            .get(&video.upload_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(video)
    }
}
