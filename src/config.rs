use std::{env, str::FromStr, time::Duration};

use crate::{application::ContextId, error::BotError};

const DEFAULT_DB_PATH: &str = "chronicler.db";
const DEFAULT_API_URL: &str = "https://api.vk.com/method";
const DEFAULT_API_VERSION: &str = "5.199";
const DEFAULT_QUOTE_INTERVAL_SECS: u64 = 3 * 60 * 60;
const DEFAULT_ACTIVITY_INTERVAL_SECS: u64 = 30;
const DEFAULT_VIDEO_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_REACTION_CHANCE_PERCENT: u32 = 10;

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub token: String,
    pub user_token: Option<String>,
    pub group_id: i64,
    pub chat_id: ContextId,
    pub control_chat_id: ContextId,
    pub db_path: String,
    pub api_url: String,
    pub api_version: String,
    pub quote_interval: Duration,
    pub activity_interval: Duration,
    pub video_interval: Duration,
    pub reaction_chance_percent: u32,
    pub video_caption: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = lookup("TOKEN").ok_or_else(|| missing("TOKEN"))?;
        let group_id = required(&lookup, "GROUP_ID")?;
        let chat_id = ContextId(required(&lookup, "CHAT_ID")?);
        let control_chat_id = ContextId(required(&lookup, "CONTROL_CHAT_ID")?);

        Ok(Self {
            token,
            user_token: lookup("USER_TOKEN"),
            group_id,
            chat_id,
            control_chat_id,
            db_path: lookup("DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            api_url: lookup("VK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_version: lookup("VK_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            quote_interval: Duration::from_secs(optional(
                &lookup,
                "QUOTE_INTERVAL_SECS",
                DEFAULT_QUOTE_INTERVAL_SECS,
            )?),
            activity_interval: Duration::from_secs(optional(
                &lookup,
                "ACTIVITY_INTERVAL_SECS",
                DEFAULT_ACTIVITY_INTERVAL_SECS,
            )?),
            video_interval: Duration::from_secs(optional(
                &lookup,
                "VIDEO_INTERVAL_SECS",
                DEFAULT_VIDEO_INTERVAL_SECS,
            )?),
            reaction_chance_percent: optional(
                &lookup,
                "REACTION_CHANCE_PERCENT",
                DEFAULT_REACTION_CHANCE_PERCENT,
            )?
            .min(100),
            video_caption: lookup("VIDEO_CAPTION").unwrap_or_default(),
        })
    }
}

fn missing(key: &str) -> BotError {
    BotError::Config(format!("{key} is not set"))
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, BotError> {
    raw.trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{key} has an invalid value: {raw}")))
}

fn required<T, F>(lookup: &F, key: &str) -> Result<T, BotError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).ok_or_else(|| missing(key))?;
    parse(key, &raw)
}

fn optional<T, F>(lookup: &F, key: &str, default: T) -> Result<T, BotError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}
