use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use regex::Regex;

use super::{ContextId, InboundEvent};
use crate::error::BotError;

/// Named values captured from a command's text.
pub type ExtractedParameters = HashMap<String, String>;

/// Side effect bound to a command definition.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        context: ContextId,
        params: ExtractedParameters,
        event: InboundEvent,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(ContextId, ExtractedParameters, InboundEvent) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(
        &self,
        context: ContextId,
        params: ExtractedParameters,
        event: InboundEvent,
    ) -> anyhow::Result<()> {
        (self)(context, params, event).await
    }
}

/// How to recognize one command and how to parse its arguments.
///
/// The match pattern decides whether the definition applies at all. The
/// optional extract pattern is only consulted afterwards and must accept
/// every text the match pattern accepts.
#[derive(Clone)]
pub struct CommandDefinition {
    match_pattern: Regex,
    extract_pattern: Option<Regex>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    pub fn new<H>(match_pattern: &str, handler: H) -> Result<Self, BotError>
    where
        H: CommandHandler + 'static,
    {
        Ok(Self {
            match_pattern: Regex::new(match_pattern)?,
            extract_pattern: None,
            handler: Arc::new(handler),
        })
    }

    pub fn with_extract(mut self, extract_pattern: &str) -> Result<Self, BotError> {
        self.extract_pattern = Some(Regex::new(extract_pattern)?);
        Ok(self)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.match_pattern.is_match(text)
    }

    pub fn has_extract(&self) -> bool {
        self.extract_pattern.is_some()
    }

    pub fn pattern(&self) -> &str {
        self.match_pattern.as_str()
    }

    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }

    /// Collects the named groups of the extract pattern.
    ///
    /// Unnamed groups are ignored, as are named groups that did not take
    /// part in the match.
    pub fn extract(&self, text: &str) -> Result<ExtractedParameters, BotError> {
        let extract_pattern = self.extract_pattern.as_ref().ok_or_else(|| {
            BotError::MalformedInput(format!(
                "no extract pattern configured for `{}`",
                self.match_pattern
            ))
        })?;
        let captures = extract_pattern.captures(text).ok_or_else(|| {
            BotError::MalformedInput(format!(
                "`{}` accepted {:?} but `{}` did not",
                self.match_pattern, text, extract_pattern
            ))
        })?;

        Ok(extract_pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|value| (name.to_string(), value.as_str().to_string()))
            })
            .collect())
    }

    /// Parameters for a handler invocation: empty without an extract pattern.
    pub fn parameters(&self, text: &str) -> Result<ExtractedParameters, BotError> {
        if self.has_extract() {
            self.extract(text)
        } else {
            Ok(ExtractedParameters::new())
        }
    }
}
