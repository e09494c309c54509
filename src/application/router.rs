use std::collections::HashMap;

use log::{debug, error};

use super::{CommandDefinition, ContextId, InboundEvent};

/// Outcome of routing one message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchReport {
    /// Handlers that were started, successful or not.
    pub invoked: usize,
    /// Handlers that returned an error, panicked, or could not be given
    /// their parameters.
    pub failed: usize,
}

/// Per-chat ordered command definitions.
///
/// Built once at startup and only read afterwards. Every definition whose
/// pattern accepts the text fires, in registration order.
#[derive(Clone, Default)]
pub struct CommandRouter {
    registry: HashMap<ContextId, Vec<CommandDefinition>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, context: ContextId, definition: CommandDefinition) -> &mut Self {
        self.registry.entry(context).or_default().push(definition);
        self
    }

    #[cfg(test)]
    pub fn definitions(&self, context: ContextId) -> &[CommandDefinition] {
        self.registry
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn is_registered(&self, context: ContextId) -> bool {
        self.registry.contains_key(&context)
    }

    /// Runs every handler registered for `context` whose pattern accepts `text`.
    ///
    /// Each invocation runs on its own task and is awaited before the next
    /// one starts, so a failing or panicking handler is reported and the
    /// remaining definitions still run.
    pub async fn dispatch(
        &self,
        context: ContextId,
        text: &str,
        event: &InboundEvent,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(definitions) = self.registry.get(&context) else {
            return report;
        };

        for definition in definitions.iter().filter(|d| d.matches(text)) {
            debug!("Chat {} matched `{}`", context, definition.pattern());
            let params = match definition.parameters(text) {
                Ok(params) => params,
                Err(e) => {
                    error!(
                        "Skipping `{}` in chat {}: {}",
                        definition.pattern(),
                        context,
                        e
                    );
                    report.failed += 1;
                    continue;
                }
            };

            report.invoked += 1;
            let handler = definition.handler();
            let event = event.clone();
            let outcome =
                tokio::spawn(async move { handler.handle(context, params, event).await }).await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        "Handler for `{}` failed in chat {}: {:#}",
                        definition.pattern(),
                        context,
                        e
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    error!(
                        "Handler for `{}` aborted in chat {}: {}",
                        definition.pattern(),
                        context,
                        e
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}
