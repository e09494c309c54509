mod command;
mod domain;
pub mod jobs;
mod ports;
mod router;
#[cfg(test)]
pub(crate) mod testing;
pub mod tools;
pub use command::CommandDefinition;
pub use command::CommandHandler;
pub use command::ExtractedParameters;
pub use domain::Activity;
pub use domain::ContextId;
pub use domain::InboundEvent;
pub use domain::Quote;
pub use domain::StoryEvent;
pub use domain::VideoAttachment;
pub use ports::MessagingClient;
pub use ports::Store;
pub use router::CommandRouter;
pub use router::DispatchReport;
