mod adapter;
pub mod application;
mod config;
mod error;
pub use adapter::build_router;
pub use adapter::ChatWorkers;
pub use adapter::BotController;
pub use adapter::LongPoll;
pub use adapter::SqliteStore;
pub use adapter::VkClient;
pub use config::Settings;
pub use error::BotError;
