mod chat_workers;
mod database_repository;
mod endpoints;
mod long_poll;
mod vk_api;
pub use chat_workers::ChatWorkers;
pub use database_repository::SqliteStore;
pub use endpoints::build_router;
pub use endpoints::BotController;
pub use long_poll::LongPoll;
pub use vk_api::VkClient;
