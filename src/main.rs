use std::sync::Arc;

use chronicler::{
    application::{jobs, tools::RandomVideo, MessagingClient, Store},
    build_router, BotController, ChatWorkers, LongPoll, Settings, SqliteStore, VkClient,
};
use log::{info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&settings.db_path).await?);
    let vk = VkClient::new(&settings);
    let messenger: Arc<dyn MessagingClient> = Arc::new(vk.clone());
    let controller = Arc::new(BotController::new(
        Arc::clone(&messenger),
        Arc::clone(&store),
        settings.chat_id,
    ));
    let router = Arc::new(build_router(&controller, settings.control_chat_id)?);

    let token = CancellationToken::new();
    let mut background = JoinSet::new();
    let chat = settings.chat_id;

    {
        let messenger = Arc::clone(&messenger);
        let store = Arc::clone(&store);
        background.spawn(jobs::run_periodic(
            "quote broadcast",
            settings.quote_interval,
            token.clone(),
            move || {
                let messenger = Arc::clone(&messenger);
                let store = Arc::clone(&store);
                async move {
                    jobs::broadcast_random_quote(messenger.as_ref(), store.as_ref(), chat)
                        .await
                        .map(|_| ())
                }
            },
        ));
    }

    {
        let messenger = Arc::clone(&messenger);
        background.spawn(jobs::run_periodic(
            "activity",
            settings.activity_interval,
            token.clone(),
            move || {
                let messenger = Arc::clone(&messenger);
                async move { jobs::simulate_activity(messenger.as_ref(), chat).await }
            },
        ));
    }

    if settings.user_token.is_some() {
        let messenger = Arc::clone(&messenger);
        let source = RandomVideo::new();
        let caption = settings.video_caption.clone();
        background.spawn(jobs::run_periodic(
            "video repost",
            settings.video_interval,
            token.clone(),
            move || {
                let messenger = Arc::clone(&messenger);
                let source = source.clone();
                let caption = caption.clone();
                async move {
                    let link = source.pick().await?;
                    jobs::repost_video(messenger.as_ref(), chat, &caption, &link).await
                }
            },
        ));
    } else {
        info!("USER_TOKEN not set, video repost disabled");
    }

    {
        let token = token.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for shutdown signal cause: {}", e);
                return;
            }
            info!("Shutting down...");
            token.cancel();
        });
    }

    let mut workers = ChatWorkers::new(router, controller, settings.reaction_chance_percent);
    let mut events = LongPoll::new(vk, settings.group_id).start(token.clone());
    while let Some(event) = events.recv().await {
        workers.deliver(event);
    }

    token.cancel();
    workers.shutdown().await;
    while background.join_next().await.is_some() {}
    info!("Bye");
    Ok(())
}
