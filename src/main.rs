//! Book Assistant server entry point.

use mimalloc::MiMalloc;

/// Global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use book_assistant::AppState;
use book_assistant::auth::AuthStore;
use book_assistant::chat::{AnswerClient, ChatWidget};
use book_assistant::config::AppConfig;
use book_assistant::server::start_server;
use book_assistant::storage::{FileStorage, NullStorage, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let storage: Arc<dyn StorageBackend> = if config.storage.enabled {
        Arc::new(FileStorage::new(config.storage.data_dir.clone()))
    } else {
        info!(name: "storage.disabled", "running without durable storage");
        Arc::new(NullStorage)
    };

    let auth = AuthStore::open(storage).await;
    info!(
        name: "auth.store.loaded",
        users = auth.user_count().await,
        "session store ready"
    );

    let chat = ChatWidget::new(AnswerClient::new(config.chat.answering_url.clone()));

    let state = AppState {
        auth,
        chat,
        config: Arc::clone(&config),
    };

    start_server(config, state).await
}
