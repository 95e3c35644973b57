// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use online_exam::config::Config;
use online_exam::routes;
use online_exam::state::AppState;
use online_exam::store::{MongoStore, Store, seed_sample_data};
use online_exam::templates;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment; aborts without MONGO_URI
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set; sessions are signed with the insecure default key");
    }

    let store = MongoStore::connect(&config)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize MongoDB store: {}", e));
    tracing::info!("Database connected...");
    let store: Arc<dyn Store> = Arc::new(store);

    if config.seed_sample_data {
        if let Err(e) = seed_sample_data(store.as_ref()).await {
            tracing::error!("Sample data init skipped: {:?}", e);
        }
    }

    let templates = templates::environment().expect("Failed to load page templates");

    // Create AppState
    let state = AppState {
        store,
        config: config.clone(),
        templates: Arc::new(templates),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", config.server_addr, e));
    tracing::info!("Listening on {}", config.server_addr);

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
