use fingenie::{
    api::{start_server, ApiState},
    assistant::Assistant,
    auth::AuthService,
    config::Settings,
    ledger::Ledger,
    preferences::Preferences,
    storage::{InMemoryStore, JsonFileStore, KeyValueStore},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    if settings.api_key.is_none() {
        warn!("GEMINI_API_KEY not set; chat will be unavailable (see .env.example)");
    }

    info!("FinGenie API Server");
    info!("Port: {}", settings.port);

    // Local storage survives restarts, session storage does not.
    let local: Arc<dyn KeyValueStore> =
        Arc::new(JsonFileStore::new(settings.data_dir.join("local.json")));
    let session: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());

    let state = ApiState {
        assistant: Arc::new(Assistant::initialize(&settings, Ledger::sample())),
        auth: Arc::new(AuthService::new(local.clone(), session)),
        preferences: Arc::new(Preferences::new(local)),
    };

    info!("Assistant initialized");

    start_server(state, settings.port).await?;

    Ok(())
}
