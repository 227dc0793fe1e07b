use anyhow::{Context, Result};
use content_translate::config::Config;
use content_translate::db::PgStore;
use content_translate::oracle::{OpenAiOracle, TranslationOracle};
use content_translate::schema::ContentConfig;
use content_translate::server::{self, AppState};
use content_translate::service::TranslationService;
use content_translate::store::{ContentStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translate=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let content = ContentConfig::load(&config.content_config_path)?;
    info!(
        "Loaded {} translatable collection(s) from {}",
        content.collections.len(),
        config.content_config_path
    );

    let store: Arc<dyn ContentStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set, documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let oracle: Option<Arc<dyn TranslationOracle>> = match &config.openai_api_key {
        Some(key) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .context("Failed to build HTTP client")?;
            let oracle =
                OpenAiOracle::new(client, key, &config.openai_api_url, &config.openai_model)
                    .with_temperature(config.openai_temperature);
            Some(Arc::new(oracle))
        }
        None => {
            warn!("No translation API key configured, translate requests will fail");
            None
        }
    };

    let service = TranslationService::new(Arc::new(content), store, oracle);
    let state = Arc::new(AppState {
        service,
        api_key: config.api_key.clone(),
    });

    if config.translate_disabled {
        info!("Translation endpoints disabled");
    }
    let app = server::router(state, !config.translate_disabled);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
