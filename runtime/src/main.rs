use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use dotenvy::dotenv;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use certificate_runtime::{
    AppState,
    ai::{GeminiClient, TextGenerator},
    config::{AppConfig, config_path},
    pipeline::{CertificatePipeline, DocumentManager},
    routes,
    storage::{CertificateStore, JsonKvStorage, JsonKvStorageConfig, StorageManager},
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %format!("{err:#}"), "Service crashed");
        eprintln!("Service crashed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_tracing();
    if let Err(err) = dotenv() {
        warn!(error = %err, "No .env file loaded");
    }

    let mut config = AppConfig::load(&config_path())
        .await
        .context("Failed to load application configuration")?;
    config.apply_env_overrides(|name| env::var(name).ok());
    config.validate().context("Invalid configuration")?;

    let workspace = env::var("WORKSPACE")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let certificates_kv = Arc::new(JsonKvStorage::new(JsonKvStorageConfig {
        working_dir: config.working_dir.clone(),
        namespace: "certificates".into(),
        workspace,
    }));

    let mut storage_manager = StorageManager::new();
    storage_manager.register_kv(certificates_kv.clone());
    storage_manager.initialize_all().await?;
    info!(status = ?storage_manager.status(), "Certificate store ready");

    let documents =
        DocumentManager::new(&config.uploads.dir, &config.uploads.allowed_extensions).await?;

    let api_key = config
        .api_key()
        .context("GOOGLE_API_KEY is not set")?
        .to_string();
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        api_key,
        Some(config.llm.base_url.clone()),
        Some(config.llm.model.clone()),
        Duration::from_secs(config.llm.request_timeout_secs),
    )?);

    let pipeline = Arc::new(CertificatePipeline::new(&config.ocr, generator));

    let addr_string = format!("{}:{}", config.server.host, config.server.port);
    let addr = addr_string
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid server address: {addr_string}"))?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.llm.model,
        tesseract = %config.ocr.tesseract_path.display(),
        "Loaded configuration"
    );

    let max_upload_bytes = config.uploads.max_bytes;
    let state = Arc::new(AppState {
        pipeline,
        documents,
        certificates: CertificateStore::new(certificates_kv),
    });

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::certificate_routes(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;
    info!(%addr, "Certificate service listening");

    let server_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(err) = storage_manager.finalize_all().await {
        warn!(error = %err, "Failed to finalize storages");
    }

    server_result.context("Server encountered a fatal error")?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[inline]
async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                if stream.recv().await.is_some() {
                    info!("Received SIGTERM");
                }
            }
            Err(err) => warn!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received termination signal (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received termination signal (SIGTERM)");
        }
    }
}
