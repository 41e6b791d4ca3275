use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, auth};
use service::application::repo::seaorm::SeaOrmApplicationRepository;
use service::application::ApplicationService;
use service::storage::LocalBlobStore;

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load configuration; fall back to defaults plus env vars when no
/// config.toml is present.
fn load_config() -> configs::AppConfig {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config missing or invalid, falling back to defaults + env");
            let mut cfg = configs::AppConfig::default();
            cfg.database.normalize_from_env();
            cfg.auth.normalize_from_env();
            cfg
        }
    }
}

/// Host/port from configs, overridable via env vars.
fn load_bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| cfg.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(cfg.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config();

    // DB connection (pool options from config when a URL is configured)
    let db = if cfg.database.url.trim().is_empty() {
        models::db::connect().await?
    } else {
        models::db::connect_with_config(&cfg.database).await?
    };

    // Blob storage for attachments
    let blobs = LocalBlobStore::new(
        cfg.storage.upload_dir.clone(),
        cfg.storage.public_base_url.clone(),
        cfg.storage.max_upload_bytes,
    )
    .await?;

    // Application service over the SeaORM repository
    let repo = Arc::new(SeaOrmApplicationRepository { db: db.clone() });
    let applications = Arc::new(ApplicationService::new(repo, blobs));

    // JWT secret
    let jwt_secret = if cfg.auth.jwt_secret.trim().is_empty() {
        env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string())
    } else {
        cfg.auth.jwt_secret.clone()
    };
    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret, token_ttl_hours: cfg.auth.token_ttl_hours },
        applications,
    };

    // Build router
    let app: Router = routes::build_router(state, build_cors(), &cfg.storage.upload_dir);

    // Bind and serve
    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting careerboard server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
