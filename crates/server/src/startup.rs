use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, auth::ServerState};
use service::{
    auth::{
        domain::AdminRecord,
        password::CredentialHasher,
        repo::FileAdminRepository,
        repository::AdminRepository,
        AuthService, SessionManager,
    },
    runtime, AccountStore, DirectoryStore, StoreLayout,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Write an administrator record from `ADMIN_USERNAME`/`ADMIN_PASSWORD` when none exists yet.
async fn bootstrap_admin(repo: &FileAdminRepository, hasher: &CredentialHasher) -> anyhow::Result<()> {
    if repo.load().await?.is_some() {
        return Ok(());
    }
    match (std::env::var("ADMIN_USERNAME"), std::env::var("ADMIN_PASSWORD")) {
        (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
            repo.save(&AdminRecord::new(&username, &password, hasher)?).await?;
            info!(username = %username, event = "admin_bootstrapped", "administrator created from environment");
        }
        _ => warn!("no administrator configured; admin login is disabled until the credentials file exists"),
    }
    Ok(())
}

/// Open the store and auth components described by `cfg`.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let root = Path::new(&cfg.store.root);
    runtime::ensure_store_root(root).await?;

    let h = &cfg.hashing;
    let hasher = CredentialHasher::new(h.memory_kib, h.iterations, h.parallelism).context("invalid hashing parameters")?;
    let layout = StoreLayout { record_file: cfg.store.record_file.clone(), manifest_file: cfg.store.manifest_file.clone() };
    let accounts: Arc<dyn AccountStore> = DirectoryStore::open(root, layout, hasher.clone()).await?;

    let admin_repo = FileAdminRepository::new(&cfg.admin.credentials_file);
    bootstrap_admin(&admin_repo, &hasher).await?;
    let repo: Arc<dyn AdminRepository> = Arc::new(admin_repo);

    let ttl = (cfg.session.ttl_secs > 0).then(|| Duration::from_secs(cfg.session.ttl_secs));
    let auth = Arc::new(AuthService::new(repo, SessionManager::new(ttl), hasher));
    Ok(ServerState { accounts, auth })
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    info!(%addr, root = %cfg.store.root, "starting admin server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
