use std::net::SocketAddr;

use configs::{AppConfig, HashingConfig};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use server::startup::build_app;
use service::auth::{domain::AdminRecord, password::CredentialHasher, repo::FileAdminRepository};

struct TestServer {
    base_url: String,
    _tmp: TempDir,
}

async fn start_server() -> anyhow::Result<TestServer> {
    let tmp = tempfile::tempdir()?;
    let mut cfg = AppConfig::default();
    cfg.store.root = tmp.path().join("mail").to_string_lossy().into_owned();
    cfg.admin.credentials_file = tmp.path().join("admin.json").to_string_lossy().into_owned();
    cfg.hashing = HashingConfig { memory_kib: 8, iterations: 1, parallelism: 1 };

    let record = AdminRecord::new("admin", "hunter2", &CredentialHasher::insecure_fast())?;
    FileAdminRepository::new(&cfg.admin.credentials_file).save(&record).await?;

    let app = build_app(&cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestServer { base_url: format!("http://{}", addr), _tmp: tmp })
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_login_and_manage_accounts() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", srv.base_url))
        .json(&json!({"username": "admin", "password": "hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let res = client.get(format!("{}/domain", srv.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/domain", srv.base_url))
        .header("API-Token", &token)
        .json(&json!({"name": "example.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let res = client
        .post(format!("{}/domain/example.com/user", srv.base_url))
        .header("API-Token", &token)
        .json(&json!({"username": "alice", "password": "s3cret!"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let users: Value = client
        .get(format!("{}/domain/example.com/user", srv.base_url))
        .header("API-Token", &token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(users, json!([{"username": "alice", "aliases": []}]));

    let res = client
        .delete(format!("{}/domain/example.com", srv.base_url))
        .header("API-Token", &token)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}
