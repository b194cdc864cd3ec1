use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Layout of the on-disk account tree.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_root")]
    pub root: String,
    #[serde(default = "default_record_file")]
    pub record_file: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            record_file: default_record_file(),
            manifest_file: default_manifest_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { credentials_file: default_credentials_file() }
    }
}

/// Session lifetime policy. `ttl_secs = 0` keeps sessions alive until restart.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: default_session_ttl() }
    }
}

/// Argon2id cost parameters used for newly created credential hashes.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_store_root() -> String { "data/mail".into() }
fn default_record_file() -> String { "account.json".into() }
fn default_manifest_file() -> String { "domain.json".into() }
fn default_credentials_file() -> String { "data/mail/admin.json".into() }
fn default_session_ttl() -> u64 { 12 * 60 * 60 }
fn default_memory_kib() -> u32 { 19 * 1024 }
fn default_iterations() -> u32 { 2 }
fn default_parallelism() -> u32 { 1 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Load `config.toml` when present, otherwise build from environment variables.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    /// Only a missing file falls back to the environment; a file that exists must parse.
    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = match load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => Self::from_env(),
            Err(e) => return Err(e.context(format!("invalid config file {path}"))),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`,
    /// `STORE_ROOT`, `ADMIN_CREDENTIALS_FILE` and `SESSION_TTL_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("SERVER_PORT") {
            cfg.server.port = port;
        }
        if let Some(w) = env_parse::<usize>("TOKIO_WORKER_THREADS") {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(root) = std::env::var("STORE_ROOT") {
            cfg.store.root = root;
        }
        if let Ok(path) = std::env::var("ADMIN_CREDENTIALS_FILE") {
            cfg.admin.credentials_file = path;
        }
        if let Some(ttl) = env_parse::<u64>("SESSION_TTL_SECS") {
            cfg.session.ttl_secs = ttl;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        if self.admin.credentials_file.trim().is_empty() {
            return Err(anyhow!("admin.credentials_file must not be empty"));
        }
        self.hashing.validate()?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            return Err(anyhow!("store.root must not be empty"));
        }
        for (key, name) in [("store.record_file", &self.record_file), ("store.manifest_file", &self.manifest_file)] {
            if name.trim().is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
                return Err(anyhow!("{key} must be a plain file name, got {name:?}"));
            }
        }
        if self.record_file == self.manifest_file {
            return Err(anyhow!("store.record_file and store.manifest_file must differ"));
        }
        Ok(())
    }
}

impl HashingConfig {
    fn validate(&self) -> Result<()> {
        if self.memory_kib == 0 || self.iterations == 0 || self.parallelism == 0 {
            return Err(anyhow!("hashing parameters must be positive"));
        }
        Ok(())
    }
}
