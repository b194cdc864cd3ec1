//! Directory-backed account store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<domain>/                        domain exists
//! <root>/<domain>/<manifest-file>         optional domain metadata
//! <root>/<domain>/<username>/             user exists
//! <root>/<domain>/<username>/<record-file>
//! ```
//!
//! Operations on one domain are linearized by a per-domain async mutex. The map of those
//! mutexes is the only store-wide lock and is never held across filesystem I/O.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::{fs, sync::{Mutex, RwLock}};
use tracing::{debug, info, instrument, warn};

use crate::accounts::model::{DomainManifest, UserRecord};
use crate::accounts::validation::{normalize_alias, parse_address, validate_address, validate_domain};
use crate::accounts::{Domain, Recipient, User};
use crate::admin::account_store::AccountStore;
use crate::auth::password::CredentialHasher;
use crate::errors::AccountError;
use crate::file::credential_cache::{CredentialCache, Stamp};
use crate::storage::json_file::{self, JsonFileError};

/// File names used inside domain and user directories.
#[derive(Clone, Debug)]
pub struct StoreLayout {
    pub record_file: String,
    pub manifest_file: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self { record_file: "account.json".into(), manifest_file: "domain.json".into() }
    }
}

pub struct DirectoryStore {
    root: PathBuf,
    layout: StoreLayout,
    hasher: CredentialHasher,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    cache: CredentialCache,
    #[cfg(test)]
    removal_faults: Mutex<Vec<PathBuf>>,
}

impl DirectoryStore {
    /// Open a store rooted at `root`. Fails when the root cannot be listed.
    pub async fn open<P: Into<PathBuf>>(root: P, layout: StoreLayout, hasher: CredentialHasher) -> Result<Arc<Self>, AccountError> {
        let root = root.into();
        let store = Self {
            root,
            layout,
            hasher,
            locks: RwLock::default(),
            cache: CredentialCache::default(),
            #[cfg(test)]
            removal_faults: Mutex::default(),
        };
        let domains = store.scan_dirs(&store.root, "list store root").await?;
        info!(root = %store.root.display(), domains = domains.len(), "account store opened");
        Ok(Arc::new(store))
    }

    pub fn root(&self) -> &Path { &self.root }

    fn domain_dir(&self, domain: &str) -> PathBuf { self.root.join(domain) }

    fn user_dir(&self, domain: &str, username: &str) -> PathBuf { self.root.join(domain).join(username) }

    fn record_path(&self, domain: &str, username: &str) -> PathBuf {
        self.user_dir(domain, username).join(&self.layout.record_file)
    }

    fn manifest_path(&self, domain: &str) -> PathBuf { self.domain_dir(domain).join(&self.layout.manifest_file) }

    async fn domain_lock(&self, domain: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(domain) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(domain.to_string()).or_default())
    }

    /// Run `op` under the domain's lock. Once the domain is gone from disk its lock entry is
    /// dropped, unless another task is already queued on it.
    async fn with_domain_lock<T>(
        &self,
        domain: &str,
        op: impl Future<Output = Result<T, AccountError>> + Send,
    ) -> Result<T, AccountError> {
        let lock = self.domain_lock(domain).await;
        let guard = lock.lock().await;
        let res = op.await;
        if !Self::is_dir(&self.domain_dir(domain)).await.unwrap_or(true) {
            let mut locks = self.locks.write().await;
            // one reference in the map, one held here
            if Arc::strong_count(&lock) == 2 {
                locks.remove(domain);
            }
        }
        drop(guard);
        res
    }

    /// Sorted names of the visible subdirectories of `dir`. Files and `.`-prefixed entries are skipped.
    async fn scan_dirs(&self, dir: &Path, context: &str) -> Result<Vec<String>, AccountError> {
        let io_err = |e| AccountError::io(format!("{context} ({})", dir.display()), e);
        let mut rd = fs::read_dir(dir).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(io_err)? {
            let Ok(name) = entry.file_name().into_string() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().await.map_err(io_err)?.is_dir() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn is_dir(path: &Path) -> Result<bool, AccountError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AccountError::io(format!("stat {}", path.display()), e)),
        }
    }

    async fn ensure_domain(&self, domain: &str) -> Result<(), AccountError> {
        if Self::is_dir(&self.domain_dir(domain)).await? {
            Ok(())
        } else {
            Err(AccountError::not_found("domain", domain))
        }
    }

    async fn remove_tree(&self, dir: &Path) -> std::io::Result<()> {
        #[cfg(test)]
        if self.removal_faults.lock().await.iter().any(|p| p == dir) {
            return Err(std::io::Error::other("removal refused"));
        }
        fs::remove_dir_all(dir).await
    }

    async fn read_record(path: &Path) -> Result<Option<UserRecord>, AccountError> {
        match json_file::read_json::<UserRecord>(path).await {
            Ok(rec) => Ok(Some(rec)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(JsonFileError::Parse(e)) => Err(AccountError::corrupt(path, e.to_string())),
            Err(JsonFileError::Io(e)) => Err(AccountError::io(format!("read {}", path.display()), e)),
        }
    }

    async fn write_record(&self, domain: &str, record: &UserRecord) -> Result<(), AccountError> {
        let path = self.record_path(domain, &record.username);
        let res = json_file::write_json_atomic(&path, record).await;
        self.cache.invalidate(domain, &record.username).await;
        res.map_err(|e| match e {
            JsonFileError::Io(e) => AccountError::io(format!("write {}", path.display()), e),
            JsonFileError::Parse(e) => AccountError::corrupt(&path, e.to_string()),
        })
    }

    /// The record of an existing user directory. A missing record, or one naming a different
    /// user, is corrupt.
    async fn load_user_record(&self, domain: &str, username: &str) -> Result<UserRecord, AccountError> {
        let path = self.record_path(domain, username);
        let record = Self::read_record(&path)
            .await?
            .ok_or_else(|| AccountError::corrupt(&path, format!("record file missing for user {username}")))?;
        if record.username != username {
            return Err(AccountError::corrupt(&path, format!("record names {:?}, directory is {username:?}", record.username)));
        }
        Ok(record)
    }

    /// Every record of a domain. The first corrupt user aborts the listing.
    async fn load_domain_records(&self, domain: &str) -> Result<Vec<UserRecord>, AccountError> {
        let mut records = Vec::new();
        for username in self.scan_dirs(&self.domain_dir(domain), "list users").await? {
            records.push(self.load_user_record(domain, &username).await?);
        }
        Ok(records)
    }

    /// Records used for uniqueness and routing. Corrupt users are logged and skipped so one
    /// broken directory does not block the rest of the domain.
    async fn peer_records(&self, domain: &str) -> Result<Vec<UserRecord>, AccountError> {
        let mut records = Vec::new();
        for username in self.scan_dirs(&self.domain_dir(domain), "list users").await? {
            match self.load_user_record(domain, &username).await {
                Ok(record) => records.push(record),
                Err(AccountError::CorruptRecord { path, reason }) => {
                    warn!(domain = %domain, user = %username, path = %path.display(), reason = %reason, "skipping corrupt user record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Look up one record through the cache, re-validating it against the file's stamp.
    async fn load_record_cached(&self, domain: &str, username: &str) -> Result<Option<UserRecord>, AccountError> {
        let path = self.record_path(domain, username);
        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.cache.invalidate(domain, username).await;
                return Ok(None);
            }
            Err(e) => return Err(AccountError::io(format!("stat {}", path.display()), e)),
        };
        let stamp = Stamp::of(&meta);
        if let Some(stamp) = stamp {
            if let Some(hit) = self.cache.get(domain, username, stamp).await {
                return Ok(Some(hit));
            }
        }
        let record = Self::read_record(&path).await?;
        if let (Some(stamp), Some(rec)) = (stamp, &record) {
            self.cache.insert(domain, username, stamp, rec.clone()).await;
        }
        Ok(record)
    }

    /// Fails `AlreadyExists` when `address` is already some user's address or alias.
    fn ensure_address_free(records: &[UserRecord], domain: &str, address: &str) -> Result<(), AccountError> {
        let taken = records.iter().any(|r| {
            format!("{}@{domain}", r.username).eq_ignore_ascii_case(address)
                || r.aliases.iter().any(|a| a.eq_ignore_ascii_case(address))
        });
        if taken {
            Err(AccountError::already_exists("address", address))
        } else {
            Ok(())
        }
    }

    async fn delete_user_locked(&self, domain: &str, username: &str) -> Result<(), AccountError> {
        let dir = self.user_dir(domain, username);
        if !Self::is_dir(&dir).await? {
            return Err(AccountError::not_found("user", &format!("{username}@{domain}")));
        }
        let res = self.remove_tree(&dir).await;
        self.cache.invalidate(domain, username).await;
        res.map_err(|e| AccountError::io(format!("delete user {username}@{domain}"), e))
    }

    async fn create_domain_locked(&self, name: &str) -> Result<Domain, AccountError> {
        let dir = self.domain_dir(name);
        create_private_dir(&dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => AccountError::already_exists("domain", name),
            _ => AccountError::io(format!("create domain {name}"), e),
        })?;

        let manifest = DomainManifest { name: name.to_string(), created_at: Utc::now() };
        if let Err(e) = json_file::write_json_atomic(&self.manifest_path(name), &manifest).await {
            warn!(domain = %name, error = %e, "manifest write failed; rolling back domain directory");
            let _ = self.remove_tree(&dir).await;
            return Err(match e {
                JsonFileError::Io(e) => AccountError::io(format!("write manifest for {name}"), e),
                JsonFileError::Parse(e) => AccountError::corrupt(&self.manifest_path(name), e.to_string()),
            });
        }

        info!(domain = %name, event = "domain_created", "domain created");
        Ok(Domain { name: manifest.name, created_at: Some(manifest.created_at) })
    }

    async fn delete_domain_locked(&self, name: &str) -> Result<(), AccountError> {
        self.ensure_domain(name).await?;
        for username in self.scan_dirs(&self.domain_dir(name), "list users").await? {
            match self.delete_user_locked(name, &username).await {
                Ok(()) => debug!(domain = %name, user = %username, "cascade deleted user"),
                Err(AccountError::NotFound(_)) => {}
                Err(AccountError::StoreIo { context, source }) => {
                    warn!(domain = %name, user = %username, error = %source, "domain delete stopped at user");
                    return Err(AccountError::io(format!("delete domain {name}: {context}"), source));
                }
                Err(other) => return Err(other),
            }
        }

        let res = self.remove_tree(&self.domain_dir(name)).await;
        self.cache.invalidate_domain(name).await;
        res.map_err(|e| AccountError::io(format!("delete domain {name}"), e))?;
        info!(domain = %name, event = "domain_deleted", "domain deleted");
        Ok(())
    }

    async fn domain_users_locked(&self, domain: &str) -> Result<Vec<User>, AccountError> {
        self.ensure_domain(domain).await?;
        let records = self.load_domain_records(domain).await?;
        Ok(records.iter().map(UserRecord::to_user).collect())
    }

    async fn create_user_locked(&self, domain: &str, username: &str, credential_hash: String) -> Result<User, AccountError> {
        self.ensure_domain(domain).await?;
        let address = format!("{username}@{domain}");
        let peers = self.peer_records(domain).await?;
        Self::ensure_address_free(&peers, domain, &address)?;

        let dir = self.user_dir(domain, username);
        create_private_dir(&dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => AccountError::already_exists("user", &address),
            _ => AccountError::io(format!("create user {address}"), e),
        })?;

        let record = UserRecord { username: username.to_string(), credential_hash, aliases: Vec::new() };
        if let Err(e) = self.write_record(domain, &record).await {
            // A directory without a record is an inconsistent user; never leave one behind.
            warn!(domain = %domain, user = %username, error = %e, "record write failed; rolling back user directory");
            let _ = self.remove_tree(&dir).await;
            return Err(e);
        }

        info!(domain = %domain, user = %username, event = "user_created", "user created");
        Ok(record.to_user())
    }

    async fn delete_user_checked(&self, domain: &str, username: &str) -> Result<(), AccountError> {
        self.ensure_domain(domain).await?;
        self.delete_user_locked(domain, username).await?;
        info!(domain = %domain, user = %username, event = "user_deleted", "user deleted");
        Ok(())
    }

    async fn add_alias_locked(&self, domain: &str, username: &str, alias: String) -> Result<User, AccountError> {
        self.ensure_domain(domain).await?;
        if !Self::is_dir(&self.user_dir(domain, username)).await? {
            return Err(AccountError::not_found("user", &format!("{username}@{domain}")));
        }
        let mut record = self.load_user_record(domain, username).await?;
        let peers = self.peer_records(domain).await?;
        Self::ensure_address_free(&peers, domain, &alias)?;

        record.aliases.push(alias);
        self.write_record(domain, &record).await?;
        info!(domain = %domain, user = %username, event = "alias_added", "alias added");
        Ok(record.to_user())
    }

    async fn remove_alias_locked(&self, domain: &str, username: &str, alias: String) -> Result<User, AccountError> {
        self.ensure_domain(domain).await?;
        let path = self.record_path(domain, username);
        let mut record = Self::read_record(&path)
            .await?
            .ok_or_else(|| AccountError::not_found("user", &format!("{username}@{domain}")))?;
        let before = record.aliases.len();
        record.aliases.retain(|a| !a.eq_ignore_ascii_case(&alias));
        if record.aliases.len() == before {
            return Err(AccountError::not_found("alias", &alias));
        }
        self.write_record(domain, &record).await?;
        info!(domain = %domain, user = %username, event = "alias_removed", "alias removed");
        Ok(record.to_user())
    }

    /// Case-insensitive match on a username or alias, the same rule address uniqueness uses.
    async fn find_recipient_locked(&self, local: &str, domain: &str) -> Result<Option<Recipient>, AccountError> {
        if !Self::is_dir(&self.domain_dir(domain)).await? {
            return Ok(None);
        }
        let wanted = format!("{local}@{domain}");
        let peers = self.peer_records(domain).await?;
        Ok(peers
            .into_iter()
            .find(|r| r.username.eq_ignore_ascii_case(local) || r.aliases.iter().any(|a| a.eq_ignore_ascii_case(&wanted)))
            .map(|r| Recipient { domain: domain.to_string(), username: r.username }))
    }
}

async fn create_private_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).await
}

#[async_trait]
impl AccountStore for DirectoryStore {
    async fn list_domains(&self) -> Result<Vec<String>, AccountError> {
        let domains = self.scan_dirs(&self.root, "list store root").await?;
        debug!(count = domains.len(), "listed domains");
        Ok(domains)
    }

    async fn resolve_domain(&self, name: &str) -> Result<Domain, AccountError> {
        validate_domain(name)?;
        self.ensure_domain(name).await?;
        let path = self.manifest_path(name);
        let created_at = match json_file::read_json::<DomainManifest>(&path).await {
            Ok(manifest) => Some(manifest.created_at),
            Err(e) if e.is_not_found() => None,
            Err(JsonFileError::Parse(e)) => return Err(AccountError::corrupt(&path, e.to_string())),
            Err(JsonFileError::Io(e)) => return Err(AccountError::io(format!("read {}", path.display()), e)),
        };
        Ok(Domain { name: name.to_string(), created_at })
    }

    #[instrument(skip(self))]
    async fn create_domain(&self, name: &str) -> Result<Domain, AccountError> {
        validate_domain(name)?;
        self.with_domain_lock(name, self.create_domain_locked(name)).await
    }

    #[instrument(skip(self))]
    async fn delete_domain(&self, name: &str) -> Result<(), AccountError> {
        validate_domain(name)?;
        self.with_domain_lock(name, self.delete_domain_locked(name)).await
    }

    async fn domain_users(&self, domain: &str) -> Result<Vec<User>, AccountError> {
        validate_domain(domain)?;
        self.with_domain_lock(domain, self.domain_users_locked(domain)).await
    }

    #[instrument(skip(self, password))]
    async fn create_user(&self, domain: &str, username: &str, password: &str) -> Result<User, AccountError> {
        validate_address(username, domain)?;
        // Cheap pre-checks so a doomed request skips the hashing work.
        self.ensure_domain(domain).await?;
        if Self::is_dir(&self.user_dir(domain, username)).await? {
            return Err(AccountError::already_exists("user", &format!("{username}@{domain}")));
        }
        let credential_hash = self
            .hasher
            .hash_off_thread(password.to_string())
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        self.with_domain_lock(domain, self.create_user_locked(domain, username, credential_hash)).await
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, domain: &str, username: &str) -> Result<(), AccountError> {
        validate_address(username, domain)?;
        self.with_domain_lock(domain, self.delete_user_checked(domain, username)).await
    }

    #[instrument(skip(self))]
    async fn add_alias(&self, domain: &str, username: &str, alias: &str) -> Result<User, AccountError> {
        validate_address(username, domain)?;
        let alias = normalize_alias(alias, domain)?;
        self.with_domain_lock(domain, self.add_alias_locked(domain, username, alias)).await
    }

    #[instrument(skip(self))]
    async fn remove_alias(&self, domain: &str, username: &str, alias: &str) -> Result<User, AccountError> {
        validate_address(username, domain)?;
        let alias = normalize_alias(alias, domain)?;
        self.with_domain_lock(domain, self.remove_alias_locked(domain, username, alias)).await
    }

    async fn verify_credentials(&self, domain: &str, username: &str, password: &str) -> Result<bool, AccountError> {
        if validate_address(username, domain).is_err() {
            return Ok(false);
        }
        let Some(record) = self.load_record_cached(domain, username).await? else {
            return Ok(false);
        };
        Ok(self.hasher.verify_off_thread(record.credential_hash, password.to_string()).await)
    }

    async fn resolve_recipient(&self, address: &str) -> Result<Option<Recipient>, AccountError> {
        let Ok((local, domain)) = parse_address(address) else {
            return Ok(None);
        };
        if !Self::is_dir(&self.domain_dir(domain)).await? {
            return Ok(None);
        }
        if self.load_record_cached(domain, local).await?.is_some() {
            return Ok(Some(Recipient { domain: domain.to_string(), username: local.to_string() }));
        }
        self.with_domain_lock(domain, self.find_recipient_locked(local, domain)).await
    }
}
