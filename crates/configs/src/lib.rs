use anyhow::{anyhow, Result};
use serde::Deserialize;
use percent_encoding::percent_decode_str;
use url::Url;

/// Environment variable carrying a full connection URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Connection settings for the configuration database.
///
/// Defaults target a local PostgreSQL with the stock credentials and the
/// `concierge` database. A `DATABASE_URL` overrides host, port, credentials
/// and database name, and always turns SSL on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_host() -> String { "localhost".into() }
fn default_port() -> u16 { 5432 }
fn default_user() -> String { "postgres".into() }
fn default_password() -> String { "postgres".into() }
fn default_database() -> String { "concierge".into() }
fn default_max_connections() -> u32 { 20 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            ssl: false,
            max_connections: default_max_connections(),
            min_connections: 0,
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Roots used to derive storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathsConfig {
    /// Directory module keys are joined onto.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,
    /// Platform root; the global key when running as local.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    #[serde(default)]
    pub run_as_local: bool,
}

fn default_modules_dir() -> String { "modules".into() }
fn default_root_dir() -> String { ".".into() }

impl Default for PathsConfig {
    fn default() -> Self {
        Self { modules_dir: default_modules_dir(), root_dir: default_root_dir(), run_as_local: false }
    }
}

/// Load from `CONFIG_PATH` (or `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<StoreConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if std::path::Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        Ok(StoreConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<StoreConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: StoreConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Load `.env` from the working directory if present. Variables already set win.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

impl StoreConfig {
    pub fn load_and_validate() -> Result<Self> {
        load_env_file();
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.database.normalize_from_env()?;
        self.database.validate()?;
        self.paths.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Defaults overridden by the given connection URL.
    pub fn from_url(raw: &str) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_url(raw)?;
        Ok(cfg)
    }

    /// Overlay host, port, credentials and database name from a URL and force SSL.
    pub fn apply_url(&mut self, raw: &str) -> Result<()> {
        let url = Url::parse(raw.trim()).map_err(|e| anyhow!("invalid {DATABASE_URL_ENV}: {e}"))?;
        let scheme = url.scheme().to_ascii_lowercase();
        if scheme != "postgres" && scheme != "postgresql" {
            return Err(anyhow!("{DATABASE_URL_ENV} must start with postgres:// or postgresql://"));
        }
        let host = url.host_str().ok_or_else(|| anyhow!("{DATABASE_URL_ENV} has no host"))?;
        self.host = host.to_string();
        self.port = url.port().unwrap_or_else(default_port);
        if !url.username().is_empty() {
            self.user = decode_component(url.username());
        }
        if let Some(password) = url.password() {
            self.password = decode_component(password);
        }
        if let Some(db) = url.path_segments().and_then(|mut s| s.next()).filter(|s| !s.is_empty()) {
            self.database = decode_component(db);
        }
        self.ssl = true;
        Ok(())
    }

    /// Apply `DATABASE_URL` when it is set and non-empty.
    pub fn normalize_from_env(&mut self) -> Result<()> {
        let raw = std::env::var(DATABASE_URL_ENV).ok();
        self.normalize_with_url(raw.as_deref())
    }

    pub fn normalize_with_url(&mut self, raw: Option<&str>) -> Result<()> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => self.apply_url(url),
            None => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("database.host must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(anyhow!("database.database must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }

    /// Connection URL for the driver, with credentials percent-encoded.
    pub fn connection_url(&self) -> Result<String> {
        let mut url = Url::parse("postgres://localhost")?;
        url.set_host(Some(&self.host)).map_err(|e| anyhow!("invalid database.host: {e}"))?;
        url.set_port(Some(self.port)).map_err(|_| anyhow!("cannot set database.port"))?;
        url.set_username(&self.user).map_err(|_| anyhow!("cannot set database.user"))?;
        url.set_password(Some(&self.password)).map_err(|_| anyhow!("cannot set database.password"))?;
        url.set_path(&format!("/{}", self.database));
        if self.ssl {
            url.query_pairs_mut().append_pair("sslmode", "require");
        }
        Ok(url.to_string())
    }
}

impl PathsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.modules_dir.trim().is_empty() {
            return Err(anyhow!("paths.modules_dir must not be empty"));
        }
        if self.run_as_local && self.root_dir.trim().is_empty() {
            return Err(anyhow!("paths.root_dir must not be empty when run_as_local is set"));
        }
        Ok(())
    }
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
