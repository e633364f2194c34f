//! Configuration for `mailport`.
//!
//! Sources are layered, later ones winning:
//! 1. built-in defaults ([`Config::default`]),
//! 2. `config.toml` in the per-user configuration directory, when present,
//! 3. an explicit file (TOML, YAML or JSON, chosen by extension),
//! 4. `MAILPORT_*` environment variables, with `__` separating nested keys
//!    (`MAILPORT_RETRY__MAX_ATTEMPTS=5`).
//!
//! Command-line flags are applied on top by the binary.

mod dirs;
pub mod error;

pub use crate::dirs::Dirs;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use mailport_executor::RetryPolicy;
use mailport_ledger::KeyStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "MAILPORT_";
const LEDGER_FILENAME: &str = "ledger.sqlite";
const DEFAULT_KEY_FILENAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of remote operations in flight.
    pub concurrency: usize,
    pub retry: RetryConfig,
    /// Directory names skipped wherever they appear in the spool.
    pub ignore_dirs: Vec<String>,
    /// Regular expressions matched anywhere in a file name.
    pub ignore_files: Vec<String>,
    /// Items larger than this many bytes are skipped. `None` disables the check.
    pub max_item_size: Option<u64>,
    /// Folder component to label overrides, matched case-insensitively.
    pub labels: BTreeMap<String, String>,
    pub dedup_key: KeyStrategy,
    /// Where the ledger lives. Defaults to the per-user data directory.
    pub state_dir: Option<PathBuf>,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 20,
            retry: RetryConfig::default(),
            ignore_dirs: ["servers", "templates", "users", "Trash", "Junk", "Drafts"]
                .map(String::from)
                .to_vec(),
            ignore_files: ["cyrus.index", "cyrus.cache", "cyrus.header", "cyrus.squat"]
                .map(String::from)
                .to_vec(),
            max_item_size: Some(35 * 1024 * 1024),
            labels: BTreeMap::from([
                ("Sent".to_string(), "SENT".to_string()),
                (".".to_string(), "INBOX".to_string()),
            ]),
            dedup_key: KeyStrategy::default(),
            state_dir: None,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_wait_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Add up to one second of random delay to every backoff.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: 30,
            max_attempts: 10,
            base_delay_ms: 1000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_base(Duration::from_millis(self.base_delay_ms))
            .with_max_wait(Duration::from_secs(self.max_wait_secs))
            .with_max_attempts(self.max_attempts)
            .with_jitter(if self.jitter { Duration::from_secs(1) } else { Duration::ZERO })
    }
}

/// How an access token is obtained.
///
/// A static token wins over a command. With neither configured the binary
/// refuses to start.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shell command printing an access token on stdout.
    pub token_command: Option<String>,
    pub access_token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_command", &self.token_command)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Layers defaults, the per-user file, `explicit` and the environment.
    pub fn load_from(dirs: &Dirs, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let user_file = dirs.config_file();
        if user_file.is_file() {
            debug!(path = %user_file.display(), "loading user configuration");
            figment = figment.merge(Toml::file(user_file));
        }

        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::Missing(path.to_path_buf()));
            }
            debug!(path = %path.display(), "loading configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "concurrency",
                reason: "must be at least 1"
            });
        }
        if self.retry.max_attempts == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "retry.max_attempts",
                reason: "must be at least 1"
            });
        }
        if self.retry.base_delay_ms == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "retry.base_delay_ms",
                reason: "must be at least 1"
            });
        }
        Ok(())
    }

    /// Path of the ledger database.
    pub fn ledger_path(&self, dirs: &Dirs) -> PathBuf {
        self.state_dir.as_deref().unwrap_or(dirs.data_dir()).join(LEDGER_FILENAME)
    }

    /// Credential key used when none is given on the command line.
    pub fn default_key_path(dirs: &Dirs) -> PathBuf {
        dirs.home_dir().join(DEFAULT_KEY_FILENAME)
    }
}
