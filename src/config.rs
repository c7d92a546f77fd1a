use std::path::PathBuf;
use std::time::Duration;

use crate::error::BridgeError;

const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_APP_DIR: &str = "/app";
const DEFAULT_RAILS_BIN: &str = "bin/rails";
const DEFAULT_RAILS_ENV: &str = "production";

/// Default upper bound for `journalctl_tail` line counts.
pub const DEFAULT_JOURNAL_MAX_LINES: u32 = 500;

/// Default per-stream capture bound (16 MiB).
pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 16 * 1024 * 1024;

/// How the remote process authenticates us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshAuth {
    Key {
        path: PathBuf,
        passphrase: Option<String>,
    },
    Password(String),
}

/// SSH connection settings.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key_path: Option<PathBuf>,
    pub key_passphrase: Option<String>,
    pub password: Option<String>,
    /// Skip host key verification. Accepted for controlled deployments only.
    pub trust_host: bool,
    pub known_hosts: Option<PathBuf>,
    pub connect_timeout: Duration,
    pub max_capture_bytes: usize,
}

impl SshConfig {
    /// Key auth wins over password auth; neither is a configuration error.
    pub fn auth(&self) -> Result<SshAuth, BridgeError> {
        if let Some(path) = &self.key_path {
            return Ok(SshAuth::Key {
                path: path.clone(),
                passphrase: self.key_passphrase.clone(),
            });
        }
        if let Some(password) = &self.password {
            return Ok(SshAuth::Password(password.clone()));
        }
        Err(BridgeError::Configuration(
            "neither SSH_KEY_PATH nor SSH_PASSWORD is set".to_string(),
        ))
    }
}

/// Remote Rails application settings.
#[derive(Debug, Clone)]
pub struct RailsConfig {
    pub app_dir: String,
    pub rails_bin: String,
    /// Empty when no `RAILS_ENV=` assignment should be emitted.
    pub rails_env: Option<String>,
    pub login_shell: bool,
}

impl Default for RailsConfig {
    fn default() -> Self {
        Self {
            app_dir: DEFAULT_APP_DIR.to_string(),
            rails_bin: DEFAULT_RAILS_BIN.to_string(),
            rails_env: Some(DEFAULT_RAILS_ENV.to_string()),
            login_shell: false,
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub ssh: SshConfig,
    pub rails: RailsConfig,
    /// Optional adapter names, lowercased and trimmed, in listed order.
    pub adapters: Vec<String>,
    pub journal_max_lines: u32,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// - `SSH_HOST`, `SSH_USER` (required)
    /// - `SSH_PORT` (optional, default 22)
    /// - `SSH_KEY_PATH`, `SSH_KEY_PASSPHRASE`, `SSH_PASSWORD` (auth, checked per call)
    /// - `SSH_TRUST_HOST` (default true), `SSH_KNOWN_HOSTS`, `SSH_CONNECT_TIMEOUT_SECS`
    /// - `RAILS_APP_DIR`, `RAILS_BIN`, `RAILS_ENV`, `RAILS_LOGIN_SHELL`
    /// - `MCP_ADAPTERS`, `JOURNALCTL_MAX_LINES`, `MCP_MAX_CAPTURE_BYTES`
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("SSH_HOST").ok_or_else(|| {
            BridgeError::Configuration("SSH_HOST environment variable is not set".to_string())
        })?;
        let user = get("SSH_USER").ok_or_else(|| {
            BridgeError::Configuration("SSH_USER environment variable is not set".to_string())
        })?;

        let port = match get("SSH_PORT") {
            Some(val) => val.parse::<u16>().map_err(|_| {
                BridgeError::Configuration("SSH_PORT must be a valid port number".to_string())
            })?,
            None => DEFAULT_SSH_PORT,
        };

        let connect_timeout_secs = match get("SSH_CONNECT_TIMEOUT_SECS") {
            Some(val) => val.parse::<u64>().ok().filter(|n| *n > 0).ok_or_else(|| {
                BridgeError::Configuration(
                    "SSH_CONNECT_TIMEOUT_SECS must be a positive integer".to_string(),
                )
            })?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        let known_hosts = get("SSH_KNOWN_HOSTS").map(PathBuf::from).or_else(|| {
            get("HOME").map(|home| PathBuf::from(home).join(".ssh").join("known_hosts"))
        });

        let ssh = SshConfig {
            host,
            port,
            user,
            key_path: get("SSH_KEY_PATH").map(PathBuf::from),
            key_passphrase: get("SSH_KEY_PASSPHRASE"),
            password: get("SSH_PASSWORD"),
            trust_host: get("SSH_TRUST_HOST").map_or(true, |v| parse_flag(&v)),
            known_hosts,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            max_capture_bytes: get("MCP_MAX_CAPTURE_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CAPTURE_BYTES),
        };

        // RAILS_ENV set to an empty string disables the assignment entirely.
        let rails_env = match lookup("RAILS_ENV") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_RAILS_ENV.to_string()),
        };

        let rails = RailsConfig {
            app_dir: get("RAILS_APP_DIR").unwrap_or_else(|| DEFAULT_APP_DIR.to_string()),
            rails_bin: get("RAILS_BIN").unwrap_or_else(|| DEFAULT_RAILS_BIN.to_string()),
            rails_env,
            login_shell: get("RAILS_LOGIN_SHELL").map_or(false, |v| parse_flag(&v)),
        };

        Ok(Self {
            ssh,
            rails,
            adapters: get("MCP_ADAPTERS")
                .map(|v| parse_adapter_list(&v))
                .unwrap_or_default(),
            journal_max_lines: get("JOURNALCTL_MAX_LINES")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(DEFAULT_JOURNAL_MAX_LINES),
        })
    }
}

/// Split a comma-separated adapter list: trimmed, lowercased, empties dropped.
pub fn parse_adapter_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
