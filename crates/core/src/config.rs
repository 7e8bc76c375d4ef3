//! Console configuration.
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! `REGDESK_*` environment variables. Command-line flags are applied last by
//! the binary.
//!
//! ```toml
//! base_url = "https://api.sjtechsol.com/api/cashier"
//! http_timeout_secs = 30
//! session_ttl_hours = 12
//! session_file = "/home/me/.local/share/regdesk/session.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

/// Base URL of the production cashier API.
pub const DEFAULT_BASE_URL: &str = "https://api.sjtechsol.com/api/cashier";

/// Default lifetime of a stored session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

const CONFIG_FILE_NAME: &str = "config.toml";
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("invalid {key} in {path}: {value}")]
    InvalidFile {
        path: PathBuf,
        key: &'static str,
        value: String,
    },
    #[error("no home directory to keep the session file in; set REGDESK_SESSION_FILE")]
    NoSessionDir,
}

/// Effective console configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Cashier API base, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. `None` waits for as long as the service takes.
    pub http_timeout: Option<Duration>,
    /// How long a login stays valid.
    pub session_ttl: Duration,
    /// Where sessions are persisted. `None` means the per-user data directory.
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: None,
            session_ttl: DEFAULT_SESSION_TTL,
            session_file: None,
        }
    }
}

/// On-disk shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    http_timeout_secs: Option<u64>,
    session_ttl_hours: Option<u64>,
    session_file: Option<PathBuf>,
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With `path = None` the per-user config file is used if it exists. An
    /// explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    config.merge_file(&path)?;
                }
            }
        }

        config.merge_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");

        if let Some(url) = file.base_url {
            self.base_url = url;
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout = timeout_from_secs(secs);
        }
        if let Some(hours) = file.session_ttl_hours {
            self.session_ttl = ttl_from_hours(hours).ok_or_else(|| ConfigError::InvalidFile {
                path: path.to_path_buf(),
                key: "session_ttl_hours",
                value: hours.to_string(),
            })?;
        }
        if let Some(session_file) = file.session_file {
            self.session_file = Some(session_file);
        }
        Ok(())
    }

    /// Apply `REGDESK_*` overrides read through `lookup`.
    fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("REGDESK_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("REGDESK_HTTP_TIMEOUT_SECS") {
            self.http_timeout = timeout_from_secs(parse_env("REGDESK_HTTP_TIMEOUT_SECS", &secs)?);
        }
        if let Some(raw) = lookup("REGDESK_SESSION_TTL_HOURS") {
            let hours = parse_env("REGDESK_SESSION_TTL_HOURS", &raw)?;
            self.session_ttl = ttl_from_hours(hours).ok_or(ConfigError::InvalidEnv {
                key: "REGDESK_SESSION_TTL_HOURS",
                value: raw,
            })?;
        }
        if let Some(path) = lookup("REGDESK_SESSION_FILE").filter(|v| !v.trim().is_empty()) {
            self.session_file = Some(PathBuf::from(path.trim()));
        }
        Ok(())
    }

    /// Resolve the session file location.
    pub fn session_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(SESSION_FILE_NAME))
            .ok_or(ConfigError::NoSessionDir)
    }
}

/// Location of the per-user config file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "sjtechsol", "regdesk")
}

/// Zero disables the timeout.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// A session must last at least an hour, and the TTL has to fit in seconds.
fn ttl_from_hours(hours: u64) -> Option<Duration> {
    if hours == 0 {
        return None;
    }
    hours.checked_mul(60 * 60).map(Duration::from_secs)
}

fn parse_env(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.http_timeout, None);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"http://localhost:8080/api/cashier\"\nhttp_timeout_secs = 15\nsession_ttl_hours = 2"
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api/cashier");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session_ttl, Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn test_config_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_uri = \"typo\"").unwrap();
        let result = Config::default().merge_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here/config.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .merge_env(env(&[
                ("REGDESK_BASE_URL", " http://127.0.0.1:9000/api/cashier "),
                ("REGDESK_HTTP_TIMEOUT_SECS", "0"),
                ("REGDESK_SESSION_TTL_HOURS", "1"),
                ("REGDESK_SESSION_FILE", "/tmp/regdesk-session.json"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9000/api/cashier");
        assert_eq!(config.http_timeout, None);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(
            config.session_path().unwrap(),
            PathBuf::from("/tmp/regdesk-session.json")
        );
    }

    #[test]
    fn test_env_rejects_garbage_numbers() {
        let result = Config::default().merge_env(env(&[("REGDESK_HTTP_TIMEOUT_SECS", "soon")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv {
                key: "REGDESK_HTTP_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_session_ttl_overflow_is_rejected() {
        let huge = u64::MAX.to_string();
        let result = Config::default().merge_env(env(&[("REGDESK_SESSION_TTL_HOURS", &huge)]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv {
                key: "REGDESK_SESSION_TTL_HOURS",
                ..
            })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "session_ttl_hours = {}", u64::MAX / 60).unwrap();
        let result = Config::default().merge_file(file.path());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFile {
                key: "session_ttl_hours",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_session_ttl_is_rejected() {
        let result = Config::default().merge_env(env(&[("REGDESK_SESSION_TTL_HOURS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "session_ttl_hours = 0").unwrap();
        let result = Config::default().merge_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidFile { .. })));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = Config::default();
        config
            .merge_env(env(&[("REGDESK_BASE_URL", "  ")]))
            .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
