//! Configuration file and environment overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tasklist_store::RestConfig;

const CONFIG_DIR: &str = "tasklist";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_NAMESPACE: &str = "tasks";
const DEFAULT_TABLE: &str = "todos";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding `remote.url`.
pub const ENV_REMOTE_URL: &str = "TASKLIST_REMOTE_URL";
/// Environment variable overriding `remote.api_key`.
pub const ENV_REMOTE_KEY: &str = "TASKLIST_REMOTE_KEY";
/// Environment variable overriding `remote.table`.
pub const ENV_REMOTE_TABLE: &str = "TASKLIST_REMOTE_TABLE";

/// Top-level configuration loaded from `<config_dir>/tasklist/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Remote table settings; absent means local-only.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl AppConfig {
    /// Load configuration from `explicit` (which must exist) or the default
    /// location (which may be missing), then apply environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or the result is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut fetch = |key: &'static str| env::var(key).ok();
        Self::load_with_env(explicit, &mut fetch)
    }

    fn load_with_env(
        explicit: Option<&Path>,
        fetch: &mut impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_with(fetch);
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Parse a configuration file without environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_env_with(&mut self, fetch: &mut impl FnMut(&'static str) -> Option<String>) {
        let mut value = |key| fetch(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = value(ENV_REMOTE_URL) {
            self.remote.get_or_insert_with(RemoteConfig::default).url = url;
        }
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        if let Some(key) = value(ENV_REMOTE_KEY) {
            remote.api_key = key;
        }
        if let Some(table) = value(ENV_REMOTE_TABLE) {
            remote.table = table;
        }
    }

    fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        Ok(())
    }

    /// Drop the remote section (offline mode).
    #[must_use]
    pub fn without_remote(mut self) -> Self {
        self.remote = None;
        self
    }

    /// Settings for the REST adapter, when a remote is configured.
    #[must_use]
    pub fn rest_config(&self) -> Option<RestConfig> {
        self.remote.as_ref().map(|remote| RestConfig {
            base_url: remote.url.clone(),
            api_key: remote.api_key.clone(),
            table: remote.table.clone(),
            timeout_secs: remote.timeout_secs,
        })
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding the cache file (defaults to the user data dir).
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Cache entry name.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            namespace: default_namespace(),
        }
    }
}

impl CacheConfig {
    /// Resolved cache directory.
    #[must_use]
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(env::temp_dir)
                .join(CONFIG_DIR)
        })
    }

    fn validate(&self) -> Result<()> {
        let namespace = self.namespace.trim();
        if namespace.is_empty() {
            bail!("cache namespace must not be empty");
        }
        if !namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || namespace.starts_with('.')
        {
            bail!("cache namespace '{namespace}' may only contain letters, digits, '-', '_' and '.'");
        }
        Ok(())
    }
}

/// `[remote]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base URL.
    #[serde(default)]
    pub url: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("remote url must not be empty (set remote.url or {ENV_REMOTE_URL})");
        }
        if self.api_key.trim().is_empty() {
            bail!("remote api_key must not be empty (set remote.api_key or {ENV_REMOTE_KEY})");
        }
        if self.table.trim().is_empty() {
            bail!("remote table must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("remote timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_owned()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &Path, body: &str) -> Result<PathBuf> {
        let path = dir.join(CONFIG_FILE);
        let mut file = fs::File::create(&path)?;
        writeln!(file, "{body}")?;
        Ok(path)
    }

    fn no_env(_: &'static str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_are_local_only() -> Result<()> {
        let config = AppConfig::default();
        assert!(config.remote.is_none());
        assert_eq!(config.cache.namespace, "tasks");
        assert!(config.rest_config().is_none());
        config.validate()
    }

    #[test]
    fn load_config_with_remote_section() -> Result<()> {
        let dir = tempdir()?;
        let path = write_config(
            dir.path(),
            "[cache]\ndir = \"/tmp/tasklist-cache\"\nnamespace = \"work\"\n\n[remote]\nurl = \"https://example.test\"\napi_key = \"secret\"",
        )?;

        let config = AppConfig::load_with_env(Some(&path), &mut no_env)?;
        assert_eq!(config.cache.resolved_dir(), PathBuf::from("/tmp/tasklist-cache"));
        assert_eq!(config.cache.namespace, "work");
        let rest = config
            .rest_config()
            .unwrap_or_else(|| panic!("remote section must be present"));
        assert_eq!(rest.base_url, "https://example.test");
        assert_eq!(rest.table, "todos");
        assert_eq!(rest.timeout_secs, 10);
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let Err(err) = AppConfig::load_with_env(Some(Path::new("/nonexistent/tasklist.toml")), &mut no_env)
        else {
            panic!("missing explicit config should error");
        };
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn remote_without_key_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = write_config(dir.path(), "[remote]\nurl = \"https://example.test\"")?;

        let Err(err) = AppConfig::load_with_env(Some(&path), &mut no_env) else {
            panic!("remote without api key should error");
        };
        assert!(err.to_string().contains("api_key must not be empty"));
        Ok(())
    }

    #[test]
    fn unsafe_namespace_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = write_config(dir.path(), "[cache]\nnamespace = \"../escape\"")?;

        let Err(err) = AppConfig::load_with_env(Some(&path), &mut no_env) else {
            panic!("path-like namespace should error");
        };
        assert!(err.to_string().contains("may only contain"));
        Ok(())
    }

    #[test]
    fn environment_creates_and_overrides_remote() -> Result<()> {
        let dir = tempdir()?;
        let path = write_config(dir.path(), "[cache]\nnamespace = \"tasks\"")?;
        let mut fetch = |key: &'static str| match key {
            ENV_REMOTE_URL => Some("https://env.test".into()),
            ENV_REMOTE_KEY => Some("env-key".into()),
            ENV_REMOTE_TABLE => Some("  ".into()),
            _ => None,
        };

        let config = AppConfig::load_with_env(Some(&path), &mut fetch)?;
        let remote = config
            .remote
            .clone()
            .unwrap_or_else(|| panic!("environment must create remote section"));
        assert_eq!(remote.url, "https://env.test");
        assert_eq!(remote.api_key, "env-key");
        assert_eq!(remote.table, "todos", "blank overrides are ignored");

        assert!(config.without_remote().remote.is_none());
        Ok(())
    }

    #[test]
    fn key_override_without_url_keeps_local_only() -> Result<()> {
        let mut fetch = |key: &'static str| (key == ENV_REMOTE_KEY).then(|| "orphan".to_owned());
        let mut config = AppConfig::default();
        config.apply_env_with(&mut fetch);
        assert!(config.remote.is_none());
        config.validate()
    }
}
