//! Uploader configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/streamvod/uploader.toml`
//! - Windows: `%APPDATA%/streamvod/uploader.toml`
//!
//! Values are layered: file, then `STREAMVOD_*` environment variables, then
//! command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use streamvod_transfer::{DEFAULT_PART_SIZE, MAX_PART_SIZE, MIN_PART_SIZE};
use streamvod_upload::UploadOptions;

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Base URL of the StreamVOD API.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Bearer token for the API. Empty means unauthenticated.
    #[serde(default)]
    pub auth_token: String,

    /// Bytes per part.
    #[serde(default = "default_part_size")]
    pub part_size_bytes: u64,

    /// Parts uploaded at the same time.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Check plain-MD5 ETags against the bytes sent.
    #[serde(default)]
    pub verify_etag: bool,

    /// TCP connect timeout for backend and storage requests.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".into()
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_concurrency() -> usize {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            auth_token: String::new(),
            part_size_bytes: default_part_size(),
            max_concurrency: default_concurrency(),
            verify_etag: false,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl UploaderConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parses the TOML file at `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: UploaderConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Applies `STREAMVOD_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STREAMVOD_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(token) = lookup("STREAMVOD_TOKEN") {
            self.auth_token = token;
        }
        if let Some(size) = lookup("STREAMVOD_PART_SIZE") {
            self.part_size_bytes = size
                .parse()
                .with_context(|| format!("STREAMVOD_PART_SIZE is not a byte count: {size}"))?;
        }
        if let Some(n) = lookup("STREAMVOD_CONCURRENCY") {
            self.max_concurrency = n
                .parse()
                .with_context(|| format!("STREAMVOD_CONCURRENCY is not a number: {n}"))?;
        }
        if let Some(flag) = lookup("STREAMVOD_VERIFY_ETAG") {
            self.verify_etag = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Checks values before any request is made.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.trim().is_empty() {
            bail!("backend_url is not set");
        }
        if !(MIN_PART_SIZE..=MAX_PART_SIZE).contains(&self.part_size_bytes) {
            bail!(
                "part size {} is outside {MIN_PART_SIZE}..={MAX_PART_SIZE} bytes",
                self.part_size_bytes
            );
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        Ok(())
    }

    /// Bearer token, if one is configured.
    pub fn token(&self) -> Option<String> {
        let token = self.auth_token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            part_size: self.part_size_bytes,
            max_concurrency: self.max_concurrency,
            verify_etag: self.verify_etag,
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("streamvod").join("uploader.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("streamvod")
            .join("uploader.toml")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = UploaderConfig::default();
        assert_eq!(config.part_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_concurrency, 5);
        assert!(config.token().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: UploaderConfig =
            toml::from_str(r#"backend_url = "https://api.streamvod.test""#).unwrap();
        assert_eq!(config.backend_url, "https://api.streamvod.test");
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = UploaderConfig {
            auth_token: "abc123".into(),
            verify_etag: true,
            ..UploaderConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: UploaderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("uploader.toml");
        std::fs::write(&path, "max_concurrency = 8\nverify_etag = true\n").unwrap();

        let config = UploaderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_concurrency, 8);
        assert!(config.verify_etag);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.toml");
        assert!(UploaderConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = UploaderConfig::default();
        config
            .apply_env_from(env(&[
                ("STREAMVOD_BACKEND_URL", "https://env.test"),
                ("STREAMVOD_TOKEN", "tok"),
                ("STREAMVOD_CONCURRENCY", "3"),
                ("STREAMVOD_VERIFY_ETAG", "true"),
            ]))
            .unwrap();

        assert_eq!(config.backend_url, "https://env.test");
        assert_eq!(config.token().as_deref(), Some("tok"));
        assert_eq!(config.max_concurrency, 3);
        assert!(config.verify_etag);
    }

    #[test]
    fn bad_env_number_is_error() {
        let mut config = UploaderConfig::default();
        let err = config
            .apply_env_from(env(&[("STREAMVOD_PART_SIZE", "ten megs")]))
            .unwrap_err();
        assert!(err.to_string().contains("STREAMVOD_PART_SIZE"));
    }

    #[test]
    fn part_size_bounds() {
        let small = UploaderConfig {
            part_size_bytes: MIN_PART_SIZE - 1,
            ..UploaderConfig::default()
        };
        assert!(small.validate().is_err());

        let large = UploaderConfig {
            part_size_bytes: MAX_PART_SIZE + 1,
            ..UploaderConfig::default()
        };
        assert!(large.validate().is_err());

        let min = UploaderConfig {
            part_size_bytes: MIN_PART_SIZE,
            ..UploaderConfig::default()
        };
        assert!(min.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = UploaderConfig {
            max_concurrency: 0,
            ..UploaderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_path_not_empty() {
        assert!(config_path().to_string_lossy().contains("streamvod"));
    }
}
