//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for waypost.
#[derive(Debug, Clone)]
pub struct WaypostConfig {
    /// Which backend variant to construct.
    pub backend: BackendKind,
    /// Collection API settings (HTTP variants).
    pub api: ApiConfig,
    /// Directory for the persistent store (local variant).
    pub data_dir: PathBuf,
    /// Store key the collection lives under (storage variants).
    pub collection_key: String,
}

/// Collection API settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the collection API.
    pub base_url: String,
    /// Request timeout in milliseconds, if set.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds, if set.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: None,
            connect_timeout_ms: None,
        }
    }
}

/// Available backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Fetch-style HTTP backend.
    #[default]
    Http,
    /// Preconfigured REST client backend.
    Rest,
    /// Persistent file-backed backend.
    Local,
    /// Session-scoped in-memory backend.
    Session,
}

impl BackendKind {
    /// Parses a backend kind string. Unknown values fall back to the
    /// default variant.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rest" | "client" => Self::Rest,
            "local" | "file" => Self::Local,
            "session" | "memory" => Self::Session,
            _ => Self::Http,
        }
    }

    /// Returns the canonical tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Rest => "rest",
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Backend variant tag.
    pub backend: Option<String>,
    /// Data directory.
    pub data_dir: Option<String>,
    /// Collection key.
    pub collection_key: Option<String>,
    /// API section.
    pub api: Option<ConfigFileApi>,
}

/// API section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileApi {
    /// Base URL.
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for WaypostConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            api: ApiConfig::default(),
            data_dir: PathBuf::from(".waypost"),
            collection_key: "destinations".to_string(),
        }
    }
}

impl WaypostConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::Storage {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::InvalidInput(format!(
                "config file {}: {e}",
                path.display()
            )))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/waypost/` on macOS)
    /// 2. XDG config dir (`~/.config/waypost/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found. Environment
    /// overrides are applied last.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default().with_env_overrides();
        };

        // Check platform-specific config dir first
        let platform_config = base_dirs.config_dir().join("waypost").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config.with_env_overrides();
            }
        }

        // Fall back to XDG-style ~/.config/waypost/ for Unix compatibility
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("waypost")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config.with_env_overrides();
            }
        }

        Self::default().with_env_overrides()
    }

    /// Converts a `ConfigFile` to `WaypostConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(backend) = file.backend {
            config.backend = BackendKind::parse(&backend);
        }
        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(collection_key) = file.collection_key {
            config.collection_key = collection_key;
        }
        if let Some(api) = file.api {
            if let Some(base_url) = api.base_url {
                config.api.base_url = base_url;
            }
            config.api.timeout_ms = api.timeout_ms.or(config.api.timeout_ms);
            config.api.connect_timeout_ms =
                api.connect_timeout_ms.or(config.api.connect_timeout_ms);
        }

        config
    }

    /// Applies `WAYPOST_*` environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("WAYPOST_BACKEND") {
            self.backend = BackendKind::parse(&v);
        }
        if let Ok(v) = std::env::var("WAYPOST_DATA_DIR") {
            if !v.trim().is_empty() {
                self.data_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("WAYPOST_API_BASE_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v;
            }
        }
        self
    }

    /// Sets the backend variant.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Sets the collection key.
    #[must_use]
    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http", BackendKind::Http; "http tag")]
    #[test_case("REST", BackendKind::Rest; "rest tag is case insensitive")]
    #[test_case("client", BackendKind::Rest; "client alias")]
    #[test_case("local", BackendKind::Local; "local tag")]
    #[test_case("file", BackendKind::Local; "file alias")]
    #[test_case("session", BackendKind::Session; "session tag")]
    #[test_case("memory", BackendKind::Session; "memory alias")]
    #[test_case("anything-else", BackendKind::Http; "unknown falls back")]
    fn test_backend_kind_parse(input: &str, expected: BackendKind) {
        assert_eq!(BackendKind::parse(input), expected);
    }

    #[test]
    fn test_backend_kind_roundtrip() {
        for kind in [
            BackendKind::Http,
            BackendKind::Rest,
            BackendKind::Local,
            BackendKind::Session,
        ] {
            assert_eq!(BackendKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_default_config() {
        let config = WaypostConfig::default();
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.data_dir, PathBuf::from(".waypost"));
        assert_eq!(config.collection_key, "destinations");
    }

    #[test]
    fn test_from_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            backend = "session"
            collection_key = "trips"

            [api]
            base_url = "http://localhost:4000"
            timeout_ms = 5000
            "#,
        )
        .unwrap();

        let config = WaypostConfig::from_config_file(file);
        assert_eq!(config.backend, BackendKind::Session);
        assert_eq!(config.collection_key, "trips");
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.api.timeout_ms, Some(5000));
        assert_eq!(config.api.connect_timeout_ms, None);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result =
            WaypostConfig::load_from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_builders() {
        let config = WaypostConfig::new()
            .with_backend(BackendKind::Local)
            .with_data_dir("/tmp/waypost-test")
            .with_base_url("http://localhost:9000")
            .with_collection_key("trips");

        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/waypost-test"));
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.collection_key, "trips");
    }
}
