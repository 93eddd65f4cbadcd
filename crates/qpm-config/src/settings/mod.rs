//! User settings layering: settings file, environment overrides, CLI flags
//!
//! Settings live in `<home>/config.json` where `home` is `$QPM_HOME` or
//! `~/.qilletni`. Environment variables override the file and explicit overrides
//! (CLI flags) override both.

use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use qpm_core::error::QpmError;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Registry used when nothing else is configured
pub const DEFAULT_REGISTRY_URL: &str = "https://qpm.qilletni.dev";

/// Home directory name under the user's home, shared with the Qilletni toolchain
pub const HOME_DIR_NAME: &str = ".qilletni";

/// Settings file name under the home directory
pub const SETTINGS_FILE_NAME: &str = "config.json";

const ENV_HOME: &str = "QPM_HOME";
const ENV_REGISTRY_URL: &str = "QPM_REGISTRY_URL";
const ENV_TOKEN: &str = "QPM_TOKEN";

/// Effective client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Registry base URL without a trailing slash
    pub registry_url: String,
    /// Bearer token for authenticated registry calls
    pub token: Option<String>,
    /// qpm home directory
    pub home: Utf8PathBuf,
}

impl Settings {
    /// Root of the local package store
    pub fn packages_dir(&self) -> Utf8PathBuf {
        self.home.join("packages")
    }

    /// Path of the settings file
    pub fn settings_file(&self) -> Utf8PathBuf {
        self.home.join(SETTINGS_FILE_NAME)
    }
}

/// On-disk settings file shape
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    registry_url: Option<String>,
    #[serde(default)]
    github: Option<GithubSection>,
}

#[derive(Debug, Default, Deserialize)]
struct GithubSection {
    #[serde(default)]
    token: Option<String>,
}

/// Builds [`Settings`] from the settings file, environment and overrides
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    env: HashMap<String, String>,
    registry_override: Option<String>,
}

impl SettingsLoader {
    /// Capture the `QPM_*` variables from the process environment
    pub fn from_env() -> Self {
        let env = [ENV_HOME, ENV_REGISTRY_URL, ENV_TOKEN]
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        Self {
            env,
            registry_override: None,
        }
    }

    /// Use an explicit environment map
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self {
            env,
            registry_override: None,
        }
    }

    /// Override the registry URL, taking precedence over file and environment
    pub fn registry_override(mut self, url: Option<String>) -> Self {
        self.registry_override = url;
        self
    }

    fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Resolve the home directory
    pub fn home(&self) -> ConfigResult<Utf8PathBuf> {
        if let Some(home) = self.env_var(ENV_HOME) {
            return Ok(Utf8PathBuf::from(home));
        }

        let home_dir = dirs::home_dir().ok_or_else(|| QpmError::ConfigValidation {
            field: "home".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        Utf8PathBuf::try_from(home_dir)
            .map(|home| home.join(HOME_DIR_NAME))
            .map_err(|e| QpmError::ConfigValidation {
                field: "home".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })
    }

    /// Load the effective settings
    pub async fn load(&self) -> ConfigResult<Settings> {
        let home = self.home()?;
        let file = read_settings_file(&home.join(SETTINGS_FILE_NAME)).await?;

        let file_token = file.github.and_then(|g| g.token);
        let registry_url = self
            .registry_override
            .clone()
            .or_else(|| self.env_var(ENV_REGISTRY_URL).map(str::to_string))
            .or(file.registry_url)
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());
        let token = self
            .env_var(ENV_TOKEN)
            .map(str::to_string)
            .or(file_token)
            .filter(|t| !t.trim().is_empty());

        let settings = Settings {
            registry_url: normalize_registry_url(&registry_url)?,
            token,
            home,
        };
        debug!(
            registry = %settings.registry_url,
            home = %settings.home,
            authenticated = settings.token.is_some(),
            "loaded settings"
        );
        Ok(settings)
    }
}

async fn read_settings_file(path: &Utf8Path) -> ConfigResult<SettingsFile> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path, "no settings file, using defaults");
            return Ok(SettingsFile::default());
        },
        Err(e) => return Err(QpmError::io(format!("Failed to read {}", path), e)),
    };

    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }

    serde_json::from_str(&content).map_err(|e| QpmError::JsonParse {
        message: format!("{}: {}", path, e),
    })
}

/// Validate a registry URL and strip trailing slashes
pub fn normalize_registry_url(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| QpmError::ConfigValidation {
        field: "registryUrl".to_string(),
        reason: format!("'{}' is not a valid URL: {}", raw, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(QpmError::ConfigValidation {
            field: "registryUrl".to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_in(dir: &tempfile::TempDir, extra: &[(&str, &str)]) -> SettingsLoader {
        let mut env = HashMap::new();
        env.insert(ENV_HOME.to_string(), dir.path().to_string_lossy().into_owned());
        for (k, v) in extra {
            env.insert(k.to_string(), v.to_string());
        }
        SettingsLoader::with_env(env)
    }

    #[tokio::test]
    async fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = loader_in(&dir, &[]).load().await.unwrap();

        assert_eq!(settings.registry_url, DEFAULT_REGISTRY_URL);
        assert_eq!(settings.token, None);
        assert_eq!(settings.packages_dir(), settings.home.join("packages"));
    }

    #[tokio::test]
    async fn test_reads_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{"registryUrl": "https://registry.example.com/", "github": {"token": "gho_file"}}"#,
        )
        .unwrap();

        let settings = loader_in(&dir, &[]).load().await.unwrap();
        assert_eq!(settings.registry_url, "https://registry.example.com");
        assert_eq!(settings.token.as_deref(), Some("gho_file"));
    }

    #[tokio::test]
    async fn test_env_overrides_file_and_flag_overrides_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{"registryUrl": "https://file.example.com", "github": {"token": "from-file"}}"#,
        )
        .unwrap();

        let loader = loader_in(
            &dir,
            &[
                (ENV_REGISTRY_URL, "http://env.example.com//"),
                (ENV_TOKEN, "from-env"),
            ],
        );
        let settings = loader.clone().load().await.unwrap();
        assert_eq!(settings.registry_url, "http://env.example.com");
        assert_eq!(settings.token.as_deref(), Some("from-env"));

        let settings = loader
            .registry_override(Some("http://127.0.0.1:9000/".to_string()))
            .load()
            .await
            .unwrap();
        assert_eq!(settings.registry_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_default_home_is_qilletni_dir() {
        let loader = SettingsLoader::with_env(HashMap::new());
        if let Some(user_home) = dirs::home_dir() {
            let home = loader.home().unwrap();
            assert_eq!(home.as_std_path(), user_home.join(HOME_DIR_NAME));
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), "{ not json").unwrap();

        let err = loader_in(&dir, &[]).load().await.unwrap_err();
        assert!(matches!(err, QpmError::JsonParse { .. }));
    }

    #[test]
    fn test_normalize_registry_url() {
        assert_eq!(
            normalize_registry_url("https://qpm.example.com/").unwrap(),
            "https://qpm.example.com"
        );
        assert!(normalize_registry_url("not a url").is_err());
        assert!(normalize_registry_url("ftp://qpm.example.com").is_err());
    }
}
