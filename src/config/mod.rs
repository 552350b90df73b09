use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::AutomatorError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM backend settings
    pub generation: GenerationConfig,

    /// yt-dlp settings
    pub extraction: ExtractionConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// yt-dlp executable (name on PATH or absolute path)
    pub yt_dlp_path: String,

    /// Caption language to request
    pub subtitle_language: String,

    /// Timeout for the subtitle download, in seconds
    pub subtitle_timeout_secs: u64,

    /// Timeout for the description lookup, in seconds
    pub description_timeout_secs: u64,

    /// Shorter extracted text is rejected as unusable
    pub min_content_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default output format
    pub default_output_format: String,

    /// Generate the X/Twitter thread unless `--no-thread` is given
    pub include_thread: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            subtitle_language: "en".to_string(),
            subtitle_timeout_secs: 30,
            description_timeout_secs: 15,
            min_content_chars: 100,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_output_format: "text".to_string(),
            include_thread: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`, the default locations, or fall back to defaults
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;
            Self::from_yaml(&content)
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path` or the default location, returning where it went
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // Current directory wins so a project can carry its own config
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("social-automator").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AutomatorError> {
        if self.generation.model.trim().is_empty() {
            return Err(AutomatorError::InvalidConfig("generation.model must not be empty".into()));
        }

        if crate::utils::validate_and_normalize_url(&self.generation.base_url).is_err() {
            return Err(AutomatorError::InvalidConfig(format!(
                "generation.base_url is not an http(s) URL: {}",
                self.generation.base_url
            )));
        }

        if self.generation.api_key_env.trim().is_empty() {
            return Err(AutomatorError::InvalidConfig(
                "generation.api_key_env must name an environment variable".into(),
            ));
        }

        let timeouts = [
            ("generation.timeout_secs", self.generation.timeout_secs),
            ("extraction.subtitle_timeout_secs", self.extraction.subtitle_timeout_secs),
            ("extraction.description_timeout_secs", self.extraction.description_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(AutomatorError::InvalidConfig(format!("{} must be greater than zero", name)));
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API Base URL: {}", self.generation.base_url);
        println!("  Model: {}", self.generation.model);
        println!("  API Key Variable: {}", self.generation.api_key_env);
        println!("  Generation Timeout: {}s", self.generation.timeout_secs);
        println!("  yt-dlp: {}", self.extraction.yt_dlp_path);
        println!("  Subtitle Language: {}", self.extraction.subtitle_language);
        println!(
            "  Extraction Timeouts: {}s subtitles, {}s description",
            self.extraction.subtitle_timeout_secs, self.extraction.description_timeout_secs
        );
        println!("  Include Thread: {}", self.app.include_thread);
        println!("  Default Format: {}", self.app.default_output_format);
    }
}

/// API credential, read once at startup and handed to the generation client
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the variable named by `generation.api_key_env`. Empty counts as missing.
    pub fn from_env(config: &GenerationConfig) -> Result<Self, AutomatorError> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(AutomatorError::MissingCredential(config.api_key_env.clone())),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.subtitle_timeout_secs, 30);
        assert_eq!(config.extraction.description_timeout_secs, 15);
        assert_eq!(config.extraction.min_content_chars, 100);
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "generation:\n  model: llama-3.1-8b-instant\napp:\n  include_thread: false\n",
        )
        .unwrap();
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.generation.api_key_env, "GROQ_API_KEY");
        assert!(!config.app.include_thread);
        assert_eq!(config.extraction.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_yaml("generation:\n  base_url: ftp://example.com\n").is_err());
        assert!(Config::from_yaml("generation:\n  model: \"\"\n").is_err());
        assert!(Config::from_yaml("extraction:\n  subtitle_timeout_secs: 0\n").is_err());
    }

    #[test]
    fn test_api_key_from_env() {
        let config = GenerationConfig {
            api_key_env: "SOCIAL_AUTOMATOR_TEST_KEY_PRESENT".into(),
            ..GenerationConfig::default()
        };
        std::env::set_var("SOCIAL_AUTOMATOR_TEST_KEY_PRESENT", " gsk_123 ");
        assert_eq!(ApiKey::from_env(&config).unwrap().expose(), "gsk_123");

        let missing = GenerationConfig {
            api_key_env: "SOCIAL_AUTOMATOR_TEST_KEY_MISSING".into(),
            ..GenerationConfig::default()
        };
        std::env::remove_var("SOCIAL_AUTOMATOR_TEST_KEY_MISSING");
        match ApiKey::from_env(&missing) {
            Err(AutomatorError::MissingCredential(var)) => {
                assert_eq!(var, "SOCIAL_AUTOMATOR_TEST_KEY_MISSING")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        assert_eq!(format!("{:?}", ApiKey::new("secret")), "ApiKey(***)");
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.extraction.subtitle_language = "de".into();
        let written = config.save(Some(&path)).await.unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(Some(&path)).await.unwrap();
        assert_eq!(loaded.extraction.subtitle_language, "de");
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.yaml"))).await.is_err());
    }
}
