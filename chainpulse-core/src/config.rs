//! TOML configuration with environment overrides for secrets.

use crate::error::ConfigError;
use crate::types::ProjectEntry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "chainpulse.toml";
pub const CONFIG_PATH_ENV: &str = "CHAINPULSE_CONFIG";
pub const LLM_API_KEY_ENV: &str = "CHAINPULSE_LLM_API_KEY";
pub const X_ACCESS_TOKEN_ENV: &str = "CHAINPULSE_X_ACCESS_TOKEN";
pub const DRY_RUN_ENV: &str = "CHAINPULSE_DRY_RUN";
/// One week.
pub const MAX_FRESHNESS_WINDOW_MINS: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub platform: PlatformConfig,
    pub schedule: ScheduleConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Primary model first, then fallbacks in priority order.
    pub models: Vec<String>,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "gpt-4-turbo".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
            request_timeout_secs: 60,
            max_tokens: 400,
            temperature: 0.8,
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformMode {
    XApi,
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub mode: PlatformMode,
    pub api_base: String,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            mode: PlatformMode::XApi,
            api_base: "https://api.twitter.com".to_string(),
            access_token: None,
            request_timeout_secs: 30,
            user_agent: concat!("chainpulse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minute within each hour at which the post job fires.
    pub post_minute: u32,
    /// Minute within each hour at which the reply job fires.
    pub reply_minute: u32,
    pub tick_interval_secs: u64,
    pub failure_backoff_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            post_minute: 0,
            reply_minute: 30,
            tick_interval_secs: 60,
            failure_backoff_secs: 60,
        }
    }
}

impl ScheduleConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub projects_per_run: usize,
    pub post_pacing_secs: u64,
    pub accounts_per_run: usize,
    pub reply_pacing_secs: u64,
    pub freshness_window_mins: i64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            projects_per_run: 2,
            post_pacing_secs: 45,
            accounts_per_run: 5,
            reply_pacing_secs: 90,
            freshness_window_mins: 60,
        }
    }
}

impl JobsConfig {
    pub fn post_pacing(&self) -> Duration {
        Duration::from_secs(self.post_pacing_secs)
    }

    pub fn reply_pacing(&self) -> Duration {
        Duration::from_secs(self.reply_pacing_secs)
    }

    /// Clamped to `0..=MAX_FRESHNESS_WINDOW_MINS` so an unvalidated value
    /// cannot overflow.
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.freshness_window_mins.clamp(0, MAX_FRESHNESS_WINDOW_MINS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "chainpulse=info,background_service=info,content_engine=info,\
                     llm_interface=info,platform_client=info,chainpulse_core=info"
                .to_string(),
        }
    }
}

/// Replacement lists for the built-in catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub projects: Vec<ProjectEntry>,
    pub accounts: Vec<String>,
    pub keywords: Vec<String>,
}

/// Where the configuration is read from. A missing file is only an error
/// when the location was requested explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub explicit: bool,
}

impl ConfigLocation {
    /// `--config <path>` wins over the environment variable, which wins over
    /// the default file name.
    pub fn resolve(args: &[String], env_path: Option<String>) -> Self {
        let cli_path = args
            .windows(2)
            .find(|pair| pair[0] == "--config" || pair[0] == "-c")
            .map(|pair| pair[1].clone());

        match cli_path.or(env_path) {
            Some(path) => Self {
                path: PathBuf::from(path),
                explicit: true,
            },
            None => Self {
                path: PathBuf::from(DEFAULT_CONFIG_PATH),
                explicit: false,
            },
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidFormat {
                details: format!("{}: {}", path.display(), e),
            },
        })?;
        Self::from_toml_str(&content)
    }

    /// Reads the file (or defaults), applies environment overrides and
    /// validates the result.
    pub fn load(location: &ConfigLocation) -> Result<Self, ConfigError> {
        let mut config = if location.path.exists() || location.explicit {
            info!("Loading configuration from {}", location.path.display());
            Self::from_file(&location.path)?
        } else {
            debug!(
                "No configuration file at {}, using defaults",
                location.path.display()
            );
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(LLM_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.generation.api_key = Some(key);
        }
        if let Some(token) = lookup(X_ACCESS_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.platform.access_token = Some(token);
        }
        if let Some(flag) = lookup(DRY_RUN_ENV) {
            if matches!(flag.as_str(), "1" | "true" | "yes") {
                self.platform.mode = PlatformMode::DryRun;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: "generation.models".to_string(),
            });
        }
        validate_url("generation.base_url", &self.generation.base_url)?;
        validate_url("platform.api_base", &self.platform.api_base)?;

        for (field, minute) in [
            ("schedule.post_minute", self.schedule.post_minute),
            ("schedule.reply_minute", self.schedule.reply_minute),
        ] {
            if minute >= 60 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: minute.to_string(),
                });
            }
        }
        if self.schedule.post_minute == self.schedule.reply_minute {
            return Err(ConfigError::ValidationFailed {
                reason: "post and reply jobs share the same minute offset".to_string(),
            });
        }
        if self.schedule.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.tick_interval_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.jobs.projects_per_run == 0 || self.jobs.accounts_per_run == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "jobs must sample at least one item per run".to_string(),
            });
        }
        if !(1..=MAX_FRESHNESS_WINDOW_MINS).contains(&self.jobs.freshness_window_mins) {
            return Err(ConfigError::InvalidValue {
                field: "jobs.freshness_window_mins".to_string(),
                value: self.jobs.freshness_window_mins.to_string(),
            });
        }

        if self.platform.mode == PlatformMode::XApi && self.platform.access_token.is_none() {
            return Err(ConfigError::MissingEnvironmentVariable {
                var_name: X_ACCESS_TOKEN_ENV.to_string(),
            });
        }
        if self.generation.api_key.is_none() {
            return Err(ConfigError::MissingEnvironmentVariable {
                var_name: LLM_API_KEY_ENV.to_string(),
            });
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        value: format!("{} ({})", value, e),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.generation.api_key = Some("sk-test".to_string());
        config.platform.access_token = Some("token".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.schedule.post_minute, 0);
        assert_eq!(config.schedule.reply_minute, 30);
        assert_eq!(config.jobs.projects_per_run, 2);
        assert_eq!(config.jobs.accounts_per_run, 5);
        assert_eq!(config.jobs.post_pacing(), Duration::from_secs(45));
        assert_eq!(config.jobs.reply_pacing(), Duration::from_secs(90));
        assert_eq!(config.jobs.freshness_window(), chrono::Duration::hours(1));
        assert_eq!(config.generation.models[0], "gpt-4o-mini");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [generation]
            models = ["primary", "backup"]

            [platform]
            mode = "dry_run"

            [jobs]
            post_pacing_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.generation.models, vec!["primary", "backup"]);
        assert_eq!(config.platform.mode, PlatformMode::DryRun);
        assert_eq!(config.jobs.post_pacing_secs, 5);
        assert_eq!(config.jobs.reply_pacing_secs, 90);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = AppConfig::from_toml_str("[jobs\nbroken");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            LLM_API_KEY_ENV => Some("sk-env".to_string()),
            X_ACCESS_TOKEN_ENV => Some("x-env".to_string()),
            DRY_RUN_ENV => Some("1".to_string()),
            _ => None,
        });

        assert_eq!(config.generation.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.platform.access_token.as_deref(), Some("x-env"));
        assert_eq!(config.platform.mode, PlatformMode::DryRun);
    }

    #[test]
    fn test_validation() {
        assert!(valid_config().validate().is_ok());

        let mut config = valid_config();
        config.generation.models.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));

        let mut config = valid_config();
        config.schedule.reply_minute = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = valid_config();
        config.schedule.reply_minute = config.schedule.post_minute;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));

        let mut config = valid_config();
        config.generation.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = valid_config();
        config.jobs.freshness_window_mins = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = valid_config();
        config.jobs.freshness_window_mins = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("jobs.freshness_window_mins"));

        let mut config = valid_config();
        config.jobs.freshness_window_mins = MAX_FRESHNESS_WINDOW_MINS;
        assert!(config.validate().is_ok());

        let mut config = valid_config();
        config.platform.access_token = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));

        config.platform.mode = PlatformMode::DryRun;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_freshness_window_never_overflows() {
        let jobs = JobsConfig {
            freshness_window_mins: i64::MAX,
            ..Default::default()
        };
        assert_eq!(jobs.freshness_window(), chrono::Duration::days(7));

        let jobs = JobsConfig {
            freshness_window_mins: -5,
            ..Default::default()
        };
        assert_eq!(jobs.freshness_window(), chrono::Duration::zero());

        assert_eq!(
            JobsConfig::default().freshness_window(),
            chrono::Duration::minutes(60)
        );
    }

    #[test]
    fn test_config_location_resolution() {
        let args = vec![
            "chainpulse".to_string(),
            "--config".to_string(),
            "/etc/chainpulse.toml".to_string(),
        ];
        let location = ConfigLocation::resolve(&args, Some("env.toml".to_string()));
        assert_eq!(location.path, PathBuf::from("/etc/chainpulse.toml"));
        assert!(location.explicit);

        let location = ConfigLocation::resolve(&[], Some("env.toml".to_string()));
        assert_eq!(location.path, PathBuf::from("env.toml"));

        let location = ConfigLocation::resolve(&[], None);
        assert_eq!(location.path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!location.explicit);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let location = ConfigLocation {
            path: PathBuf::from("/nonexistent/chainpulse.toml"),
            explicit: true,
        };
        assert!(matches!(
            AppConfig::load(&location),
            Err(ConfigError::FileNotFound { .. })
        ));
    }
}
