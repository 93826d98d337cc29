//! Settings stored in a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_TTL_SECS;
use crate::error::ConfigError;
use crate::freshness::{
    FreshnessPolicy, DEFAULT_MAX_VALIDITY_HOURS, DEFAULT_WINDOW_MINUTES, DEFAULT_WINDOW_START_HOURS,
};
use crate::marker::{MarkerStore, DEFAULT_NO_DATA_COOLDOWN_HOURS};
use crate::pipeline::PipelineOptions;
use crate::scheduler::DEFAULT_CONCURRENCY;
use crate::snapshot::DEFAULT_MAX_DOCUMENT_BYTES;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tmdb: TmdbSettings,
    #[serde(default)]
    pub tvdb: TvdbSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub freshness: FreshnessSettings,
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Reference provider (TMDB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "TmdbSettings::default_language")]
    pub language: String,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: Self::default_language(),
        }
    }
}

impl TmdbSettings {
    fn default_language() -> String {
        "en-US".to_string()
    }
}

/// Secondary provider (TheTVDB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvdbSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "TvdbSettings::default_language")]
    pub language: String,
}

impl Default for TvdbSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: Self::default_language(),
        }
    }
}

impl TvdbSettings {
    fn default_language() -> String {
        "eng".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Directory holding snapshot documents
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "StoreSettings::default_max_document_bytes")]
    pub max_document_bytes: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: None,
            max_document_bytes: Self::default_max_document_bytes(),
        }
    }
}

impl StoreSettings {
    fn default_max_document_bytes() -> usize {
        DEFAULT_MAX_DOCUMENT_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessSettings {
    /// Daily refresh window start hours, UTC
    #[serde(default = "FreshnessSettings::default_window_start_hours")]
    pub window_start_hours: Vec<u32>,
    #[serde(default = "FreshnessSettings::default_window_minutes")]
    pub window_minutes: i64,
    #[serde(default = "FreshnessSettings::default_max_validity_hours")]
    pub max_validity_hours: i64,
}

impl Default for FreshnessSettings {
    fn default() -> Self {
        Self {
            window_start_hours: Self::default_window_start_hours(),
            window_minutes: Self::default_window_minutes(),
            max_validity_hours: Self::default_max_validity_hours(),
        }
    }
}

impl FreshnessSettings {
    fn default_window_start_hours() -> Vec<u32> {
        DEFAULT_WINDOW_START_HOURS.to_vec()
    }

    fn default_window_minutes() -> i64 {
        DEFAULT_WINDOW_MINUTES
    }

    fn default_max_validity_hours() -> i64 {
        DEFAULT_MAX_VALIDITY_HOURS
    }

    pub fn policy(&self) -> Result<FreshnessPolicy, ConfigError> {
        Ok(FreshnessPolicy::new(
            self.window_start_hours.clone(),
            span("freshness.window_minutes", self.window_minutes, chrono::Duration::try_minutes)?,
            span("freshness.max_validity_hours", self.max_validity_hours, chrono::Duration::try_hours)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    #[serde(default = "EnrichmentSettings::default_concurrency")]
    pub concurrency: usize,
    /// Per provider call; 0 disables the timeout
    #[serde(default = "EnrichmentSettings::default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "EnrichmentSettings::default_no_data_cooldown_hours")]
    pub no_data_cooldown_hours: i64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            concurrency: Self::default_concurrency(),
            call_timeout_secs: Self::default_call_timeout_secs(),
            no_data_cooldown_hours: Self::default_no_data_cooldown_hours(),
        }
    }
}

impl EnrichmentSettings {
    fn default_concurrency() -> usize {
        DEFAULT_CONCURRENCY
    }

    fn default_call_timeout_secs() -> u64 {
        20
    }

    fn default_no_data_cooldown_hours() -> i64 {
        DEFAULT_NO_DATA_COOLDOWN_HOURS
    }

    pub fn markers(&self) -> Result<MarkerStore, ConfigError> {
        let cooldown = span(
            "enrichment.no_data_cooldown_hours",
            self.no_data_cooldown_hours,
            chrono::Duration::try_hours,
        )?;
        Ok(MarkerStore::new(cooldown))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "CacheSettings::default_ttl_secs")]
    pub ttl_secs: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    fn default_ttl_secs() -> i64 {
        DEFAULT_CACHE_TTL_SECS
    }

    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        span("cache.ttl_secs", self.ttl_secs, chrono::Duration::try_seconds)
    }
}

/// Largest accepted per-call timeout
const MAX_CALL_TIMEOUT_SECS: u64 = 3600;

fn span(
    field: &str,
    value: i64,
    make: fn(i64) -> Option<chrono::Duration>,
) -> Result<chrono::Duration, ConfigError> {
    make(value).ok_or_else(|| ConfigError::Invalid(format!("{} is out of range: {}", field, value)))
}

impl Settings {
    /// Load settings from file, or create it with defaults if it doesn't exist.
    pub async fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let settings = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let settings: Settings = toml::from_str(&content)?;
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default = Settings::default();
                default.save(path).await?;
                tracing::info!("Created default settings file at {}", path.display());
                default
            }
            Err(e) => return Err(e.into()),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file atomically.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&tmp_path, &toml_str).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.enrichment.concurrency == 0 {
            return invalid("enrichment.concurrency must be at least 1".to_string());
        }
        if self.enrichment.no_data_cooldown_hours < 0 {
            return invalid("enrichment.no_data_cooldown_hours must not be negative".to_string());
        }
        if let Some(hour) = self.freshness.window_start_hours.iter().find(|&&h| h >= 24) {
            return invalid(format!("freshness.window_start_hours contains {}", hour));
        }
        if self.freshness.window_minutes <= 0 {
            return invalid("freshness.window_minutes must be positive".to_string());
        }
        if self.freshness.max_validity_hours <= 0 {
            return invalid("freshness.max_validity_hours must be positive".to_string());
        }
        if self.store.max_document_bytes == 0 {
            return invalid("store.max_document_bytes must be positive".to_string());
        }
        if self.cache.ttl_secs <= 0 {
            return invalid("cache.ttl_secs must be positive".to_string());
        }
        if self.enrichment.call_timeout_secs > MAX_CALL_TIMEOUT_SECS {
            return invalid(format!(
                "enrichment.call_timeout_secs must be at most {}",
                MAX_CALL_TIMEOUT_SECS
            ));
        }

        self.freshness.policy()?;
        self.enrichment.markers()?;
        self.cache.ttl()?;
        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            concurrency: self.enrichment.concurrency,
            call_timeout: match self.enrichment.call_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            reference_language: self.tmdb.language.clone(),
            secondary_language: self.tvdb.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [tmdb]
            api_key = "abc"

            [freshness]
            window_start_hours = [6, 18]
            "#,
        )
        .unwrap();

        assert_eq!(settings.tmdb.api_key, "abc");
        assert_eq!(settings.tmdb.language, "en-US");
        assert_eq!(settings.tvdb.language, "eng");
        assert_eq!(settings.freshness.window_start_hours, vec![6, 18]);
        assert_eq!(settings.freshness.max_validity_hours, 8);
        assert_eq!(settings.store.max_document_bytes, 1_048_576);
        assert_eq!(settings.enrichment.concurrency, 5);
        assert!(settings.store.root.is_none());
        settings.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.enrichment.concurrency = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.freshness.window_start_hours = vec![4, 24];
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.freshness.max_validity_hours = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.cache.ttl_secs = -5;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.enrichment.call_timeout_secs = 86_400;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_durations_are_errors() {
        let mut settings = Settings::default();
        settings.freshness.max_validity_hours = i64::MAX;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
        assert!(matches!(settings.freshness.policy(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.enrichment.no_data_cooldown_hours = i64::MAX;
        assert!(settings.validate().is_err());
        assert!(settings.enrichment.markers().is_err());

        let mut settings = Settings::default();
        settings.cache.ttl_secs = i64::MAX;
        assert!(settings.validate().is_err());
        assert!(settings.cache.ttl().is_err());

        let settings = Settings::default();
        assert!(settings.freshness.policy().is_ok());
        assert_eq!(settings.cache.ttl().unwrap(), chrono::Duration::seconds(DEFAULT_CACHE_TTL_SECS));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.pipeline_options().call_timeout,
            Some(Duration::from_secs(20))
        );
        settings.enrichment.call_timeout_secs = 0;
        assert_eq!(settings.pipeline_options().call_timeout, None);
    }

    #[tokio::test]
    async fn test_load_or_create_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("catalog-config-{}", std::process::id()));
        let path = dir.join("catalog.toml");
        let _ = std::fs::remove_dir_all(&dir);

        let created = Settings::load_or_create(&path).await.unwrap();
        assert_eq!(created, Settings::default());
        assert!(path.exists());

        let loaded = Settings::load_or_create(&path).await.unwrap();
        assert_eq!(loaded, created);

        let _ = std::fs::remove_dir_all(dir);
    }
}
