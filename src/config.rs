use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for spreadsheet ingestion runs. Defaults match the worksheet layout
/// users are told to create: `CATEGORIES`, `NODES` and an optional `STYLES`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Lowest accepted node importance (inclusive).
    pub min_importance: i64,
    /// Highest accepted node importance (inclusive).
    pub max_importance: i64,
    pub categories_worksheet: String,
    pub nodes_worksheet: String,
    pub styles_worksheet: String,
    /// Upper bound for credential acquisition and for the worksheet fetch.
    pub fetch_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            min_importance: 1,
            max_importance: 30,
            categories_worksheet: "CATEGORIES".to_string(),
            nodes_worksheet: "NODES".to_string(),
            styles_worksheet: "STYLES".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

impl IngestionConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Importance is stored as a 32-bit column, so both bounds must fit in one.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("min_importance", self.min_importance),
            ("max_importance", self.max_importance),
        ] {
            if i32::try_from(value).is_err() {
                bail!("ingestion.{key} = {value} is outside the storable range");
            }
        }
        if self.min_importance > self.max_importance {
            bail!(
                "ingestion.min_importance ({}) is greater than ingestion.max_importance ({})",
                self.min_importance,
                self.max_importance
            );
        }
        Ok(())
    }
}

/// Background cleanup of entities left behind by deleted visualizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub interval_secs: u64,
    /// Tasks that failed this many times are left for manual inspection.
    pub max_attempts: i32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_attempts: 5,
        }
    }
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: String,
    pub port: u16,
    pub cors_origin: Option<String>,
    /// Directory holding one sub-directory of worksheet CSV files per spreadsheet id.
    pub workbook_dir: PathBuf,
    pub ingestion: IngestionConfig,
    pub cleanup: CleanupConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: "sheetgraph.db".to_string(),
            port: 3000,
            cors_origin: None,
            workbook_dir: PathBuf::from("workbooks"),
            ingestion: IngestionConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply `SHEETGRAPH_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.ingestion.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("SHEETGRAPH_DATABASE") {
            self.database = database;
        }
        if let Some(dir) = lookup("SHEETGRAPH_WORKBOOK_DIR") {
            self.workbook_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("SHEETGRAPH_MIN_IMPORTANCE") {
            self.ingestion.min_importance = value
                .trim()
                .parse()
                .context("SHEETGRAPH_MIN_IMPORTANCE must be an integer")?;
        }
        if let Some(value) = lookup("SHEETGRAPH_MAX_IMPORTANCE") {
            self.ingestion.max_importance = value
                .trim()
                .parse()
                .context("SHEETGRAPH_MAX_IMPORTANCE must be an integer")?;
        }
        if let Some(value) = lookup("SHEETGRAPH_FETCH_TIMEOUT_SECS") {
            self.ingestion.fetch_timeout_secs = value
                .trim()
                .parse()
                .context("SHEETGRAPH_FETCH_TIMEOUT_SECS must be a number of seconds")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ingestion.min_importance, 1);
        assert_eq!(config.ingestion.max_importance, 30);
        assert_eq!(config.ingestion.categories_worksheet, "CATEGORIES");
        assert_eq!(config.cleanup.max_attempts, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            port = 8080

            [ingestion]
            max_importance = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.ingestion.max_importance, 10);
        assert_eq!(config.ingestion.min_importance, 1);
        assert_eq!(config.ingestion.nodes_worksheet, "NODES");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHEETGRAPH_MIN_IMPORTANCE", "2"),
            ("SHEETGRAPH_DATABASE", ":memory:"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.ingestion.min_importance, 2);
        assert_eq!(config.database, ":memory:");
    }

    #[test]
    fn test_importance_bounds_are_checked() {
        assert!(IngestionConfig::default().validate().is_ok());

        let inverted = IngestionConfig {
            min_importance: 10,
            max_importance: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let too_wide = IngestionConfig {
            max_importance: i64::from(i32::MAX) + 1,
            ..Default::default()
        };
        let err = too_wide.validate().unwrap_err();
        assert!(err.to_string().contains("max_importance"));
    }

    #[test]
    fn test_load_rejects_inverted_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetgraph.toml");
        std::fs::write(&path, "[ingestion]\nmin_importance = 40\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| {
            (key == "SHEETGRAPH_MAX_IMPORTANCE").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }
}
