//! Loading service configuration from TOML and environment variables.
//!
//! Resolution order: built-in defaults, then the TOML file named by
//! `ADVENT_CONFIG_PATH` (if set), then individual env overrides
//! (`CATALOG_PATH`, `PROGRESS_PATH`, `UNLOCK_ALL`).
//!
//! Example file:
//! ```toml
//! catalog_path = "./static/regex-data.json"
//! progress_path = "./data/progress.json"
//! persist_progress = true  # false keeps reveals in memory only
//!
//! [unlock]
//! policy = "date_gated"   # or "always_open"
//! month = 12
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::calendar::UnlockPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("unlock month must be 1..=12, got {0}")]
  InvalidMonth(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
  #[default]
  DateGated,
  AlwaysOpen,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UnlockCfg {
  pub policy: PolicyKind,
  pub month: u32,
}

impl Default for UnlockCfg {
  fn default() -> Self {
    Self { policy: PolicyKind::DateGated, month: 12 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub catalog_path: PathBuf,
  pub progress_path: PathBuf,
  pub persist_progress: bool,
  pub unlock: UnlockCfg,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      catalog_path: PathBuf::from("./static/regex-data.json"),
      progress_path: PathBuf::from("./data/progress.json"),
      persist_progress: true,
      unlock: UnlockCfg::default(),
    }
  }
}

impl AppConfig {
  pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
  }

  /// Apply env-style overrides. `lookup` is `std::env::var` in production.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(p) = lookup("CATALOG_PATH").filter(|s| !s.is_empty()) {
      self.catalog_path = PathBuf::from(p);
    }
    if let Some(p) = lookup("PROGRESS_PATH").filter(|s| !s.is_empty()) {
      self.progress_path = PathBuf::from(p);
    }
    if let Some(v) = lookup("UNLOCK_ALL") {
      match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => self.unlock.policy = PolicyKind::AlwaysOpen,
        "0" | "false" | "no" | "off" | "" => self.unlock.policy = PolicyKind::DateGated,
        other => warn!(target: "regex_advent", value = %other, "Ignoring unrecognized UNLOCK_ALL value"),
      }
    }
  }

  pub fn unlock_policy(&self) -> Result<UnlockPolicy, ConfigError> {
    match self.unlock.policy {
      PolicyKind::AlwaysOpen => Ok(UnlockPolicy::AlwaysOpen),
      PolicyKind::DateGated => {
        if !(1..=12).contains(&self.unlock.month) {
          return Err(ConfigError::InvalidMonth(self.unlock.month));
        }
        Ok(UnlockPolicy::DateGated { month: self.unlock.month })
      }
    }
  }
}

/// Build the configuration from the process environment.
/// A configured-but-broken TOML file is an error; no file is fine.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
  let mut cfg = match std::env::var("ADVENT_CONFIG_PATH").ok() {
    Some(path) => {
      let text = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
      let cfg = AppConfig::from_toml_str(&text, &path)?;
      info!(target: "regex_advent", %path, "Loaded config (TOML)");
      cfg
    }
    None => AppConfig::default(),
  };
  cfg.apply_overrides(|k| std::env::var(k).ok());
  Ok(cfg)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k: &str| map.get(k).cloned()
  }

  #[test]
  fn defaults_are_date_gated_december() {
    let cfg = AppConfig::default();
    assert_eq!(cfg.unlock_policy().unwrap(), UnlockPolicy::DateGated { month: 12 });
    assert_eq!(cfg.catalog_path, PathBuf::from("./static/regex-data.json"));
  }

  #[test]
  fn toml_file_is_parsed_with_partial_fields() {
    let cfg = AppConfig::from_toml_str(
      "catalog_path = \"/srv/lessons.json\"\n[unlock]\npolicy = \"always_open\"\n",
      "test.toml",
    )
    .unwrap();
    assert_eq!(cfg.catalog_path, PathBuf::from("/srv/lessons.json"));
    assert_eq!(cfg.progress_path, PathBuf::from("./data/progress.json"));
    assert!(cfg.persist_progress);
    assert_eq!(cfg.unlock_policy().unwrap(), UnlockPolicy::AlwaysOpen);
  }

  #[test]
  fn bad_toml_is_an_error() {
    let err = AppConfig::from_toml_str("[unlock]\npolicy = \"sometimes\"\n", "bad.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
  }

  #[test]
  fn invalid_month_is_rejected() {
    let cfg = AppConfig::from_toml_str("[unlock]\nmonth = 13\n", "m.toml").unwrap();
    assert!(matches!(cfg.unlock_policy(), Err(ConfigError::InvalidMonth(13))));
  }

  #[test]
  fn env_overrides_win() {
    let mut cfg = AppConfig::default();
    cfg.apply_overrides(env(&[("CATALOG_PATH", "/tmp/c.json"), ("PROGRESS_PATH", "/tmp/p.json"), ("UNLOCK_ALL", "true")]));
    assert_eq!(cfg.catalog_path, PathBuf::from("/tmp/c.json"));
    assert_eq!(cfg.progress_path, PathBuf::from("/tmp/p.json"));
    assert_eq!(cfg.unlock_policy().unwrap(), UnlockPolicy::AlwaysOpen);

    cfg.apply_overrides(env(&[("UNLOCK_ALL", "0")]));
    assert_eq!(cfg.unlock_policy().unwrap(), UnlockPolicy::DateGated { month: 12 });

    cfg.apply_overrides(env(&[("UNLOCK_ALL", "maybe")]));
    assert_eq!(cfg.unlock.policy, PolicyKind::DateGated);
  }
}
