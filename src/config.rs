//! Loading service configuration (grant policy + optional level table) from TOML.
//!
//! Example:
//!
//! ```toml
//! [policy]
//! max_entry_xp = 5000
//! history_limit = 100
//!
//! [[levels]]
//! id = 1
//! level = 1
//! xp_required = 0
//! title = "Newcomer"
//!
//! [[levels]]
//! id = 2
//! level = 2
//! xp_required = 100
//! title = "Reader"
//! [levels.rewards]
//! badges = ["reader"]
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Level;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ProgressionConfig {
  #[serde(default)]
  pub policy: GrantPolicy,
  /// Empty means "use the built-in seed table".
  #[serde(default)]
  pub levels: Vec<Level>,
}

/// Limits applied to incoming grants and list endpoints.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GrantPolicy {
  /// Largest absolute XP value a single grant may carry.
  pub max_entry_xp: u64,
  pub history_limit: usize,
  pub leaderboard_limit: usize,
}

impl Default for GrantPolicy {
  fn default() -> Self {
    Self {
      max_entry_xp: 10_000,
      history_limit: 50,
      leaderboard_limit: 10,
    }
  }
}

pub fn parse_config(path: &str, raw: &str) -> Result<ProgressionConfig, ConfigError> {
  toml::from_str::<ProgressionConfig>(raw).map_err(|source| ConfigError::Parse {
    path: path.to_string(),
    source,
  })
}

/// Load from PROGRESSION_CONFIG_PATH. Unset means defaults; a broken file is an error.
pub fn load_config_from_env() -> Result<ProgressionConfig, ConfigError> {
  let Ok(path) = std::env::var("PROGRESSION_CONFIG_PATH") else {
    info!(target: "xp_progression", "PROGRESSION_CONFIG_PATH not set; using defaults");
    return Ok(ProgressionConfig::default());
  };

  let raw = std::fs::read_to_string(&path).map_err(|source| {
    error!(target: "xp_progression", %path, error = %source, "Failed to read TOML config file");
    ConfigError::Read { path: path.clone(), source }
  })?;

  let cfg = parse_config(&path, &raw).inspect_err(|e| {
    error!(target: "xp_progression", %path, error = %e, "Failed to parse TOML config");
  })?;
  info!(target: "xp_progression", %path, levels = cfg.levels.len(), "Loaded progression config (TOML)");
  Ok(cfg)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_config("inline", "").unwrap();
    assert!(cfg.levels.is_empty());
    assert_eq!(cfg.policy.max_entry_xp, 10_000);
    assert_eq!(cfg.policy.history_limit, 50);
    assert_eq!(cfg.policy.leaderboard_limit, 10);
  }

  #[test]
  fn parses_policy_and_levels() {
    let raw = r##"
      [policy]
      max_entry_xp = 500

      [[levels]]
      id = 1
      level = 1
      xp_required = 0
      title = "Newcomer"

      [[levels]]
      id = 2
      level = 2
      xp_required = 250
      title = "Reader"
      icon = "book"
      color = "#00FF00"
      [levels.rewards]
      badges = ["reader"]
      xp_multiplier = 1.5
    "##;
    let cfg = parse_config("inline", raw).unwrap();
    assert_eq!(cfg.policy.max_entry_xp, 500);
    assert_eq!(cfg.policy.history_limit, 50);
    assert_eq!(cfg.levels.len(), 2);
    let reader = &cfg.levels[1];
    assert_eq!(reader.xp_required, 250);
    assert_eq!(reader.color.as_deref(), Some("#00FF00"));
    let rewards = reader.rewards.as_ref().unwrap();
    assert_eq!(rewards.badges, vec!["reader".to_string()]);
    assert_eq!(rewards.xp_multiplier, Some(1.5));
    assert!(rewards.feature_unlocks.is_empty());
  }

  #[test]
  fn negative_grant_cap_is_a_parse_error() {
    let raw = r#"
      [policy]
      max_entry_xp = -100
    "#;
    assert!(matches!(parse_config("inline", raw), Err(ConfigError::Parse { .. })));
  }

  #[test]
  fn negative_threshold_is_a_parse_error() {
    let raw = r#"
      [[levels]]
      id = 1
      level = 1
      xp_required = -10
      title = "Broken"
    "#;
    assert!(matches!(parse_config("inline", raw), Err(ConfigError::Parse { .. })));
  }
}
