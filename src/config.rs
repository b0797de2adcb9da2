use crate::rules::{Money, Rules, STANDARD_RULES_VERSION};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rules_version: String,
    pub money_cap: Option<Money>,
    pub start_money: Option<Money>,
    pub loss_bonus_ladder: Option<Vec<Money>>,
    pub max_concurrent_matches: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_version: STANDARD_RULES_VERSION.to_string(),
            money_cap: None,
            start_money: None,
            loss_bonus_ladder: None,
            max_concurrent_matches: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let rules_version = env_map
            .get("ECON_RULES_VERSION")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| STANDARD_RULES_VERSION.to_string());
        if rules_version.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ECON_RULES_VERSION".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let money_cap = parse_money(&env_map, "ECON_MONEY_CAP")?;
        let start_money = parse_money(&env_map, "ECON_START_MONEY")?;
        let loss_bonus_ladder = parse_ladder(&env_map)?;

        let max_concurrent_matches = env_map
            .get("ECON_MAX_CONCURRENT_MATCHES")
            .map(|s| s.as_str())
            .unwrap_or("4")
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "ECON_MAX_CONCURRENT_MATCHES".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let overridden =
            money_cap.is_some() || start_money.is_some() || loss_bonus_ladder.is_some();
        if overridden && rules_version == STANDARD_RULES_VERSION {
            return Err(ConfigError::InvalidValue(
                "ECON_RULES_VERSION".to_string(),
                format!(
                    "rule constants were overridden, version must differ from {}",
                    STANDARD_RULES_VERSION
                ),
            ));
        }

        Ok(Config {
            rules_version,
            money_cap,
            start_money,
            loss_bonus_ladder,
            max_concurrent_matches,
        })
    }

    /// Build the immutable ruleset this configuration describes.
    pub fn rules(&self) -> Rules {
        let mut rules = Rules::standard();
        if let Some(cap) = self.money_cap {
            rules.money_cap = cap;
        }
        if let Some(start) = self.start_money {
            rules.start_money = start;
        }
        if let Some(ladder) = &self.loss_bonus_ladder {
            rules.loss_bonus_ladder = ladder.clone().into();
        }
        rules.version = self.rules_version.clone().into();
        rules
    }
}

fn parse_money(env_map: &HashMap<String, String>, key: &str) -> Result<Option<Money>, ConfigError> {
    env_map
        .get(key)
        .map(|s| {
            s.trim()
                .parse::<Money>()
                .ok()
                .filter(|v| *v >= 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        key.to_string(),
                        "must be a non-negative integer".to_string(),
                    )
                })
        })
        .transpose()
}

fn parse_ladder(env_map: &HashMap<String, String>) -> Result<Option<Vec<Money>>, ConfigError> {
    let Some(raw) = env_map.get("ECON_LOSS_BONUS_LADDER") else {
        return Ok(None);
    };
    let invalid = || {
        ConfigError::InvalidValue(
            "ECON_LOSS_BONUS_LADDER".to_string(),
            "must be a comma-separated list of non-negative integers".to_string(),
        )
    };

    let ladder = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Money>().ok().filter(|v| *v >= 0).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;
    if ladder.is_empty() {
        return Err(invalid());
    }
    Ok(Some(ladder))
}
