//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section is optional; anything left out keeps the shipped per-league
//! defaults. `pipeline_config` folds the overrides into a
//! `PipelineConfig` for the candidate pipeline.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

use crate::strategy::league::{
    Collar, DirectionalPolicy, LeagueRules, MissingProfilePolicy, PipelineConfig, ShieldMode,
    SideModel,
};
use crate::types::{League, TitaniumError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// Keyed by league tag ("nba", "basketball_nba", ...).
    #[serde(default)]
    pub leagues: BTreeMap<String, LeagueOverrides>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    pub preferred_bookmaker: Option<String>,
    pub ban_list: Option<Vec<String>>,
    /// Applied to every league unless a league section overrides it.
    pub directional_policy: Option<DirectionalPolicy>,
    pub missing_profile_policy: Option<MissingProfilePolicy>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LeagueOverrides {
    pub ledger_limit: Option<usize>,
    pub max_per_event: Option<usize>,
    pub spread_ceiling: Option<f64>,
    pub total_ceiling: Option<f64>,
    pub shield_mode: Option<ShieldMode>,
    pub home_court_bonus: Option<f64>,
    pub collar_spread: Option<[i32; 2]>,
    pub collar_moneyline: Option<[i32; 2]>,
    pub collar_total: Option<[i32; 2]>,
    pub collar_prop: Option<[i32; 2]>,
    pub directional_policy: Option<DirectionalPolicy>,
    pub missing_profile_policy: Option<MissingProfilePolicy>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub show_rejected: bool,
    /// Only list rejections whose reason contains this (case-insensitive).
    #[serde(default)]
    pub rejected_filter: String,
    /// Print ledgers as JSON rows instead of a table.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Shipped defaults with every configured override applied.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, TitaniumError> {
        let mut cfg = PipelineConfig::default();

        if let Some(book) = &self.pipeline.preferred_bookmaker {
            cfg.preferred_bookmaker = book.clone();
        }
        if let Some(bans) = &self.pipeline.ban_list {
            cfg.ban_list = bans.clone();
        }
        for rules in cfg.leagues.values_mut() {
            if let Some(policy) = self.pipeline.directional_policy {
                rules.directional.policy = policy;
            }
            if let Some(policy) = self.pipeline.missing_profile_policy {
                rules.missing_profiles = policy;
            }
        }

        for (key, overrides) in &self.leagues {
            let league: League = key
                .parse()
                .map_err(|_| TitaniumError::Config(format!("unknown league key [leagues.{key}]")))?;
            overrides.apply(cfg.rules_mut(league))?;
        }
        Ok(cfg)
    }
}

impl LeagueOverrides {
    fn apply(&self, rules: &mut LeagueRules) -> Result<(), TitaniumError> {
        let league = rules.league;

        if let Some(limit) = self.ledger_limit {
            rules.ledger_limit = limit;
        }
        if let Some(cap) = self.max_per_event {
            rules.max_per_event = Some(cap);
        }
        if let Some(ceiling) = self.spread_ceiling {
            rules.shield.spread_ceiling = Some(ceiling);
        }
        if let Some(ceiling) = self.total_ceiling {
            rules.shield.total_ceiling = Some(ceiling);
        }
        if let Some(mode) = self.shield_mode {
            rules.shield.mode = mode;
        }
        if let Some(bonus) = self.home_court_bonus {
            match &mut rules.side_model {
                SideModel::ProjectedMargin(m) => m.home_court_bonus = bonus,
                SideModel::Tiered(_) => {
                    return Err(TitaniumError::Config(format!(
                        "home_court_bonus set for {league}, which has no margin model"
                    )))
                }
            }
        }

        let collars = [
            (self.collar_spread, &mut rules.collars.spread, "collar_spread"),
            (self.collar_moneyline, &mut rules.collars.moneyline, "collar_moneyline"),
            (self.collar_total, &mut rules.collars.total, "collar_total"),
            (self.collar_prop, &mut rules.collars.prop, "collar_prop"),
        ];
        for (value, slot, name) in collars {
            if let Some([min, max]) = value {
                if min > max {
                    return Err(TitaniumError::Config(format!(
                        "{name} for {league}: min {min} is above max {max}"
                    )));
                }
                *slot = Collar::new(min, max);
            }
        }

        if let Some(policy) = self.directional_policy {
            rules.directional.policy = policy;
        }
        if let Some(policy) = self.missing_profile_policy {
            rules.missing_profiles = policy;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[pipeline]
preferred_bookmaker = "fanduel"
ban_list = ["Milwaukee Bucks"]
directional_policy = "annotate"

[leagues.nba]
ledger_limit = 4
spread_ceiling = 9.5
collar_total = [-115, 120]

[leagues.icehockey_nhl]
max_per_event = 1
missing_profile_policy = "reject"

[output]
show_rejected = true
"#;

    #[test]
    fn test_parse_sample() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert!(cfg.output.show_rejected);
        assert_eq!(cfg.leagues.len(), 2);

        let pc = cfg.pipeline_config().unwrap();
        assert_eq!(pc.preferred_bookmaker, "fanduel");
        assert_eq!(pc.ban_list, vec!["Milwaukee Bucks".to_string()]);

        let nba = pc.rules_for(League::Nba);
        assert_eq!(nba.ledger_limit, 4);
        assert_eq!(nba.shield.spread_ceiling, Some(9.5));
        assert_eq!(nba.collars.total, Collar::new(-115, 120));
        assert_eq!(nba.directional.policy, DirectionalPolicy::Annotate);

        let nhl = pc.rules_for(League::Nhl);
        assert_eq!(nhl.max_per_event, Some(1));
        assert_eq!(nhl.missing_profiles, MissingProfilePolicy::Reject);
        assert_eq!(nhl.directional.policy, DirectionalPolicy::Annotate);
    }

    #[test]
    fn test_empty_config_is_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        let pc = cfg.pipeline_config().unwrap();
        assert_eq!(pc.rules_for(League::Nfl), LeagueRules::defaults(League::Nfl));
        assert_eq!(pc.ban_list.len(), 2);
        assert!(!cfg.output.show_rejected);
    }

    #[test]
    fn test_unknown_league_key_rejected() {
        let cfg: AppConfig = toml::from_str("[leagues.cricket]\nledger_limit = 3\n").unwrap();
        let err = cfg.pipeline_config().unwrap_err();
        assert!(matches!(err, TitaniumError::Config(_)));
        assert!(err.to_string().contains("cricket"));
    }

    #[test]
    fn test_inverted_collar_rejected() {
        let cfg: AppConfig = toml::from_str("[leagues.nba]\ncollar_spread = [150, -180]\n").unwrap();
        assert!(cfg.pipeline_config().is_err());
    }

    #[test]
    fn test_home_court_bonus_needs_margin_model() {
        let ok: AppConfig = toml::from_str("[leagues.ncaab]\nhome_court_bonus = 3.5\n").unwrap();
        let pc = ok.pipeline_config().unwrap();
        assert_eq!(pc.rules_for(League::Ncaab).margin_model().unwrap().home_court_bonus, 3.5);

        let bad: AppConfig = toml::from_str("[leagues.nfl]\nhome_court_bonus = 2.0\n").unwrap();
        assert!(bad.pipeline_config().is_err());
    }

    #[test]
    fn test_bad_policy_name_fails_parse() {
        let parsed: Result<AppConfig, _> = toml::from_str("[pipeline]\ndirectional_policy = \"maybe\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_keys_fail_parse() {
        for text in [
            "[pipeline]\npreferred_book = \"fanduel\"\n",
            "[output]\nshow_rejects = true\n",
            "[leagues.nba]\nledger_limt = 3\n",
            "[outputs]\njson = true\n",
        ] {
            let parsed: Result<AppConfig, _> = toml::from_str(text);
            assert!(parsed.is_err(), "accepted: {text}");
        }
    }

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(cfg.pipeline_config().is_ok());
        }
    }
}
