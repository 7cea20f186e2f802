//! Per-league rule tables.
//!
//! Leagues differ only in the values held here: collar windows, shield
//! ceilings, directional source, scoring model parameters and bucket
//! matchers. The pipeline itself has a single control flow.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::types::{BetCategory, League, TeamProfile};

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do when an outcome backs the side the model does not favor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionalPolicy {
    /// Terminal rejection.
    Reject,
    /// Pass with a flagged verdict; the scorer applies a penalty.
    Annotate,
}

/// Where the favorite used by the directional check comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteSource {
    /// Projected-margin model over team profiles.
    ProjectedMargin,
    /// Market favorite derived by the normalizer.
    Market,
    /// No directional check.
    Off,
}

/// What to do when neither competitor has a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingProfilePolicy {
    Reject,
    LeagueAverage,
}

/// Whether a shield breach rejects or only annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldMode {
    Reject,
    Annotate,
}

// ---------------------------------------------------------------------------
// Rule parameters
// ---------------------------------------------------------------------------

/// Inclusive American-odds window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collar {
    pub min: i32,
    pub max: i32,
}

impl Collar {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: i32) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Collar per bet category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollarTable {
    pub spread: Collar,
    pub moneyline: Collar,
    pub total: Collar,
    pub prop: Collar,
}

impl CollarTable {
    pub fn for_category(&self, category: BetCategory) -> Collar {
        match category {
            BetCategory::Spread => self.spread,
            BetCategory::Moneyline => self.moneyline,
            BetCategory::Total => self.total,
            BetCategory::PlayerProp => self.prop,
        }
    }
}

/// Line-magnitude ceilings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldConfig {
    pub spread_ceiling: Option<f64>,
    pub total_ceiling: Option<f64>,
    pub mode: ShieldMode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalConfig {
    pub source: FavoriteSource,
    pub policy: DirectionalPolicy,
    /// Score penalty applied to annotated mismatches.
    pub penalty: f64,
}

/// Closer-situation fundamentals thresholds (percent units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalsGate {
    pub band_min: f64,
    pub band_max: f64,
    pub min_free_throw_pct: f64,
    pub max_turnover_pct: f64,
}

// ---------------------------------------------------------------------------
// Scoring models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginModel {
    pub home_court_bonus: f64,
    pub base: f64,
    pub slope: f64,
    /// Edges below this are excluded.
    pub min_edge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceModel {
    pub high_total: f64,
    pub low_total: f64,
    pub base: f64,
    pub slope: f64,
}

/// What a tier table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKey {
    LineMagnitude,
    Price,
}

/// Inclusive bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub min: f64,
    pub max: f64,
    pub score: f64,
}

impl Tier {
    pub const fn new(min: f64, max: f64, score: f64) -> Self {
        Self { min, max, score }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TieredModel {
    pub key: TierKey,
    /// First matching tier wins.
    pub tiers: Vec<Tier>,
    pub fallback: f64,
    /// Weight of the price tie-breaker.
    pub price_weight: f64,
}

impl TieredModel {
    /// Football key numbers 3 and 7.
    pub fn key_numbers() -> Self {
        Self {
            key: TierKey::LineMagnitude,
            tiers: vec![
                Tier::new(2.5, 3.5, 70.0),
                Tier::new(6.5, 7.5, 65.0),
                Tier::new(0.0, 2.0, 55.0),
            ],
            fallback: 50.0,
            price_weight: 1.0,
        }
    }

    /// Bonuses peaking near a fair-value -110.
    pub fn price_centered() -> Self {
        Self {
            key: TierKey::Price,
            tiers: vec![
                Tier::new(-115.0, -105.0, 60.0),
                Tier::new(-125.0, -116.0, 55.0),
                Tier::new(-104.0, 110.0, 55.0),
            ],
            fallback: 45.0,
            price_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SideModel {
    ProjectedMargin(MarginModel),
    Tiered(TieredModel),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TotalModel {
    Pace(PaceModel),
    Tiered(TieredModel),
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Substrings matched against a candidate's uppercase market label.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketMatchers {
    pub spread: Vec<String>,
    pub moneyline: Vec<String>,
    pub total_over: Vec<String>,
    pub total_under: Vec<String>,
    pub prop: Vec<String>,
}

impl Default for BucketMatchers {
    fn default() -> Self {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Self {
            spread: owned(&["SPREAD", "PUCK LINE", "HANDICAP"]),
            moneyline: owned(&["MONEYLINE", "H2H"]),
            total_over: owned(&["TOTAL OVER"]),
            total_under: owned(&["TOTAL UNDER"]),
            prop: owned(&["PLAYER PROP"]),
        }
    }
}

// ---------------------------------------------------------------------------
// League rules
// ---------------------------------------------------------------------------

/// The full parameter set for one league.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueRules {
    pub league: League,
    pub ledger_limit: usize,
    pub max_per_event: Option<usize>,
    pub collars: CollarTable,
    pub shield: ShieldConfig,
    pub directional: DirectionalConfig,
    pub fundamentals: Option<FundamentalsGate>,
    pub missing_profiles: MissingProfilePolicy,
    pub neutral_profile: TeamProfile,
    pub side_model: SideModel,
    pub total_model: TotalModel,
    pub prop_model: TieredModel,
    pub buckets: BucketMatchers,
}

const STANDARD_COLLARS: CollarTable = CollarTable {
    spread: Collar::new(-180, 150),
    moneyline: Collar::new(-180, 150),
    total: Collar::new(-120, 125),
    prop: Collar::new(-150, 130),
};

impl LeagueRules {
    /// Shipped defaults for a league.
    pub fn defaults(league: League) -> Self {
        let directional = |source| DirectionalConfig {
            source,
            policy: DirectionalPolicy::Reject,
            penalty: 10.0,
        };

        match league {
            League::Nba => Self {
                league,
                ledger_limit: 8,
                max_per_event: Some(2),
                collars: STANDARD_COLLARS,
                shield: ShieldConfig {
                    spread_ceiling: Some(10.5),
                    total_ceiling: None,
                    mode: ShieldMode::Reject,
                },
                directional: directional(FavoriteSource::ProjectedMargin),
                fundamentals: Some(FundamentalsGate {
                    band_min: 0.5,
                    band_max: 4.5,
                    min_free_throw_pct: 75.0,
                    max_turnover_pct: 14.5,
                }),
                missing_profiles: MissingProfilePolicy::Reject,
                neutral_profile: TeamProfile::neutral(99.0, 114.0),
                side_model: SideModel::ProjectedMargin(MarginModel {
                    home_court_bonus: 1.5,
                    base: 50.0,
                    slope: 5.0,
                    min_edge: 0.0,
                }),
                total_model: TotalModel::Pace(PaceModel {
                    high_total: 202.0,
                    low_total: 194.0,
                    base: 50.0,
                    slope: 4.0,
                }),
                prop_model: TieredModel::price_centered(),
                buckets: BucketMatchers::default(),
            },
            League::Nfl => Self {
                league,
                ledger_limit: 6,
                max_per_event: Some(2),
                collars: CollarTable {
                    total: Collar::new(-125, 125),
                    ..STANDARD_COLLARS
                },
                shield: ShieldConfig {
                    spread_ceiling: Some(10.5),
                    total_ceiling: None,
                    mode: ShieldMode::Reject,
                },
                directional: directional(FavoriteSource::Market),
                fundamentals: None,
                missing_profiles: MissingProfilePolicy::LeagueAverage,
                neutral_profile: TeamProfile::neutral(63.0, 0.0),
                side_model: SideModel::Tiered(TieredModel::key_numbers()),
                total_model: TotalModel::Tiered(TieredModel::price_centered()),
                prop_model: TieredModel::price_centered(),
                buckets: BucketMatchers::default(),
            },
            League::Ncaab => Self {
                league,
                ledger_limit: 8,
                max_per_event: Some(2),
                collars: STANDARD_COLLARS,
                shield: ShieldConfig {
                    spread_ceiling: Some(14.5),
                    total_ceiling: None,
                    mode: ShieldMode::Annotate,
                },
                directional: directional(FavoriteSource::ProjectedMargin),
                fundamentals: None,
                missing_profiles: MissingProfilePolicy::LeagueAverage,
                neutral_profile: TeamProfile::neutral(68.0, 104.0),
                side_model: SideModel::ProjectedMargin(MarginModel {
                    home_court_bonus: 3.0,
                    base: 50.0,
                    slope: 5.0,
                    min_edge: 0.0,
                }),
                total_model: TotalModel::Pace(PaceModel {
                    high_total: 140.0,
                    low_total: 130.0,
                    base: 50.0,
                    slope: 4.0,
                }),
                prop_model: TieredModel::price_centered(),
                buckets: BucketMatchers::default(),
            },
            League::Nhl => Self {
                league,
                ledger_limit: 5,
                max_per_event: Some(2),
                collars: STANDARD_COLLARS,
                shield: ShieldConfig {
                    spread_ceiling: None,
                    total_ceiling: None,
                    mode: ShieldMode::Reject,
                },
                directional: directional(FavoriteSource::Market),
                fundamentals: None,
                missing_profiles: MissingProfilePolicy::LeagueAverage,
                neutral_profile: TeamProfile::neutral(60.0, 0.0),
                side_model: SideModel::Tiered(TieredModel::price_centered()),
                total_model: TotalModel::Tiered(TieredModel::price_centered()),
                prop_model: TieredModel::price_centered(),
                buckets: BucketMatchers::default(),
            },
            League::Soccer => Self {
                league,
                ledger_limit: 5,
                max_per_event: Some(2),
                collars: STANDARD_COLLARS,
                shield: ShieldConfig {
                    spread_ceiling: None,
                    total_ceiling: Some(3.5),
                    mode: ShieldMode::Annotate,
                },
                directional: directional(FavoriteSource::Off),
                fundamentals: None,
                missing_profiles: MissingProfilePolicy::LeagueAverage,
                neutral_profile: TeamProfile::neutral(0.0, 0.0),
                side_model: SideModel::Tiered(TieredModel::price_centered()),
                total_model: TotalModel::Tiered(TieredModel::price_centered()),
                prop_model: TieredModel::price_centered(),
                buckets: BucketMatchers::default(),
            },
        }
    }

    /// The margin model, when this league ranks sides with profiles.
    pub fn margin_model(&self) -> Option<&MarginModel> {
        match &self.side_model {
            SideModel::ProjectedMargin(m) => Some(m),
            SideModel::Tiered(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Everything the pipeline needs, passed in at construction time.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub preferred_bookmaker: String,
    /// Case-insensitive substrings matched against both team names.
    pub ban_list: Vec<String>,
    pub leagues: BTreeMap<League, LeagueRules>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preferred_bookmaker: "draftkings".to_string(),
            ban_list: vec!["Milwaukee Bucks".to_string(), "Pittsburgh Penguins".to_string()],
            leagues: League::ALL
                .iter()
                .map(|&l| (l, LeagueRules::defaults(l)))
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Rules for a league; shipped defaults when not configured.
    pub fn rules_for(&self, league: League) -> LeagueRules {
        self.leagues
            .get(&league)
            .cloned()
            .unwrap_or_else(|| LeagueRules::defaults(league))
    }

    /// Mutable rules for a league, inserting defaults first if absent.
    pub fn rules_mut(&mut self, league: League) -> &mut LeagueRules {
        self.leagues
            .entry(league)
            .or_insert_with(|| LeagueRules::defaults(league))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
