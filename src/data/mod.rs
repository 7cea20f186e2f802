//! Inbound feed records.
//!
//! The shapes handed over by the retrieval collaborator: already-fetched,
//! already-parsed event blocks with per-bookmaker markets, plus optional
//! team profile tables. Every field is lenient (`#[serde(default)]`) so a
//! malformed record degrades to a dropped outcome rather than a failed
//! slate.

pub mod normalizer;
pub mod profiles;

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::types::{League, TeamProfile, TitaniumError};
use profiles::ProfileBook;

/// One event as delivered by the odds feed.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawEvent {
    pub id: String,
    /// League tag or feed sport key ("nba", "basketball_nba").
    #[serde(alias = "sport_key")]
    pub league: String,
    /// ISO-8601 start time.
    pub commence_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_record: Option<String>,
    pub away_record: Option<String>,
    pub home_rest_days: Option<u32>,
    pub away_rest_days: Option<u32>,
    pub bookmakers: Vec<RawBookmaker>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawBookmaker {
    pub key: String,
    pub title: String,
    pub markets: Vec<RawMarket>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawMarket {
    pub key: String,
    pub outcomes: Vec<RawOutcome>,
}

/// Numeric fields stay as raw JSON so numbers and numeric strings are
/// both accepted and anything else can be dropped per outcome.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawOutcome {
    pub name: Option<String>,
    pub price: Option<Value>,
    pub point: Option<Value>,
    /// Player name on player markets.
    pub description: Option<String>,
}

/// A full input batch: events plus league-keyed profile tables.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Slate {
    pub events: Vec<RawEvent>,
    /// League key ("nba") -> team name -> profile.
    pub profiles: BTreeMap<String, BTreeMap<String, TeamProfile>>,
}

impl Slate {
    /// Parse a slate from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TitaniumError> {
        serde_json::from_str(text).map_err(|e| TitaniumError::Slate(e.to_string()))
    }

    /// One profile book per league. Tables under the same league (e.g.
    /// "nba" and "basketball_nba") are merged; unknown keys are skipped.
    pub fn profile_books(&self) -> BTreeMap<League, ProfileBook> {
        let mut merged: BTreeMap<League, BTreeMap<String, TeamProfile>> = BTreeMap::new();
        for (key, table) in &self.profiles {
            match key.parse::<League>() {
                Ok(league) => merged
                    .entry(league)
                    .or_default()
                    .extend(table.iter().map(|(k, v)| (k.clone(), v.clone()))),
                Err(e) => warn!(key = %key, error = %e, "Skipping profile table"),
            }
        }
        merged
            .into_iter()
            .map(|(league, table)| (league, ProfileBook::new(table)))
            .collect()
    }
}

/// Parse a JSON number or numeric string ("+150", "-4.5").
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('+').parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
