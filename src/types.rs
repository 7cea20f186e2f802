//! Shared types for the TITANIUM pipeline.
//!
//! These types form the data model used across all modules. Events own
//! their outcomes; candidates and rejections borrow from them so every
//! pipeline stage is a pure transformation over resident records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Supported leagues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum League {
    Nba,
    Nfl,
    Ncaab,
    Nhl,
    Soccer,
}

impl League {
    /// All known leagues (useful for iteration).
    pub const ALL: &'static [League] = &[
        League::Nba,
        League::Nfl,
        League::Ncaab,
        League::Nhl,
        League::Soccer,
    ];
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            League::Nba => write!(f, "NBA"),
            League::Nfl => write!(f, "NFL"),
            League::Ncaab => write!(f, "NCAAB"),
            League::Nhl => write!(f, "NHL"),
            League::Soccer => write!(f, "SOCCER"),
        }
    }
}

/// Parse a league tag (case-insensitive). Accepts bare codes ("nba") and
/// feed sport keys ("basketball_nba", "soccer_epl").
impl std::str::FromStr for League {
    type Err = TitaniumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "nba" | "basketball_nba" => Ok(League::Nba),
            "nfl" | "americanfootball_nfl" => Ok(League::Nfl),
            "ncaab" | "cbb" | "basketball_ncaab" => Ok(League::Ncaab),
            "nhl" | "icehockey_nhl" => Ok(League::Nhl),
            "soccer" | "football" => Ok(League::Soccer),
            k if k.starts_with("soccer_") => Ok(League::Soccer),
            _ => Err(TitaniumError::UnknownLeague(s.to_string())),
        }
    }
}

/// Bet category of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BetCategory {
    Spread,
    Moneyline,
    Total,
    PlayerProp,
}

impl fmt::Display for BetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetCategory::Spread => write!(f, "SPREAD"),
            BetCategory::Moneyline => write!(f, "MONEYLINE"),
            BetCategory::Total => write!(f, "TOTAL"),
            BetCategory::PlayerProp => write!(f, "PLAYER PROP"),
        }
    }
}

/// Home or away competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "HOME"),
            Side::Away => write!(f, "AWAY"),
        }
    }
}

/// What an outcome backs, resolved by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    Home,
    Away,
    Draw,
    Over,
    Under,
}

impl Selection {
    /// The competitor this selection backs, if it backs one.
    pub fn side(&self) -> Option<Side> {
        match self {
            Selection::Home => Some(Side::Home),
            Selection::Away => Some(Side::Away),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Event & Outcome
// ---------------------------------------------------------------------------

/// Market-implied favorite, produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketFavorite {
    pub side: Side,
    /// Quoted spread of the favorite (negative), or 0.0 when derived
    /// from moneyline prices.
    pub line: f64,
}

/// Win/loss record parsed from a "20-25" style summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    /// Parse "W-L". Returns None for anything malformed.
    pub fn parse(summary: &str) -> Option<Self> {
        let (w, l) = summary.trim().split_once('-')?;
        Some(Self {
            wins: w.trim().parse().ok()?,
            losses: l.trim().parse().ok()?,
        })
    }

    /// Winning percentage, None when no games have been played.
    pub fn win_pct(&self) -> Option<f64> {
        let total = self.wins + self.losses;
        if total == 0 {
            None
        } else {
            Some(f64::from(self.wins) / f64::from(total))
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wins, self.losses)
    }
}

/// Situational context for one competitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamContext {
    pub record: Option<Record>,
    pub rest_days: Option<u32>,
}

/// One real-world game. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub league: League,
    pub id: String,
    pub home: String,
    pub away: String,
    pub start: Option<DateTime<Utc>>,
    pub favorite: Option<MarketFavorite>,
    pub home_context: TeamContext,
    pub away_context: TeamContext,
    pub outcomes: Vec<Outcome>,
}

impl Event {
    /// "Away @ Home".
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away, self.home)
    }

    /// Team name for a side.
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn context(&self, side: Side) -> &TeamContext {
        match side {
            Side::Home => &self.home_context,
            Side::Away => &self.away_context,
        }
    }

    /// Scheduled start formatted for display.
    pub fn start_display(&self) -> String {
        match self.start {
            Some(t) => t.format("%a %b %d %H:%M UTC").to_string(),
            None => "TBD".to_string(),
        }
    }
}

/// One priced side of one bookmaker market for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub event_id: String,
    pub category: BetCategory,
    /// Raw feed market key, e.g. "spreads" or "player_points".
    pub market_key: String,
    /// Team name, player name, or "Over"/"Under".
    pub target: String,
    pub selection: Option<Selection>,
    /// Player name for props.
    pub subject: Option<String>,
    pub line: Option<f64>,
    /// American odds. None when the book did not quote juice.
    pub price: Option<i32>,
    pub bookmaker: String,
}

impl Outcome {
    /// Uppercase label used for bucket matching and display,
    /// e.g. "SPREAD", "TOTAL OVER", "PLAYER PROP POINTS OVER".
    pub fn market_label(&self) -> String {
        match self.category {
            BetCategory::Total => match self.selection {
                Some(Selection::Over) => "TOTAL OVER".to_string(),
                Some(Selection::Under) => "TOTAL UNDER".to_string(),
                _ => "TOTAL".to_string(),
            },
            BetCategory::PlayerProp => {
                let stat = self
                    .market_key
                    .trim_start_matches("player_")
                    .replace('_', " ")
                    .to_uppercase();
                format!("PLAYER PROP {} {}", stat, self.target.to_uppercase())
            }
            other => other.to_string(),
        }
    }

    /// Display target: props include the player.
    pub fn target_display(&self) -> String {
        match &self.subject {
            Some(player) => format!("{player} {}", self.target),
            None => self.target.clone(),
        }
    }

    /// Line formatted for display ("-4.5", "+3.0", "O 221.5", "ML").
    pub fn line_display(&self) -> String {
        match (self.category, self.line) {
            (_, None) => "ML".to_string(),
            (BetCategory::Total, Some(l)) | (BetCategory::PlayerProp, Some(l)) => {
                match self.selection {
                    Some(Selection::Under) => format!("U {l:.1}"),
                    _ => format!("O {l:.1}"),
                }
            }
            (_, Some(l)) if l > 0.0 => format!("+{l:.1}"),
            (_, Some(l)) => format!("{l:.1}"),
        }
    }

    /// Price formatted with an explicit sign ("-110", "+135", "N/A").
    pub fn price_display(&self) -> String {
        match self.price {
            Some(p) if p > 0 => format!("+{p}"),
            Some(p) => p.to_string(),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} @ {}",
            self.bookmaker,
            self.market_label(),
            self.target_display(),
            self.line_display(),
            self.price_display(),
        )
    }
}

// ---------------------------------------------------------------------------
// Team profiles
// ---------------------------------------------------------------------------

/// Efficiency metrics for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    #[serde(default)]
    pub team: String,
    pub net_rating: f64,
    pub pace: f64,
    #[serde(default)]
    pub def_rating: f64,
    /// Free-throw percentage, percent units (e.g. 78.1).
    #[serde(default)]
    pub free_throw_pct: Option<f64>,
    /// Turnover percentage, percent units (e.g. 13.2).
    #[serde(default)]
    pub turnover_pct: Option<f64>,
}

impl TeamProfile {
    /// League-average profile with no optional metrics.
    pub fn neutral(pace: f64, def_rating: f64) -> Self {
        Self {
            team: "LEAGUE AVERAGE".to_string(),
            net_rating: 0.0,
            pace,
            def_rating,
            free_throw_pct: None,
            turnover_pct: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts, candidates, ledger
// ---------------------------------------------------------------------------

/// Outcome of one rule applied to one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterVerdict {
    pub rule: &'static str,
    pub passed: bool,
    pub reason: String,
    /// Passing verdict whose reason belongs in the audit directive.
    pub flagged: bool,
}

impl FilterVerdict {
    pub fn pass(rule: &'static str, reason: impl Into<String>) -> Self {
        Self { rule, passed: true, reason: reason.into(), flagged: false }
    }

    pub fn flag(rule: &'static str, reason: impl Into<String>) -> Self {
        Self { rule, passed: true, reason: reason.into(), flagged: true }
    }

    pub fn fail(rule: &'static str, reason: impl Into<String>) -> Self {
        Self { rule, passed: false, reason: reason.into(), flagged: false }
    }
}

impl fmt::Display for FilterVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{status} [{}] {}", self.rule, self.reason)
    }
}

/// An outcome that survived the full pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub event: &'a Event,
    pub outcome: &'a Outcome,
    /// Rank score (`Sort_Val`).
    pub score: f64,
    /// Human-readable justification (`Audit_Directive`).
    pub directive: String,
    /// Passing verdicts that carried a flag.
    pub annotations: Vec<FilterVerdict>,
}

impl<'a> Candidate<'a> {
    /// Owned, presentation-facing view.
    pub fn row(&self) -> LedgerRow {
        LedgerRow {
            league: self.event.league.to_string(),
            scheduled: self.event.start_display(),
            matchup: self.event.matchup(),
            category: self.outcome.market_label(),
            target: self.outcome.target_display(),
            line: self.outcome.line_display(),
            price: self.outcome.price_display(),
            bookmaker: self.outcome.bookmaker.clone(),
            directive: self.directive.clone(),
            score: self.score,
        }
    }
}

/// Flat row handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub league: String,
    pub scheduled: String,
    pub matchup: String,
    pub category: String,
    pub target: String,
    pub line: String,
    pub price: String,
    pub bookmaker: String,
    pub directive: String,
    pub score: f64,
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {:<22} {:<44} {:<24} {:<28} {:>8} {:>6} {:>7.2}  {}",
            self.league,
            self.scheduled,
            self.matchup,
            self.category,
            self.target,
            self.line,
            self.price,
            self.score,
            self.directive,
        )
    }
}

/// Final ordered selection for one league and one run.
#[derive(Debug, Clone)]
pub struct Ledger<'a> {
    run_id: Uuid,
    league: League,
    limit: usize,
    entries: Vec<Candidate<'a>>,
}

impl<'a> Ledger<'a> {
    pub fn new(league: League, limit: usize, entries: Vec<Candidate<'a>>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            league,
            limit,
            entries,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn league(&self) -> League {
        self.league
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[Candidate<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.entries.iter().map(Candidate::row).collect()
    }
}

/// A rejected outcome (or event, when it had no outcomes) and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection<'a> {
    pub event: &'a Event,
    pub outcome: Option<&'a Outcome>,
    pub verdict: FilterVerdict,
}

impl fmt::Display for Rejection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self
            .outcome
            .map(|o| format!("{} {}", o.market_label(), o.target_display()))
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{:<44} {:<40} {:<16} {}",
            self.event.matchup(),
            target,
            self.verdict.rule,
            self.verdict.reason,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TITANIUM.
#[derive(Debug, thiserror::Error)]
pub enum TitaniumError {
    #[error("Unknown league: {0}")]
    UnknownLeague(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Slate parse error: {0}")]
    Slate(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
