//! Quote normalizer.
//!
//! Converts raw per-bookmaker market payloads into canonical `Outcome`
//! records for exactly one designated bookmaker, and derives the
//! structured market favorite for each event. Malformed outcomes are
//! dropped (logged at debug level); siblings keep flowing.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{parse_number, RawBookmaker, RawEvent, RawMarket, RawOutcome};
use crate::types::{
    BetCategory, Event, League, MarketFavorite, Outcome, Record, Selection, Side, TeamContext,
};

// ---------------------------------------------------------------------------
// Market keys
// ---------------------------------------------------------------------------

/// Map a feed market key to a bet category. Unknown keys are skipped.
pub fn category_for(market_key: &str) -> Option<BetCategory> {
    let key = market_key.trim().to_lowercase();
    if key == "spreads" || key.starts_with("spreads_") || key == "alternate_spreads" {
        Some(BetCategory::Spread)
    } else if key == "h2h" || key.starts_with("h2h_") {
        Some(BetCategory::Moneyline)
    } else if key == "totals" || key.starts_with("totals_") || key == "alternate_totals" {
        Some(BetCategory::Total)
    } else if key.starts_with("player_") {
        Some(BetCategory::PlayerProp)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turns raw feed events into canonical events with owned outcomes.
#[derive(Debug, Clone)]
pub struct QuoteNormalizer {
    preferred_bookmaker: String,
}

impl QuoteNormalizer {
    pub fn new(preferred_bookmaker: impl Into<String>) -> Self {
        Self {
            preferred_bookmaker: preferred_bookmaker.into(),
        }
    }

    /// Normalize a batch of raw events. Events with an unknown league, no
    /// id or a missing competitor are skipped.
    pub fn normalize_all(&self, raw: &[RawEvent]) -> Vec<Event> {
        raw.iter().filter_map(|r| self.normalize_event(r)).collect()
    }

    /// Normalize one raw event.
    pub fn normalize_event(&self, raw: &RawEvent) -> Option<Event> {
        let id = raw.id.trim();
        if id.is_empty() {
            warn!(home = %raw.home_team, away = %raw.away_team, "Skipping event with no id");
            return None;
        }

        let league: League = match raw.league.parse() {
            Ok(l) => l,
            Err(e) => {
                warn!(event_id = %id, error = %e, "Skipping event");
                return None;
            }
        };

        let home = raw.home_team.trim();
        let away = raw.away_team.trim();
        if home.is_empty() || away.is_empty() {
            warn!(event_id = %id, "Skipping event with missing competitor");
            return None;
        }

        let start = raw.commence_time.as_deref().and_then(|t| {
            DateTime::parse_from_rfc3339(t.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| debug!(event_id = %id, error = %e, "Unparseable start time"))
                .ok()
        });

        let outcomes = self.normalize_outcomes(id, home, away, &raw.bookmakers);
        let favorite = market_favorite(&outcomes);

        debug!(
            event_id = %id,
            league = %league,
            outcomes = outcomes.len(),
            favorite = ?favorite,
            "Event normalized"
        );

        Some(Event {
            league,
            id: id.to_string(),
            home: home.to_string(),
            away: away.to_string(),
            start,
            favorite,
            home_context: TeamContext {
                record: raw.home_record.as_deref().and_then(Record::parse),
                rest_days: raw.home_rest_days,
            },
            away_context: TeamContext {
                record: raw.away_record.as_deref().and_then(Record::parse),
                rest_days: raw.away_rest_days,
            },
            outcomes,
        })
    }

    /// Flatten the designated bookmaker's markets into outcomes.
    /// No bookmaker entry yields an empty sequence.
    pub fn normalize_outcomes(
        &self,
        event_id: &str,
        home: &str,
        away: &str,
        bookmakers: &[RawBookmaker],
    ) -> Vec<Outcome> {
        let Some(book) = self.designated_bookmaker(bookmakers) else {
            debug!(event_id, "No bookmaker data");
            return Vec::new();
        };
        let book_label = if book.title.trim().is_empty() {
            book.key.clone()
        } else {
            book.title.clone()
        };

        let mut outcomes = Vec::new();
        for market in &book.markets {
            let Some(category) = category_for(&market.key) else {
                debug!(event_id, market = %market.key, "Skipping unknown market");
                continue;
            };
            for raw in &market.outcomes {
                match normalize_outcome(event_id, home, away, &book_label, market, category, raw) {
                    Some(o) => outcomes.push(o),
                    None => debug!(
                        event_id,
                        market = %market.key,
                        name = ?raw.name,
                        "Dropping malformed outcome"
                    ),
                }
            }
        }
        outcomes
    }

    /// Preferred bookmaker (key or title, case-insensitive) if present,
    /// else the first available.
    pub fn designated_bookmaker<'a>(&self, bookmakers: &'a [RawBookmaker]) -> Option<&'a RawBookmaker> {
        let preferred = self.preferred_bookmaker.trim();
        bookmakers
            .iter()
            .find(|b| {
                !preferred.is_empty()
                    && (b.key.eq_ignore_ascii_case(preferred) || b.title.eq_ignore_ascii_case(preferred))
            })
            .or_else(|| bookmakers.first())
    }
}

fn normalize_outcome(
    event_id: &str,
    home: &str,
    away: &str,
    bookmaker: &str,
    market: &RawMarket,
    category: BetCategory,
    raw: &RawOutcome,
) -> Option<Outcome> {
    let name = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;

    // Absent price is allowed; a present but unparseable one is not.
    let price = match &raw.price {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => Some(american_price(parse_number(v)?)?),
    };

    let line = match &raw.point {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => Some(parse_number(v)?),
    };
    if line.is_none() && category != BetCategory::Moneyline {
        return None;
    }

    let (selection, subject) = match category {
        BetCategory::Total => (Some(over_under(name)?), None),
        BetCategory::PlayerProp => {
            let player = raw
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())?;
            (over_under(name), Some(player.to_string()))
        }
        BetCategory::Spread | BetCategory::Moneyline => {
            let selection = if name.eq_ignore_ascii_case("draw") || name.eq_ignore_ascii_case("tie") {
                Selection::Draw
            } else if name.eq_ignore_ascii_case(home) {
                Selection::Home
            } else if name.eq_ignore_ascii_case(away) {
                Selection::Away
            } else {
                return None;
            };
            (Some(selection), None)
        }
    };

    Some(Outcome {
        event_id: event_id.to_string(),
        category,
        market_key: market.key.trim().to_lowercase(),
        target: name.to_string(),
        selection,
        subject,
        line: if category == BetCategory::Moneyline { None } else { line },
        price,
        bookmaker: bookmaker.to_string(),
    })
}

/// Round to an integer American price; |price| < 100 is not American odds.
fn american_price(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.abs() < 100.0 || rounded.abs() > 100_000.0 {
        return None;
    }
    Some(rounded as i32)
}

fn over_under(name: &str) -> Option<Selection> {
    if name.eq_ignore_ascii_case("over") {
        Some(Selection::Over)
    } else if name.eq_ignore_ascii_case("under") {
        Some(Selection::Under)
    } else {
        None
    }
}

/// Structured favorite: the negative spread side, else the cheaper
/// moneyline side (line 0.0).
pub fn market_favorite(outcomes: &[Outcome]) -> Option<MarketFavorite> {
    let from_spread = outcomes
        .iter()
        .filter(|o| o.category == BetCategory::Spread)
        .find_map(|o| {
            let side = o.selection.and_then(|s| s.side())?;
            let line = o.line?;
            (line < 0.0).then_some(MarketFavorite { side, line })
        });
    if from_spread.is_some() {
        return from_spread;
    }

    let mut best: Option<(Side, i32)> = None;
    for o in outcomes.iter().filter(|o| o.category == BetCategory::Moneyline) {
        let (Some(side), Some(price)) = (o.selection.and_then(|s| s.side()), o.price) else {
            continue;
        };
        if best.map_or(true, |(_, p)| price < p) {
            best = Some((side, price));
        }
    }
    best.map(|(side, _)| MarketFavorite { side, line: 0.0 })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
