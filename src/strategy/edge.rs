//! Edge scoring.
//!
//! Produces the rank score (`Sort_Val`) and audit directive for outcomes
//! that survived the rule pipeline. Three model families, chosen per
//! league and category by the rule table:
//!
//! - projected margin (spreads/moneylines, profile-driven)
//! - pace (totals, profile-driven)
//! - tiered lookup (line-magnitude or price buckets, price tie-break)
//!
//! All models are pure: identical inputs always yield identical scores.

use tracing::debug;

use super::league::{LeagueRules, MarginModel, PaceModel, SideModel, TierKey, TieredModel, TotalModel};
use crate::types::{BetCategory, Event, FilterVerdict, Outcome, Selection, Side, TeamProfile};

/// Rule name used for scorer exclusions in the rejected view.
pub const EDGE_SCORER: &str = "EDGE SCORER";

/// Price assumed when the book quoted no juice.
const STANDARD_JUICE: i32 = -110;

// ---------------------------------------------------------------------------
// Projected margin
// ---------------------------------------------------------------------------

/// Output of the projected-margin model for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub home_projected: f64,
    pub away_projected: f64,
    /// Positive favors home.
    pub margin: f64,
    pub favored: Side,
}

/// `home = net * pace/100 + bonus`, `away = net * pace/100`,
/// `margin = home - away`.
pub fn project_margin(home: &TeamProfile, away: &TeamProfile, home_court_bonus: f64) -> Projection {
    let home_projected = home.net_rating * (home.pace / 100.0) + home_court_bonus;
    let away_projected = away.net_rating * (away.pace / 100.0);
    let margin = home_projected - away_projected;
    Projection {
        home_projected,
        away_projected,
        margin,
        favored: if margin >= 0.0 { Side::Home } else { Side::Away },
    }
}

/// Profit per unit staked at an American price.
pub fn payout(price: i32) -> f64 {
    if price > 0 {
        f64::from(price) / 100.0
    } else {
        100.0 / f64::from(price.unsigned_abs().max(1))
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Rank score plus its human-readable justification.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeScore {
    pub score: f64,
    pub directive: String,
}

/// Resolved inputs for scoring one outcome.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'p> {
    pub home: &'p TeamProfile,
    pub away: &'p TeamProfile,
    pub projection: Option<Projection>,
    /// Outcome backs the non-favored side under an annotate policy.
    pub directional_mismatch: bool,
}

/// League-parameterized scorer.
pub struct EdgeScorer<'r> {
    rules: &'r LeagueRules,
}

impl<'r> EdgeScorer<'r> {
    pub fn new(rules: &'r LeagueRules) -> Self {
        Self { rules }
    }

    /// Score an outcome, or exclude it with a failing verdict.
    pub fn score(
        &self,
        outcome: &Outcome,
        event: &Event,
        inputs: &ScoringInputs<'_>,
    ) -> Result<EdgeScore, FilterVerdict> {
        let penalty = if inputs.directional_mismatch {
            self.rules.directional.penalty
        } else {
            0.0
        };

        let scored = match outcome.category {
            BetCategory::Spread | BetCategory::Moneyline => match &self.rules.side_model {
                SideModel::ProjectedMargin(model) => {
                    let projection = inputs.projection.unwrap_or_else(|| {
                        project_margin(inputs.home, inputs.away, model.home_court_bonus)
                    });
                    score_margin(model, &projection, outcome, event, penalty)
                }
                SideModel::Tiered(model) => Ok(score_tiered(model, outcome, penalty)),
            },
            BetCategory::Total => match &self.rules.total_model {
                TotalModel::Pace(model) => score_pace(model, outcome, inputs.home, inputs.away),
                TotalModel::Tiered(model) => Ok(score_tiered(model, outcome, penalty)),
            },
            BetCategory::PlayerProp => Ok(score_tiered(&self.rules.prop_model, outcome, penalty)),
        };

        match &scored {
            Ok(s) => debug!(
                event_id = %event.id,
                outcome = %outcome,
                score = format!("{:.2}", s.score),
                "Outcome scored"
            ),
            Err(v) => debug!(
                event_id = %event.id,
                outcome = %outcome,
                reason = %v.reason,
                "Outcome excluded by scorer"
            ),
        }
        scored
    }
}

fn score_margin(
    model: &MarginModel,
    projection: &Projection,
    outcome: &Outcome,
    event: &Event,
    penalty: f64,
) -> Result<EdgeScore, FilterVerdict> {
    let Some(side) = outcome.selection.and_then(|s| s.side()) else {
        return Err(FilterVerdict::fail(
            EDGE_SCORER,
            format!("NO MARGIN MODEL FOR {}", outcome.target.to_uppercase()),
        ));
    };

    let margin = projection.margin.abs();
    let line = outcome.line.map(f64::abs).unwrap_or(0.0);
    let edge = if side == projection.favored {
        margin - line
    } else if outcome.category == BetCategory::Spread {
        line - margin
    } else {
        -margin
    };

    if edge < model.min_edge {
        return Err(FilterVerdict::fail(
            EDGE_SCORER,
            format!("EDGE BELOW FLOOR ({edge:.2} < {:.2})", model.min_edge),
        ));
    }

    let score = model.base + model.slope * edge - penalty;
    let directive = format!(
        "Model margin {:.1} to {} vs line {:.1}: edge {:+.2}",
        margin,
        event.team(projection.favored),
        line,
        edge,
    );
    Ok(EdgeScore { score, directive })
}

fn score_pace(
    model: &PaceModel,
    outcome: &Outcome,
    home: &TeamProfile,
    away: &TeamProfile,
) -> Result<EdgeScore, FilterVerdict> {
    let combined = home.pace + away.pace;
    let (favored, distance) = if combined > model.high_total {
        (Selection::Over, combined - model.high_total)
    } else if combined < model.low_total {
        (Selection::Under, model.low_total - combined)
    } else {
        return Err(FilterVerdict::fail(
            EDGE_SCORER,
            format!(
                "PACE NEUTRAL ({combined:.1} within {:.1}..{:.1})",
                model.low_total, model.high_total
            ),
        ));
    };

    if outcome.selection != Some(favored) {
        return Err(FilterVerdict::fail(
            EDGE_SCORER,
            format!("PACE FAVORS {} ({combined:.1})", favored_label(favored)),
        ));
    }

    Ok(EdgeScore {
        score: model.base + model.slope * distance,
        directive: format!(
            "Combined pace {combined:.1} favors {} by {distance:.1}",
            favored_label(favored)
        ),
    })
}

fn favored_label(selection: Selection) -> &'static str {
    match selection {
        Selection::Over => "OVER",
        Selection::Under => "UNDER",
        _ => "SIDE",
    }
}

fn score_tiered(model: &TieredModel, outcome: &Outcome, penalty: f64) -> EdgeScore {
    let price = outcome.price.unwrap_or(STANDARD_JUICE);
    let (key_value, key_label) = match model.key {
        TierKey::LineMagnitude => (outcome.line.map(f64::abs).unwrap_or(0.0), "line"),
        TierKey::Price => (f64::from(price), "price"),
    };

    let tier = model
        .tiers
        .iter()
        .find(|t| key_value >= t.min && key_value <= t.max);
    let base = tier.map(|t| t.score).unwrap_or(model.fallback);
    let score = base + model.price_weight * payout(price) - penalty;

    let directive = match tier {
        Some(t) => format!(
            "Tier {key_label} {key_value:.1} in {:.1}..{:.1} (base {base:.0})",
            t.min, t.max
        ),
        None => format!("No tier for {key_label} {key_value:.1} (base {base:.0})"),
    };
    EdgeScore { score, directive }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
