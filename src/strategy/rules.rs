//! Rule pipeline.
//!
//! An ordered, short-circuiting chain of named filters applied to each
//! outcome. Every rule is a pure function of the outcome, its event and
//! the resolved context; the first failing verdict is terminal and its
//! reason is preserved verbatim for the rejected view.

use super::edge::Projection;
use super::league::{DirectionalPolicy, FavoriteSource, LeagueRules, ShieldMode};
use crate::types::{BetCategory, Event, FilterVerdict, Outcome, Side, TeamProfile};

/// Everything a rule may consult besides the outcome and event.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub rules: &'a LeagueRules,
    pub ban_list: &'a [String],
    /// Resolved profiles (league-average substitutes already applied).
    pub home: Option<&'a TeamProfile>,
    pub away: Option<&'a TeamProfile>,
    pub projection: Option<Projection>,
}

impl<'a> RuleContext<'a> {
    fn profile(&self, side: Side) -> Option<&'a TeamProfile> {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    /// The side the directional check compares against.
    pub fn favored_side(&self, event: &Event) -> Option<Side> {
        match self.rules.directional.source {
            FavoriteSource::ProjectedMargin => self.projection.map(|p| p.favored),
            FavoriteSource::Market => event.favorite.map(|f| f.side),
            FavoriteSource::Off => None,
        }
    }
}

/// The per-outcome rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    HardBan,
    OddsCollar,
    BlowoutShield,
    Directional,
    Fundamentals,
    RoadFavoriteTax,
}

impl Rule {
    /// Evaluation order. `CandidatePipeline` applies the hard ban once per
    /// event before the gauntlet, so inside it `HardBan` only guards
    /// direct callers.
    pub const ORDER: [Rule; 6] = [
        Rule::HardBan,
        Rule::OddsCollar,
        Rule::BlowoutShield,
        Rule::Directional,
        Rule::Fundamentals,
        Rule::RoadFavoriteTax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::HardBan => "HARD BAN",
            Rule::OddsCollar => "ODDS COLLAR",
            Rule::BlowoutShield => "BLOWOUT SHIELD",
            Rule::Directional => "DIRECTIONAL",
            Rule::Fundamentals => "FUNDAMENTALS",
            Rule::RoadFavoriteTax => "ROAD FAVORITE TAX",
        }
    }

    pub fn evaluate(&self, outcome: &Outcome, event: &Event, ctx: &RuleContext<'_>) -> FilterVerdict {
        match self {
            Rule::HardBan => check_bans(event, ctx.ban_list),
            Rule::OddsCollar => odds_collar(outcome, ctx),
            Rule::BlowoutShield => blowout_shield(outcome, ctx),
            Rule::Directional => directional(outcome, event, ctx),
            Rule::Fundamentals => fundamentals(outcome, ctx),
            Rule::RoadFavoriteTax => road_favorite_tax(outcome, event),
        }
    }
}

/// Run every rule in order. Returns the passing verdicts, or the first
/// failing one.
pub fn run_gauntlet(
    outcome: &Outcome,
    event: &Event,
    ctx: &RuleContext<'_>,
) -> Result<Vec<FilterVerdict>, FilterVerdict> {
    let mut passed = Vec::with_capacity(Rule::ORDER.len());
    for rule in Rule::ORDER {
        let verdict = rule.evaluate(outcome, event, ctx);
        if !verdict.passed {
            return Err(verdict);
        }
        passed.push(verdict);
    }
    Ok(passed)
}

/// Event-scoped ban check: case-insensitive substring on either team.
pub fn check_bans(event: &Event, ban_list: &[String]) -> FilterVerdict {
    let home = event.home.to_lowercase();
    let away = event.away.to_lowercase();
    for ban in ban_list {
        let needle = ban.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if home.contains(&needle) || away.contains(&needle) {
            return FilterVerdict::fail(Rule::HardBan.name(), format!("HARD BAN ({})", ban.trim()));
        }
    }
    FilterVerdict::pass(Rule::HardBan.name(), "Clean")
}

fn odds_collar(outcome: &Outcome, ctx: &RuleContext<'_>) -> FilterVerdict {
    let name = Rule::OddsCollar.name();
    let Some(price) = outcome.price else {
        return FilterVerdict::pass(name, "No price quoted (benefit of the doubt)");
    };
    let collar = ctx.rules.collars.for_category(outcome.category);
    if collar.contains(price) {
        FilterVerdict::pass(name, "Collar OK")
    } else {
        FilterVerdict::fail(
            name,
            format!("ODDS COLLAR ({price} outside {}..{:+})", collar.min, collar.max),
        )
    }
}

fn blowout_shield(outcome: &Outcome, ctx: &RuleContext<'_>) -> FilterVerdict {
    let name = Rule::BlowoutShield.name();
    let shield = &ctx.rules.shield;
    let (ceiling, label) = match outcome.category {
        BetCategory::Spread => (shield.spread_ceiling, "Spread"),
        BetCategory::Total => (shield.total_ceiling, "Total"),
        _ => (None, ""),
    };
    let (Some(ceiling), Some(line)) = (ceiling, outcome.line) else {
        return FilterVerdict::pass(name, "Safe");
    };
    if line.abs() <= ceiling {
        return FilterVerdict::pass(name, "Safe");
    }
    match shield.mode {
        ShieldMode::Reject => {
            FilterVerdict::fail(name, format!("BLOWOUT RISK ({label} {line:.1} > {ceiling:.1})"))
        }
        ShieldMode::Annotate => {
            FilterVerdict::flag(name, format!("BLOWOUT WATCH ({label} {line:.1} > {ceiling:.1})"))
        }
    }
}

/// True when a side outcome backs anything but the favored side.
pub fn directional_mismatch(outcome: &Outcome, event: &Event, ctx: &RuleContext<'_>) -> bool {
    if !matches!(outcome.category, BetCategory::Spread | BetCategory::Moneyline) {
        return false;
    }
    match ctx.favored_side(event) {
        Some(favored) => outcome.selection.and_then(|s| s.side()) != Some(favored),
        None => false,
    }
}

fn directional(outcome: &Outcome, event: &Event, ctx: &RuleContext<'_>) -> FilterVerdict {
    let name = Rule::Directional.name();
    if !matches!(outcome.category, BetCategory::Spread | BetCategory::Moneyline) {
        return FilterVerdict::pass(name, "Not a side market");
    }
    let Some(favored) = ctx.favored_side(event) else {
        return FilterVerdict::pass(name, "No favorite computed");
    };
    if !directional_mismatch(outcome, event, ctx) {
        return FilterVerdict::pass(name, format!("Backs favorite {}", event.team(favored)));
    }
    match ctx.rules.directional.policy {
        DirectionalPolicy::Reject => FilterVerdict::fail(
            name,
            format!("DIRECTIONAL MISMATCH ({} favored)", event.team(favored)),
        ),
        DirectionalPolicy::Annotate => FilterVerdict::flag(
            name,
            format!("DIRECTIONAL DOWNGRADE ({} favored)", event.team(favored)),
        ),
    }
}

fn fundamentals(outcome: &Outcome, ctx: &RuleContext<'_>) -> FilterVerdict {
    let name = Rule::Fundamentals.name();
    let Some(gate) = ctx.rules.fundamentals else {
        return FilterVerdict::pass(name, "Not gated");
    };
    if outcome.category != BetCategory::Spread {
        return FilterVerdict::pass(name, "Not gated");
    }
    let Some(line) = outcome.line.map(f64::abs) else {
        return FilterVerdict::pass(name, "Not gated");
    };
    if line < gate.band_min || line > gate.band_max {
        return FilterVerdict::pass(name, "Outside closer band");
    }
    let Some(profile) = outcome.selection.and_then(|s| s.side()).and_then(|s| ctx.profile(s)) else {
        return FilterVerdict::pass(name, "No metrics");
    };

    if let Some(ft) = profile.free_throw_pct {
        if ft < gate.min_free_throw_pct {
            return FilterVerdict::fail(
                name,
                format!("FUNDAMENTALS (FT% {ft:.1} < {:.1})", gate.min_free_throw_pct),
            );
        }
    }
    if let Some(tov) = profile.turnover_pct {
        if tov > gate.max_turnover_pct {
            return FilterVerdict::fail(
                name,
                format!("FUNDAMENTALS (TOV% {tov:.1} > {:.1})", gate.max_turnover_pct),
            );
        }
    }
    FilterVerdict::pass(name, "Closer fundamentals OK")
}

fn road_favorite_tax(outcome: &Outcome, event: &Event) -> FilterVerdict {
    let name = Rule::RoadFavoriteTax.name();
    let backs_away = outcome.selection.and_then(|s| s.side()) == Some(Side::Away);
    let away_favored = event.favorite.map(|f| f.side) == Some(Side::Away);
    if !matches!(outcome.category, BetCategory::Spread | BetCategory::Moneyline)
        || !backs_away
        || !away_favored
    {
        return FilterVerdict::pass(name, "Rest OK");
    }

    let ctx = event.context(Side::Away);
    if ctx.rest_days == Some(0) {
        return FilterVerdict::fail(name, "ROAD FAVORITE TAX (zero rest)");
    }
    if let Some(record) = ctx.record {
        if record.win_pct().is_some_and(|p| p < 0.5) {
            return FilterVerdict::flag(name, format!("SUB-.500 ROAD FAVORITE ({record})"));
        }
    }
    FilterVerdict::pass(name, "Rest OK")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
