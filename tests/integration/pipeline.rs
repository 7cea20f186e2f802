//! Full pipeline properties over the fixture slate.

use std::collections::HashSet;

use crate::fixtures;
use titanium::strategy::diversity::{classify, Bucket};
use titanium::strategy::league::{DirectionalPolicy, PipelineConfig};
use titanium::strategy::CandidatePipeline;
use titanium::types::{BetCategory, League};

#[test]
fn test_normalizer_feeds_pipeline() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);

    // The cricket event is skipped.
    assert_eq!(events.len(), 8);

    let celtics = events.iter().find(|e| e.id == "nba-bos-mia").unwrap();
    assert_eq!(celtics.outcomes[0].bookmaker, "DraftKings");
    assert_eq!(celtics.outcomes[0].line, Some(-4.5));
    assert_eq!(celtics.start_display(), "Thu Jan 15 00:30 UTC");
}

#[test]
fn test_ledgers_per_league() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    let leagues: Vec<League> = runs.iter().map(|r| r.ledger.league()).collect();
    assert_eq!(leagues, vec![League::Nba, League::Nhl, League::Soccer]);

    let nba = &runs[0];
    let categories: Vec<String> = nba.ledger.rows().into_iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec!["SPREAD", "TOTAL OVER", "MONEYLINE", "PLAYER PROP POINTS OVER", "SPREAD", "MONEYLINE"]
    );
    let top = &nba.ledger.entries()[0];
    assert_eq!(top.outcome.target, "Boston Celtics");
    assert!(top.score > 89.0 && top.score < 90.0);
}

#[test]
fn test_ban_invariant() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let bans = config.ban_list.clone();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    for run in &runs {
        assert!(run.ledger.entries().iter().all(|c| !fixtures::banned(c.event, &bans)));
    }

    let nba = &runs[0];
    let banned: Vec<_> = nba.rejected.iter().filter(|r| r.event.id == "nba-mil-chi").collect();
    assert_eq!(banned.len(), 2);
    assert!(banned.iter().all(|r| r.verdict.reason == "HARD BAN (Milwaukee Bucks)"));
}

#[test]
fn test_collar_invariant() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let pipeline = CandidatePipeline::new(config);
    let runs = pipeline.run_slate(&events, &books);
    for run in &runs {
        let rules = pipeline.config().rules_for(run.ledger.league());
        for c in run.ledger.entries() {
            if let Some(price) = c.outcome.price {
                assert!(rules.collars.for_category(c.outcome.category).contains(price));
            }
        }
    }
    // -190 and +160 on the Celtics moneyline.
    assert_eq!(runs[0].rejected_matching("ODDS COLLAR").len(), 2);
}

#[test]
fn test_shield_invariant() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    let nba = &runs[0];
    assert!(nba
        .ledger
        .entries()
        .iter()
        .filter(|c| c.outcome.category == BetCategory::Spread)
        .all(|c| c.outcome.line.map_or(true, |l| l.abs() <= 10.5)));
    assert_eq!(nba.rejected_matching("blowout risk").len(), 2);
}

#[test]
fn test_idempotent_runs() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let pipeline = CandidatePipeline::new(config);
    let first = pipeline.run_slate(&events, &books);
    let second = pipeline.run_slate(&events, &books);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.ledger.rows(), b.ledger.rows());
        assert_eq!(a.rejected, b.rejected);
    }
}

#[test]
fn test_conflict_invariant() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    for run in &runs {
        let mut seen = HashSet::new();
        for c in run.ledger.entries() {
            if c.outcome.category == BetCategory::Moneyline {
                assert!(seen.insert(c.event.id.clone()), "two moneylines for {}", c.event.id);
            }
        }
    }

    // Arsenal and Chelsea both survive scoring; neither reaches the ledger.
    let soccer = runs.iter().find(|r| r.ledger.league() == League::Soccer).unwrap();
    let guillotined = soccer.rejected_matching("GUILLOTINE (2 MONEYLINE");
    assert_eq!(guillotined.len(), 2);
    assert_eq!(soccer.ledger.len(), 1);
    assert_eq!(soccer.ledger.rows()[0].category, "TOTAL OVER");
}

#[test]
fn test_duplicate_spread_suppressed() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    let dupes = runs[0].rejected_matching("DUPLICATE");
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].outcome.and_then(|o| o.line), Some(-2.0));
}

#[test]
fn test_diversity_bound() {
    let slate = fixtures::slate();
    let mut config = PipelineConfig::default();
    config.rules_mut(League::Nba).ledger_limit = 3;
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let pipeline = CandidatePipeline::new(config);
    let runs = pipeline.run_slate(&events, &books);
    let nba = &runs[0];
    assert_eq!(nba.ledger.len(), 3);

    let matchers = pipeline.config().rules_for(League::Nba).buckets;
    let buckets: HashSet<Bucket> = nba
        .ledger
        .entries()
        .iter()
        .filter_map(|c| classify(&c.outcome.market_label(), &matchers))
        .collect();
    assert!(buckets.len() >= 2);
    assert!(buckets.contains(&Bucket::Spread));
}

#[test]
fn test_rejected_view_reasons() {
    let slate = fixtures::slate();
    let config = PipelineConfig::default();
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    let nba = &runs[0];
    assert_eq!(nba.rejected_matching("NO TEAM PROFILES (Utah Jazz / Portland Trail Blazers)").len(), 2);
    assert!(!nba.rejected_matching("DIRECTIONAL MISMATCH").is_empty());
    assert_eq!(nba.rejected_matching("").len(), nba.rejected.len());

    let nhl = &runs[1];
    assert_eq!(nhl.rejected_matching("ROAD FAVORITE TAX (zero rest)").len(), 1);
    let avalanche = nhl
        .ledger
        .entries()
        .iter()
        .find(|c| c.outcome.target == "Colorado Avalanche")
        .unwrap();
    assert!(avalanche.directive.contains("SUB-.500 ROAD FAVORITE (18-22)"));
}

#[test]
fn test_annotate_policy_keeps_scores_deterministic() {
    let slate = fixtures::slate();
    let mut config = PipelineConfig::default();
    config.rules_mut(League::Nba).directional.policy = DirectionalPolicy::Annotate;
    let events = fixtures::events(&slate, &config);
    let books = fixtures::books(&slate);

    let runs = CandidatePipeline::new(config).run_slate(&events, &books);
    let nba = &runs[0];
    assert!(nba.rejected_matching("DIRECTIONAL MISMATCH").is_empty());
    for c in nba.ledger.entries() {
        assert!(c.score.is_finite());
    }
}
