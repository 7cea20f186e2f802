//! Candidate pipeline: rules, edge scoring, conflict resolution and
//! diversity selection over normalized events.

pub mod diversity;
pub mod edge;
pub mod guillotine;
pub mod league;
pub mod rules;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::data::profiles::ProfileBook;
use crate::types::{Candidate, Event, FilterVerdict, League, Ledger, Rejection};
use edge::{project_margin, EdgeScorer, ScoringInputs};
use league::{LeagueRules, MissingProfilePolicy, PipelineConfig};
use rules::{check_bans, directional_mismatch, run_gauntlet, RuleContext};

pub const PROFILE_GATE: &str = "PROFILE GATE";

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

/// Everything one league run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun<'a> {
    pub ledger: Ledger<'a>,
    /// Every outcome that did not make it past the conflict resolver,
    /// with the verdict that stopped it.
    pub rejected: Vec<Rejection<'a>>,
    pub events_seen: usize,
    pub outcomes_seen: usize,
}

impl<'a> PipelineRun<'a> {
    /// Rejections whose reason contains `needle` (case-insensitive). An
    /// empty needle matches everything.
    pub fn rejected_matching(&self, needle: &str) -> Vec<&Rejection<'a>> {
        let needle = needle.to_lowercase();
        self.rejected
            .iter()
            .filter(|r| r.verdict.reason.to_lowercase().contains(&needle))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Normalized events in, one ledger per league out.
///
/// Construct once from a `PipelineConfig`; `run` is a pure function of its
/// inputs, so repeated runs over the same slate yield the same ledger.
pub struct CandidatePipeline {
    config: PipelineConfig,
}

impl CandidatePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every league present in `events`, in league order.
    pub fn run_slate<'a>(
        &self,
        events: &'a [Event],
        books: &BTreeMap<League, ProfileBook>,
    ) -> Vec<PipelineRun<'a>> {
        let empty = ProfileBook::default();
        let leagues: BTreeSet<League> = events.iter().map(|e| e.league).collect();
        leagues
            .into_iter()
            .map(|league| self.run(league, events, books.get(&league).unwrap_or(&empty)))
            .collect()
    }

    /// Run one league. Events from other leagues are ignored.
    ///
    /// Steps:
    /// 1. Event gates: hard ban, then profile coverage.
    /// 2. Per-outcome rule gauntlet.
    /// 3. Edge scoring.
    /// 4. Conflict resolution per event.
    /// 5. Diversity draft into the ledger.
    pub fn run<'a>(&self, league: League, events: &'a [Event], book: &ProfileBook) -> PipelineRun<'a> {
        let rules = self.config.rules_for(league);
        let scorer = EdgeScorer::new(&rules);

        let mut rejected: Vec<Rejection<'a>> = Vec::new();
        let mut candidates: Vec<Candidate<'a>> = Vec::new();
        let mut events_seen = 0;
        let mut outcomes_seen = 0;

        for event in events.iter().filter(|e| e.league == league) {
            events_seen += 1;
            outcomes_seen += event.outcomes.len();

            // Step 1 – event gates
            let ban = check_bans(event, &self.config.ban_list);
            if !ban.passed {
                reject_event(event, ban, &mut rejected);
                continue;
            }

            let home_found = book.resolve(&event.home);
            let away_found = book.resolve(&event.away);
            if let Some(gate) = profile_gate(&rules, event, home_found.is_some(), away_found.is_some()) {
                reject_event(event, gate, &mut rejected);
                continue;
            }
            let home = home_found.unwrap_or(&rules.neutral_profile);
            let away = away_found.unwrap_or(&rules.neutral_profile);
            let projection = rules
                .margin_model()
                .map(|m| project_margin(home, away, m.home_court_bonus));

            let ctx = RuleContext {
                rules: &rules,
                ban_list: &self.config.ban_list,
                home: Some(home),
                away: Some(away),
                projection,
            };

            for outcome in &event.outcomes {
                // Step 2 – rule gauntlet
                let verdicts = match run_gauntlet(outcome, event, &ctx) {
                    Ok(v) => v,
                    Err(verdict) => {
                        debug!(
                            event_id = %event.id,
                            outcome = %outcome,
                            rule = verdict.rule,
                            reason = %verdict.reason,
                            "Outcome rejected"
                        );
                        rejected.push(Rejection { event, outcome: Some(outcome), verdict });
                        continue;
                    }
                };

                // Step 3 – scoring
                let inputs = ScoringInputs {
                    home,
                    away,
                    projection,
                    directional_mismatch: directional_mismatch(outcome, event, &ctx),
                };
                match scorer.score(outcome, event, &inputs) {
                    Ok(scored) => {
                        let annotations: Vec<FilterVerdict> =
                            verdicts.into_iter().filter(|v| v.flagged).collect();
                        candidates.push(Candidate {
                            event,
                            outcome,
                            score: scored.score,
                            directive: compose_directive(&scored.directive, &annotations),
                            annotations,
                        });
                    }
                    Err(verdict) => {
                        rejected.push(Rejection { event, outcome: Some(outcome), verdict });
                    }
                }
            }
        }

        let scored = candidates.len();

        // Step 4 – guillotine
        let (survivors, removed) = guillotine::resolve(candidates, rules.max_per_event);
        let guillotined = removed.len();
        rejected.extend(removed);

        // Step 5 – diversity draft
        let entries = diversity::select(survivors, &rules.buckets, rules.ledger_limit);
        let ledger = Ledger::new(league, rules.ledger_limit, entries);

        info!(
            league = %league,
            run_id = %ledger.run_id(),
            events = events_seen,
            outcomes = outcomes_seen,
            scored,
            guillotined,
            rejected = rejected.len(),
            selected = ledger.len(),
            limit = rules.ledger_limit,
            "Pipeline run complete"
        );

        PipelineRun {
            ledger,
            rejected,
            events_seen,
            outcomes_seen,
        }
    }
}

/// Profile coverage gate. Only leagues ranking sides with the margin
/// model care, and only when both sides are missing.
fn profile_gate(rules: &LeagueRules, event: &Event, home: bool, away: bool) -> Option<FilterVerdict> {
    if rules.margin_model().is_none() || home || away {
        return None;
    }
    match rules.missing_profiles {
        MissingProfilePolicy::Reject => Some(FilterVerdict::fail(
            PROFILE_GATE,
            format!("NO TEAM PROFILES ({} / {})", event.away, event.home),
        )),
        MissingProfilePolicy::LeagueAverage => None,
    }
}

/// Reject every outcome of an event with the same verdict. Events with no
/// outcomes still leave one record behind.
fn reject_event<'a>(event: &'a Event, verdict: FilterVerdict, rejected: &mut Vec<Rejection<'a>>) {
    debug!(
        event_id = %event.id,
        matchup = %event.matchup(),
        rule = verdict.rule,
        reason = %verdict.reason,
        "Event rejected"
    );
    if event.outcomes.is_empty() {
        rejected.push(Rejection { event, outcome: None, verdict });
        return;
    }
    for outcome in &event.outcomes {
        rejected.push(Rejection {
            event,
            outcome: Some(outcome),
            verdict: verdict.clone(),
        });
    }
}

fn compose_directive(scored: &str, annotations: &[FilterVerdict]) -> String {
    let mut directive = scored.to_string();
    for a in annotations {
        directive.push_str(" | ");
        directive.push_str(&a.reason);
    }
    directive
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
