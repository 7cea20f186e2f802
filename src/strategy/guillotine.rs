//! Conflict resolver ("guillotine").
//!
//! Runs per event over scored candidates, in three passes:
//! 1. exact duplicates are suppressed (first arrival wins)
//! 2. any bet category held by more than one candidate loses all of them
//! 3. the survivors are capped per event, highest scores first
//!
//! Every removal becomes a `GUILLOTINE` rejection.

use std::collections::{BTreeMap, HashSet};
use std::ptr;
use tracing::debug;

use crate::types::{BetCategory, Candidate, Event, FilterVerdict, Rejection};

pub const GUILLOTINE: &str = "GUILLOTINE";

/// Two candidates for one event contradict each other when they share a
/// bet category.
fn conflict_key(c: &Candidate<'_>) -> BetCategory {
    c.outcome.category
}

/// Exact duplicates: same category and target. Props also match on stat
/// market and player; alternate side and total lines do not.
fn duplicate_key(c: &Candidate<'_>) -> (BetCategory, String, String) {
    let scope = match c.outcome.category {
        BetCategory::PlayerProp => format!(
            "{}|{}",
            c.outcome.market_key,
            c.outcome.subject.as_deref().unwrap_or_default().to_lowercase()
        ),
        _ => String::new(),
    };
    (c.outcome.category, scope, c.outcome.target.to_lowercase())
}

fn reject<'a>(c: Candidate<'a>, reason: String) -> Rejection<'a> {
    debug!(event = %c.event.id, outcome = %c.outcome, reason = %reason, "Guillotine removal");
    Rejection {
        event: c.event,
        outcome: Some(c.outcome),
        verdict: FilterVerdict::fail(GUILLOTINE, reason),
    }
}

/// Resolve conflicts across a slate, one event at a time. Events are
/// grouped by identity, not by id, and keep their order of first arrival.
pub fn resolve<'a>(
    candidates: Vec<Candidate<'a>>,
    max_per_event: Option<usize>,
) -> (Vec<Candidate<'a>>, Vec<Rejection<'a>>) {
    let mut groups: Vec<(&'a Event, Vec<Candidate<'a>>)> = Vec::new();
    for c in candidates {
        match groups.iter().position(|(event, _)| ptr::eq(*event, c.event)) {
            Some(i) => groups[i].1.push(c),
            None => groups.push((c.event, vec![c])),
        }
    }

    let mut kept = Vec::new();
    let mut rejected = Vec::new();
    for (_, group) in groups {
        let (k, r) = resolve_event(group, max_per_event);
        kept.extend(k);
        rejected.extend(r);
    }
    (kept, rejected)
}

/// Resolve the candidates of a single event.
pub fn resolve_event<'a>(
    candidates: Vec<Candidate<'a>>,
    max_per_event: Option<usize>,
) -> (Vec<Candidate<'a>>, Vec<Rejection<'a>>) {
    let mut rejected = Vec::new();

    // Duplicates
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(candidates.len());
    for c in candidates {
        if seen.insert(duplicate_key(&c)) {
            unique.push(c);
        } else {
            let reason = format!("DUPLICATE ({} {})", c.outcome.market_label(), c.outcome.target_display());
            rejected.push(reject(c, reason));
        }
    }

    // Contradictions
    let mut counts: BTreeMap<BetCategory, usize> = BTreeMap::new();
    for c in &unique {
        *counts.entry(conflict_key(c)).or_default() += 1;
    }
    let mut survivors = Vec::with_capacity(unique.len());
    for c in unique {
        let n = counts.get(&conflict_key(&c)).copied().unwrap_or(0);
        if n > 1 {
            let reason = format!("GUILLOTINE ({n} {} candidates)", c.outcome.category);
            rejected.push(reject(c, reason));
        } else {
            survivors.push(c);
        }
    }

    // Per-event cap
    let Some(cap) = max_per_event else {
        return (survivors, rejected);
    };
    if survivors.len() <= cap {
        return (survivors, rejected);
    }
    let mut ranked: Vec<usize> = (0..survivors.len()).collect();
    ranked.sort_by(|&a, &b| survivors[b].score.total_cmp(&survivors[a].score));
    let keep: HashSet<usize> = ranked.into_iter().take(cap).collect();

    let mut kept = Vec::with_capacity(cap);
    for (i, c) in survivors.into_iter().enumerate() {
        if keep.contains(&i) {
            kept.push(c);
        } else {
            rejected.push(reject(c, format!("EVENT CAP (max {cap})")));
        }
    }
    (kept, rejected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
