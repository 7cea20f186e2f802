//! Diversity selector.
//!
//! Buckets candidates by market label, then drafts round-robin in a fixed
//! priority order. The ledger keeps draft order, not score order.

use std::collections::VecDeque;

use super::league::BucketMatchers;
use crate::types::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Spread,
    TotalOver,
    TotalUnder,
    Moneyline,
    Prop,
}

impl Bucket {
    /// Draft priority.
    pub const DRAFT_ORDER: [Bucket; 5] = [
        Bucket::Spread,
        Bucket::TotalOver,
        Bucket::TotalUnder,
        Bucket::Moneyline,
        Bucket::Prop,
    ];

    /// Matching priority. Props come first so a prop label mentioning a
    /// total never lands in a total bucket.
    const MATCH_ORDER: [Bucket; 5] = [
        Bucket::Prop,
        Bucket::Spread,
        Bucket::Moneyline,
        Bucket::TotalOver,
        Bucket::TotalUnder,
    ];

    fn matchers<'m>(&self, m: &'m BucketMatchers) -> &'m [String] {
        match self {
            Bucket::Spread => &m.spread,
            Bucket::TotalOver => &m.total_over,
            Bucket::TotalUnder => &m.total_under,
            Bucket::Moneyline => &m.moneyline,
            Bucket::Prop => &m.prop,
        }
    }
}

/// Bucket for a market label, or None when nothing matches.
pub fn classify(label: &str, matchers: &BucketMatchers) -> Option<Bucket> {
    let label = label.to_uppercase();
    Bucket::MATCH_ORDER.into_iter().find(|b| {
        b.matchers(matchers)
            .iter()
            .any(|m| !m.is_empty() && label.contains(&m.to_uppercase()))
    })
}

fn sort_desc(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Draft at most `limit` candidates.
pub fn select<'a>(
    candidates: Vec<Candidate<'a>>,
    matchers: &BucketMatchers,
    limit: usize,
) -> Vec<Candidate<'a>> {
    let mut buckets: Vec<Vec<Candidate<'a>>> = vec![Vec::new(); Bucket::DRAFT_ORDER.len()];
    let mut remainder = Vec::new();

    for c in candidates {
        let slot = classify(&c.outcome.market_label(), matchers)
            .and_then(|b| Bucket::DRAFT_ORDER.iter().position(|d| *d == b));
        match slot {
            Some(i) => buckets[i].push(c),
            None => remainder.push(c),
        }
    }

    let mut queues: Vec<VecDeque<Candidate<'a>>> = buckets
        .into_iter()
        .map(|mut b| {
            sort_desc(&mut b);
            VecDeque::from(b)
        })
        .collect();

    let mut ledger = Vec::with_capacity(limit);
    while ledger.len() < limit && queues.iter().any(|q| !q.is_empty()) {
        for queue in queues.iter_mut() {
            if ledger.len() >= limit {
                break;
            }
            if let Some(c) = queue.pop_front() {
                ledger.push(c);
            }
        }
    }

    sort_desc(&mut remainder);
    let room = limit.saturating_sub(ledger.len());
    ledger.extend(remainder.into_iter().take(room));
    ledger
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetCategory, Event, League, Outcome, Selection, TeamContext};
    use std::collections::HashSet;

    fn make_event() -> Event {
        Event {
            league: League::Nba,
            id: "e1".to_string(),
            home: "Boston Celtics".to_string(),
            away: "Miami Heat".to_string(),
            start: None,
            favorite: None,
            home_context: TeamContext::default(),
            away_context: TeamContext::default(),
            outcomes: Vec::new(),
        }
    }

    fn make_outcome(category: BetCategory, selection: Selection, market_key: &str) -> Outcome {
        Outcome {
            event_id: "e1".to_string(),
            category,
            market_key: market_key.to_string(),
            target: format!("{selection:?}"),
            selection: Some(selection),
            subject: None,
            line: Some(1.5),
            price: Some(-110),
            bookmaker: "draftkings".to_string(),
        }
    }

    fn cand<'a>(event: &'a Event, outcome: &'a Outcome, score: f64) -> Candidate<'a> {
        Candidate {
            event,
            outcome,
            score,
            directive: String::new(),
            annotations: Vec::new(),
        }
    }

    #[test]
    fn test_classify_labels() {
        let m = BucketMatchers::default();
        assert_eq!(classify("SPREAD", &m), Some(Bucket::Spread));
        assert_eq!(classify("MONEYLINE", &m), Some(Bucket::Moneyline));
        assert_eq!(classify("TOTAL OVER", &m), Some(Bucket::TotalOver));
        assert_eq!(classify("total under", &m), Some(Bucket::TotalUnder));
        assert_eq!(classify("PLAYER PROP POINTS OVER", &m), Some(Bucket::Prop));
        // Prop matchers win over total matchers.
        assert_eq!(classify("PLAYER PROP TOTAL OVER", &m), Some(Bucket::Prop));
        assert_eq!(classify("TOTAL", &m), None);
    }

    #[test]
    fn test_draft_order_not_score_order() {
        let event = make_event();
        let spreads: Vec<Outcome> = (0..3).map(|_| make_outcome(BetCategory::Spread, Selection::Home, "spreads")).collect();
        let over = make_outcome(BetCategory::Total, Selection::Over, "totals");
        let ml = make_outcome(BetCategory::Moneyline, Selection::Home, "h2h");

        let mut input: Vec<Candidate> = spreads.iter().zip([90.0, 80.0, 70.0]).map(|(o, s)| cand(&event, o, s)).collect();
        input.push(cand(&event, &over, 40.0));
        input.push(cand(&event, &ml, 30.0));

        let ledger = select(input, &BucketMatchers::default(), 4);
        let scores: Vec<f64> = ledger.iter().map(|c| c.score).collect();
        // Spread, Over, Moneyline, then the second spread.
        assert_eq!(scores, vec![90.0, 40.0, 30.0, 80.0]);
    }

    #[test]
    fn test_limit_bound_and_diversity() {
        let event = make_event();
        let outcomes = vec![
            make_outcome(BetCategory::Spread, Selection::Home, "spreads"),
            make_outcome(BetCategory::Spread, Selection::Away, "spreads"),
            make_outcome(BetCategory::Total, Selection::Over, "totals"),
            make_outcome(BetCategory::Total, Selection::Under, "totals"),
            make_outcome(BetCategory::Moneyline, Selection::Home, "h2h"),
        ];
        for limit in 0..7 {
            let input: Vec<Candidate> = outcomes.iter().map(|o| cand(&event, o, 50.0)).collect();
            let ledger = select(input, &BucketMatchers::default(), limit);
            assert!(ledger.len() <= limit);
            if limit >= 3 {
                let buckets: HashSet<_> = ledger
                    .iter()
                    .filter_map(|c| classify(&c.outcome.market_label(), &BucketMatchers::default()))
                    .collect();
                assert!(buckets.len() >= 2);
            }
        }
    }

    #[test]
    fn test_remainder_fills_after_buckets() {
        let event = make_event();
        let spread = make_outcome(BetCategory::Spread, Selection::Home, "spreads");
        // A bare TOTAL label (no side) matches no bucket.
        let mut odd = make_outcome(BetCategory::Total, Selection::Over, "totals");
        odd.selection = None;

        let ledger = select(
            vec![cand(&event, &odd, 99.0), cand(&event, &spread, 10.0)],
            &BucketMatchers::default(),
            5,
        );
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].score, 10.0);
        assert_eq!(ledger[1].score, 99.0);
    }

    #[test]
    fn test_custom_matchers() {
        let mut m = BucketMatchers::default();
        m.spread = vec!["puck line".to_string()];
        assert_eq!(classify("PUCK LINE", &m), Some(Bucket::Spread));
        assert_eq!(classify("SPREAD", &m), None);
    }
}
