//! Shared slate fixture and helpers.

use std::collections::BTreeMap;

use titanium::data::normalizer::QuoteNormalizer;
use titanium::data::profiles::ProfileBook;
use titanium::data::Slate;
use titanium::strategy::league::PipelineConfig;
use titanium::types::{Event, League};

/// Eight usable events across NBA, NHL and soccer plus one unknown league.
pub const SLATE: &str = include_str!("../../demos/slate.json");

pub fn slate() -> Slate {
    Slate::from_json(SLATE).expect("fixture slate parses")
}

pub fn events(slate: &Slate, config: &PipelineConfig) -> Vec<Event> {
    QuoteNormalizer::new(config.preferred_bookmaker.clone()).normalize_all(&slate.events)
}

pub fn books(slate: &Slate) -> BTreeMap<League, ProfileBook> {
    slate.profile_books()
}

pub fn banned(event: &Event, ban_list: &[String]) -> bool {
    let home = event.home.to_lowercase();
    let away = event.away.to_lowercase();
    ban_list.iter().any(|b| {
        let b = b.to_lowercase();
        home.contains(&b) || away.contains(&b)
    })
}
