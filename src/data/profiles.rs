//! Team profile resolver.
//!
//! Maps a free-text team display name to a `TeamProfile`. Resolution
//! order is fixed: exact key, metro-area alias, last-word substring
//! match, then "not found". Downstream rules treat absence as a policy
//! signal, so this order must not change.

use std::collections::BTreeMap;
use tracing::debug;

use crate::types::TeamProfile;

/// Bidirectional aliases for franchises that share a city qualifier.
const METRO_ALIASES: &[(&str, &str)] = &[
    ("LA Clippers", "Los Angeles Clippers"),
    ("LA Lakers", "Los Angeles Lakers"),
    ("NY Knicks", "New York Knicks"),
    ("NY Rangers", "New York Rangers"),
    ("NY Islanders", "New York Islanders"),
    ("NY Giants", "New York Giants"),
    ("NY Jets", "New York Jets"),
    ("LA Rams", "Los Angeles Rams"),
    ("LA Chargers", "Los Angeles Chargers"),
];

/// Profiles keyed by canonical team name. Ordered so that the fallback
/// scan is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ProfileBook {
    profiles: BTreeMap<String, TeamProfile>,
}

impl ProfileBook {
    pub fn new(profiles: BTreeMap<String, TeamProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|(name, mut p)| {
                if p.team.is_empty() {
                    p.team = name.clone();
                }
                (name, p)
            })
            .collect();
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Resolve a display name to a profile.
    pub fn resolve(&self, name: &str) -> Option<&TeamProfile> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if let Some(p) = self.profiles.get(name) {
            return Some(p);
        }

        if let Some(p) = self.resolve_alias(name) {
            debug!(team = name, key = %p.team, "Resolved via metro alias");
            return Some(p);
        }

        let last = name.split_whitespace().last()?.to_lowercase();
        let found = self
            .profiles
            .iter()
            .find(|(key, _)| key.to_lowercase().contains(&last))
            .map(|(_, p)| p);
        match found {
            Some(p) => debug!(team = name, key = %p.team, "Resolved via last-word match"),
            None => debug!(team = name, "No profile found"),
        }
        found
    }

    fn resolve_alias(&self, name: &str) -> Option<&TeamProfile> {
        METRO_ALIASES.iter().find_map(|(short, long)| {
            if name.eq_ignore_ascii_case(short) {
                self.profiles.get(*long)
            } else if name.eq_ignore_ascii_case(long) {
                self.profiles.get(*short)
            } else {
                None
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
