//! Ordered selection rules applied over ranked candidates.

use crate::candidate_discovery::RankedCandidate;
use crate::candidate_scoring::is_raster_url;

pub const BLOCKED_KEYWORDS: [&str; 7] = [
    "fondo",
    "blanco",
    "liso",
    "background",
    "hero",
    "logo",
    "scouting-america-logo",
];

/// A named predicate over a lowercased candidate URL.
#[derive(Clone, Copy)]
pub struct SelectionRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

pub fn is_blocked(lowered_url: &str) -> bool {
    BLOCKED_KEYWORDS
        .iter()
        .any(|keyword| lowered_url.contains(keyword))
}

fn eligible_raster(lowered_url: &str) -> bool {
    !is_blocked(lowered_url) && is_raster_url(lowered_url)
}

fn cyber_raster(lowered_url: &str) -> bool {
    eligible_raster(lowered_url) && lowered_url.contains("cyber")
}

fn badge_or_merit_raster(lowered_url: &str) -> bool {
    eligible_raster(lowered_url)
        && (lowered_url.contains("badge") || lowered_url.contains("merit"))
}

/// Rules in priority order; when none matches the top-ranked candidate is used.
pub const SELECTION_RULES: [SelectionRule; 3] = [
    SelectionRule {
        name: "cyber raster",
        matches: cyber_raster,
    },
    SelectionRule {
        name: "badge or merit raster",
        matches: badge_or_merit_raster,
    },
    SelectionRule {
        name: "unblocked raster",
        matches: eligible_raster,
    },
];

/// Returns the first candidate matching the highest-priority rule, with that rule's name.
pub fn select_candidate(
    candidates: &[RankedCandidate],
) -> Result<(&RankedCandidate, &'static str), String> {
    let Some(top_ranked) = candidates.first() else {
        return Err("No candidate images found on page".to_string());
    };
    let chosen = SELECTION_RULES
        .iter()
        .find_map(|rule| {
            candidates
                .iter()
                .find(|candidate| (rule.matches)(&candidate.url.to_ascii_lowercase()))
                .map(|candidate| (candidate, rule.name))
        })
        .unwrap_or((top_ranked, "top ranked"));
    Ok(chosen)
}

/// First raster candidate in ranked order, ignoring the blocklist.
pub fn first_raster_candidate(candidates: &[RankedCandidate]) -> Option<&RankedCandidate> {
    candidates
        .iter()
        .find(|candidate| is_raster_url(&candidate.url))
}
