use std::fmt;

use serde::Serialize;

use super::card::Card;

/// The first eligibility gate an announcement failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Platform,
    Country,
    NotStarted,
    Expired,
    Version,
    Conditions,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Platform => "platform",
            Rejection::Country => "country",
            Rejection::NotStarted => "not_started",
            Rejection::Expired => "expired",
            Rejection::Version => "version",
            Rejection::Conditions => "conditions",
        };
        f.write_str(reason)
    }
}

/// Per-gate exclusion counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exclusions {
    pub platform: usize,
    pub country: usize,
    pub not_started: usize,
    pub expired: usize,
    pub version: usize,
    pub conditions: usize,
}

impl Exclusions {
    pub fn record(&mut self, rejection: Rejection) {
        let slot = match rejection {
            Rejection::Platform => &mut self.platform,
            Rejection::Country => &mut self.country,
            Rejection::NotStarted => &mut self.not_started,
            Rejection::Expired => &mut self.expired,
            Rejection::Version => &mut self.version,
            Rejection::Conditions => &mut self.conditions,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.platform + self.country + self.not_started + self.expired + self.version + self.conditions
    }
}

/// Metadata describing the outcome of one selection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionMetadata {
    pub announcements_considered: usize,
    pub cards_selected: usize,
    pub excluded: Exclusions,
}

/// Cards plus how they were arrived at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub cards: Vec<Card>,
    pub selection: SelectionMetadata,
}
