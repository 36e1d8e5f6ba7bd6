use logscope_types::{FilterCriteria, LogLine, StoreMode};

use crate::filter::{matches_date, LinePredicate};
use crate::store::LogStore;

/// Which rule produced a projection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionBranch {
    /// Level and search over the live set, newest first
    Live,
    /// Date only over the static set; level and search are ignored
    Date,
    /// Level and search over the static set, oldest first
    Static,
}

impl ProjectionBranch {
    /// Pick the branch for the current store mode and criteria
    ///
    /// Live mode wins over everything. In static mode a date replaces the
    /// level and search criteria rather than narrowing them.
    pub fn select(store: &LogStore, criteria: &FilterCriteria) -> Self {
        match (store.mode(), criteria.date) {
            (StoreMode::Live, _) => Self::Live,
            (StoreMode::Static, Some(_)) => Self::Date,
            (StoreMode::Static, None) => Self::Static,
        }
    }
}

/// Derive the displayed lines from the store and criteria
///
/// Each set already carries its display order, so lines are only filtered,
/// never reordered.
pub fn project<'a>(store: &'a LogStore, criteria: &FilterCriteria) -> Vec<&'a LogLine> {
    match ProjectionBranch::select(store, criteria) {
        ProjectionBranch::Live => {
            let predicate = LinePredicate::new(criteria);
            store.live_lines().filter(|l| predicate.matches(l)).collect()
        }
        ProjectionBranch::Date => match criteria.date {
            Some(date) => store
                .static_lines()
                .iter()
                .filter(|l| matches_date(l, date))
                .collect(),
            None => Vec::new(),
        },
        ProjectionBranch::Static => {
            let predicate = LinePredicate::new(criteria);
            store
                .static_lines()
                .iter()
                .filter(|l| predicate.matches(l))
                .collect()
        }
    }
}

/// Approximate "N lines" display counter
///
/// Reset to the view length when the view is redrawn from scratch and bumped
/// once per live event. It is never read back from the buffer, so it keeps
/// counting past the live capacity and counts blank live events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineCounter(usize);

impl LineCounter {
    pub fn get(&self) -> usize {
        self.0
    }

    pub fn reset_to(&mut self, count: usize) {
        self.0 = count;
    }

    pub fn bump(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn label(&self) -> String {
        format!("{} lines", self.0)
    }
}
