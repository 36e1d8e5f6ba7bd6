use chrono::NaiveDate;

use logscope_types::{FilterCriteria, LogLine};

/// Level and search criteria prepared for repeated matching
///
/// Level matching checks for the bracketed tag anywhere in the raw text rather
/// than comparing classified severities, so a line carrying several tags
/// matches each of them.
#[derive(Clone, Debug)]
pub struct LinePredicate {
    /// Bracketed level tag (None = all levels)
    level_tag: Option<String>,

    /// Case-folded search term (empty = match all)
    search: String,
}

impl LinePredicate {
    pub fn new(criteria: &FilterCriteria) -> Self {
        Self {
            level_tag: criteria.level.bracketed(),
            search: criteria.search.to_lowercase(),
        }
    }

    /// Check if a line passes both the level and search checks
    pub fn matches(&self, line: &LogLine) -> bool {
        self.matches_level(line) && self.matches_search(line)
    }

    pub fn matches_level(&self, line: &LogLine) -> bool {
        match &self.level_tag {
            Some(tag) => line.raw().contains(tag.as_str()),
            None => true,
        }
    }

    pub fn matches_search(&self, line: &LogLine) -> bool {
        self.search.is_empty() || line.raw().to_lowercase().contains(&self.search)
    }

    /// Check if predicate matches everything
    pub fn is_empty(&self) -> bool {
        self.level_tag.is_none() && self.search.is_empty()
    }
}

impl From<&FilterCriteria> for LinePredicate {
    fn from(criteria: &FilterCriteria) -> Self {
        Self::new(criteria)
    }
}

/// Check a line against the level and search parts of the criteria
pub fn matches(line: &LogLine, criteria: &FilterCriteria) -> bool {
    LinePredicate::new(criteria).matches(line)
}

/// Check whether a line mentions the given date in `YYYY-MM-DD` form
pub fn matches_date(line: &LogLine, date: NaiveDate) -> bool {
    line.raw().contains(&date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;
    use logscope_types::LevelFilter;

    fn criteria(level: LevelFilter, search: &str) -> FilterCriteria {
        FilterCriteria::new(level, search, None)
    }

    #[test]
    fn test_identity_filter_matches_everything() {
        let identity = FilterCriteria::default();
        for raw in ["", "[INFO] a", "[ERROR] b", "no tag", "[FATAL] c", "ÄÖÜ"] {
            assert!(matches(&classify(raw), &identity), "{raw:?}");
        }
        assert!(LinePredicate::new(&identity).is_empty());
    }

    #[test]
    fn test_level_filter_uses_tag_substring() {
        let errors = criteria(LevelFilter::Error, "");
        assert!(matches(&classify("[ERROR] disk"), &errors));
        assert!(!matches(&classify("[INFO] disk"), &errors));

        // Classified as WARN, but still carries an [ERROR] tag
        let line = classify("[WARN] previous [ERROR] cleared");
        assert!(matches(&line, &errors));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let search = criteria(LevelFilter::All, "DiSk");
        assert!(matches(&classify("[INFO] disk full"), &search));
        assert!(matches(&classify("DISK"), &search));
        assert!(!matches(&classify("[INFO] memory"), &search));
    }

    #[test]
    fn test_level_and_search_combined() {
        let both = criteria(LevelFilter::Error, "timeout");
        assert!(matches(&classify("[ERROR] upstream timeout"), &both));
        assert!(!matches(&classify("[INFO] upstream timeout"), &both));
        assert!(!matches(&classify("[ERROR] refused"), &both));
    }

    #[test]
    fn test_matches_date() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
        assert!(matches_date(&classify("2025-08-03 10:00:00 [INFO] up"), date));
        assert!(!matches_date(&classify("2025-08-04 10:00:00 [INFO] up"), date));
        assert!(!matches_date(&classify("2025-8-3 [INFO] up"), date));
    }
}
