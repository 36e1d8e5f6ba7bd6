use logscope_types::{LogLine, Severity};

/// Classifier extracting the severity tag from raw log lines
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a raw line into a LogLine
    pub fn classify(raw: &str) -> LogLine {
        LogLine::new(raw.to_string(), Self::extract_severity(raw))
    }

    /// Find the leftmost exact bracketed severity tag
    ///
    /// Only `[INFO]`, `[WARN]`, `[ERROR]`, `[DEBUG]` and `[TRACE]` count, with
    /// exact case. Other bracketed tokens are skipped.
    pub fn extract_severity(raw: &str) -> Severity {
        for (start, _) in raw.match_indices('[') {
            let rest = &raw[start + 1..];
            let Some(end) = rest.find(']') else {
                // No closing bracket anywhere after this point
                return Severity::None;
            };
            let severity = Severity::from_tag(&rest[..end]);
            if severity != Severity::None {
                return severity;
            }
        }
        Severity::None
    }
}

/// Classify a raw line into a LogLine
pub fn classify(raw: &str) -> LogLine {
    LineClassifier::classify(raw)
}
