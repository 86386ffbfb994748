use crate::code_context::CodeContextEntry;
use crate::code_context::ConstructKind;
use crate::code_context::NamingStyle;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// One piece of suggestion feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub suggestion_id: String,
    pub was_helpful: bool,
    pub comments: Option<String>,
}

/// Per-user learned state: naming-convention statistics, preferred
/// libraries, and suggestion-feedback metrics. Lives for the whole gateway
/// lifetime; `clear_history` on the gateway intentionally leaves it alone.
#[derive(Debug, Default)]
pub struct LearningStore {
    coding_style: BTreeMap<ConstructKind, BTreeMap<NamingStyle, u32>>,
    preferred_libraries: BTreeSet<String>,
    feedback_history: Vec<FeedbackRecord>,
    accepted: u32,
    rejected: u32,
}

impl LearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one ingested code-context entry into the learned state.
    pub fn observe(&mut self, entry: &CodeContextEntry) {
        for observation in &entry.naming_patterns {
            let styles = self.coding_style.entry(observation.construct).or_default();
            *styles.entry(observation.style).or_insert(0) += 1;
        }
        for import in &entry.imports {
            self.preferred_libraries.insert(import.clone());
        }
    }

    pub fn record_feedback(&mut self, record: FeedbackRecord) {
        if record.was_helpful {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        self.feedback_history.push(record);
    }

    /// Share of feedback marked helpful, as a percentage. Optimistically
    /// 100 when no feedback has been recorded yet.
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.accepted + self.rejected;
        if total == 0 {
            100.0
        } else {
            f64::from(self.accepted) / f64::from(total) * 100.0
        }
    }

    pub fn style_count(&self, construct: ConstructKind, style: NamingStyle) -> u32 {
        self.coding_style
            .get(&construct)
            .and_then(|styles| styles.get(&style))
            .copied()
            .unwrap_or(0)
    }

    pub fn naming_counts(&self) -> &BTreeMap<ConstructKind, BTreeMap<NamingStyle, u32>> {
        &self.coding_style
    }

    pub fn preferred_libraries(&self) -> &BTreeSet<String> {
        &self.preferred_libraries
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback_history.len()
    }

    /// One-line summary of the learned style, used in prompt assembly.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        for (construct, styles) in &self.coding_style {
            let dominant = styles.iter().max_by_key(|(_, count)| **count);
            if let Some((style, count)) = dominant {
                if !summary.is_empty() {
                    summary.push_str("; ");
                }
                let _ = write!(
                    summary,
                    "{construct:?} names lean {} (seen {count})",
                    style.label()
                );
            }
        }
        if !self.preferred_libraries.is_empty() {
            if !summary.is_empty() {
                summary.push_str("; ");
            }
            let libraries: Vec<&str> = self
                .preferred_libraries
                .iter()
                .map(String::as_str)
                .collect();
            let _ = write!(summary, "preferred libraries: {}", libraries.join(", "));
        }
        if summary.is_empty() {
            summary.push_str("no patterns learned yet");
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_context::parse_code_context;
    use pretty_assertions::assert_eq;

    fn feedback(id: &str, helpful: bool) -> FeedbackRecord {
        FeedbackRecord {
            timestamp: Utc::now(),
            suggestion_id: id.to_string(),
            was_helpful: helpful,
            comments: None,
        }
    }

    #[test]
    fn acceptance_rate_defaults_to_one_hundred() {
        let store = LearningStore::new();
        assert_eq!(store.acceptance_rate(), 100.0);
    }

    #[test]
    fn acceptance_rate_reflects_recorded_feedback() {
        let mut store = LearningStore::new();
        store.record_feedback(feedback("s-1", true));
        store.record_feedback(feedback("s-2", true));
        store.record_feedback(feedback("s-3", true));
        store.record_feedback(feedback("s-4", false));
        assert_eq!(store.acceptance_rate(), 75.0);
        assert_eq!(store.feedback_count(), 4);
    }

    #[test]
    fn observing_code_updates_histogram_and_libraries() {
        let mut store = LearningStore::new();
        let entry = parse_code_context(
            "example.py",
            "import math\n\ndef calculate_sum(a, b):\n    return a + b\n",
        );
        store.observe(&entry);

        assert_eq!(
            store.style_count(ConstructKind::Function, NamingStyle::SnakeCase),
            1
        );
        assert!(store.preferred_libraries().contains("math"));
    }

    #[test]
    fn summary_names_the_dominant_style() {
        let mut store = LearningStore::new();
        let entry = parse_code_context(
            "widget.py",
            "import json\n\nclass WidgetFactory:\n    pass\n\ndef make_widget():\n    pass\n",
        );
        store.observe(&entry);

        let summary = store.summary();
        assert!(summary.contains("snake_case"));
        assert!(summary.contains("PascalCase"));
        assert!(summary.contains("json"));
    }
}
