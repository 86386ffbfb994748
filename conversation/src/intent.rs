use crate::TECHNICAL_CATEGORY_DEBUGGING;

/// Classified intent of one user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Farewell,
    Technical { category: String },
    TaskSwitch { area: String },
    General,
}

struct IntentRule {
    keywords: &'static [&'static str],
    build: fn(&str) -> Intent,
}

const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "greetings"];
const FAREWELL_KEYWORDS: &[&str] = &["bye", "goodbye", "exit", "quit"];
const TECHNICAL_KEYWORDS: &[&str] = &["code", "bug", "error", "fix", "debug"];
const TASK_KEYWORDS: &[&str] = &["frontend", "backend", "database"];

/// Keyword classifier over an ordered rule list. Rules are evaluated
/// top-to-bottom and the first matching keyword set wins, which makes the
/// priority order explicit: greeting, farewell, technical, task switch,
/// then general conversation. Matching is case-insensitive substring
/// matching against fixed keyword sets.
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                IntentRule {
                    keywords: GREETING_KEYWORDS,
                    build: |_| Intent::Greeting,
                },
                IntentRule {
                    keywords: FAREWELL_KEYWORDS,
                    build: |_| Intent::Farewell,
                },
                IntentRule {
                    keywords: TECHNICAL_KEYWORDS,
                    build: |_| Intent::Technical {
                        category: TECHNICAL_CATEGORY_DEBUGGING.to_string(),
                    },
                },
                IntentRule {
                    keywords: TASK_KEYWORDS,
                    build: |area| Intent::TaskSwitch {
                        area: area.to_string(),
                    },
                },
            ],
        }
    }

    pub fn classify(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        for rule in &self.rules {
            if let Some(hit) = rule.keywords.iter().find(|keyword| lowered.contains(*keyword)) {
                return (rule.build)(hit);
            }
        }
        Intent::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_each_category() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("Hello!"), Intent::Greeting);
        assert_eq!(classifier.classify("ok goodbye"), Intent::Farewell);
        assert_eq!(
            classifier.classify("there is a bug in my parser"),
            Intent::Technical {
                category: TECHNICAL_CATEGORY_DEBUGGING.to_string()
            }
        );
        assert_eq!(
            classifier.classify("let's work on the backend"),
            Intent::TaskSwitch {
                area: "backend".to_string()
            }
        );
        assert_eq!(classifier.classify("what a nice day"), Intent::General);
    }

    #[test]
    fn earlier_rules_win() {
        let classifier = IntentClassifier::new();
        // Greeting is checked before technical even when both match.
        assert_eq!(classifier.classify("hello, fix this bug"), Intent::Greeting);
        // Technical is checked before task switch.
        assert_eq!(
            classifier.classify("fix the frontend build"),
            Intent::Technical {
                category: TECHNICAL_CATEGORY_DEBUGGING.to_string()
            }
        );
    }

    #[test]
    fn classification_is_stable_for_identical_input() {
        let classifier = IntentClassifier::new();
        for _ in 0..3 {
            assert_eq!(classifier.classify("hello"), Intent::Greeting);
        }
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("DEBUG output looks wrong"),
            Intent::Technical {
                category: TECHNICAL_CATEGORY_DEBUGGING.to_string()
            }
        );
        // Substring semantics: "this" carries "hi", so the greeting rule
        // fires first.
        assert_eq!(classifier.classify("rework this module"), Intent::Greeting);
    }
}
