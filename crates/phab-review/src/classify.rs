//! Coarse priority classification of review comments.
//!
//! Lexical, case-insensitive substring rules evaluated in fixed priority
//! order: Issue > Suggestion > Nit > Other. The keyword lists are tuned ad
//! hoc and configurable; the exact words are not a contract.

use serde::Serialize;

use crate::correlate::LocatedComment;

/// Priority bucket of a review comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Issue,
    Suggestion,
    Nit,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Issue => "Issue",
            Category::Suggestion => "Suggestion",
            Category::Nit => "Nit",
            Category::Other => "Other",
        }
    }
}

/// Keyword lists driving classification, first match wins.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub issue: Vec<String>,
    pub suggestion: Vec<String>,
    pub nit: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            issue: owned(&[
                "bug", "broken", "error", "must fix", "blocker", "crash",
                "incorrect", "wrong", "fail", "problem", "issue",
            ]),
            suggestion: owned(&[
                "consider", "suggest", "could", "maybe", "perhaps",
                "recommend", "might", "what about",
            ]),
            // "nit" alone would match inside words like "unit"
            nit: owned(&["nit:", "nit ", "typo", "style", "spacing", "whitespace", "formatting"]),
        }
    }
}

impl ClassifierRules {
    /// Classify comment text. Total and deterministic: every input yields
    /// exactly one category.
    pub fn classify(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        let matches = |words: &[String]| words.iter().any(|w| lower.contains(w.as_str()));

        if matches(&self.issue) {
            Category::Issue
        } else if matches(&self.suggestion) {
            Category::Suggestion
        } else if matches(&self.nit) {
            Category::Nit
        } else {
            Category::Other
        }
    }
}

/// A located comment with its priority bucket.
#[derive(Debug, Clone)]
pub struct ClassifiedComment {
    pub located: LocatedComment,
    pub category: Category,
}

/// Classify a batch of located comments, preserving order.
pub fn classify_all(rules: &ClassifierRules, located: Vec<LocatedComment>) -> Vec<ClassifiedComment> {
    located
        .into_iter()
        .map(|l| {
            let category = rules.classify(&l.comment.text);
            ClassifiedComment {
                located: l,
                category,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_keywords() {
        let rules = ClassifierRules::default();
        assert_eq!(rules.classify("Fix this issue"), Category::Issue);
        assert_eq!(rules.classify("this is BROKEN"), Category::Issue);
        assert_eq!(rules.classify("must fix before landing"), Category::Issue);
    }

    #[test]
    fn test_suggestion_keywords() {
        let rules = ClassifierRules::default();
        assert_eq!(rules.classify("Consider caching this"), Category::Suggestion);
        assert_eq!(rules.classify("you could inline it"), Category::Suggestion);
    }

    #[test]
    fn test_nit_keywords() {
        let rules = ClassifierRules::default();
        assert_eq!(rules.classify("nit: rename variable"), Category::Nit);
        assert_eq!(rules.classify("typo in the docstring"), Category::Nit);
    }

    #[test]
    fn test_default_category() {
        let rules = ClassifierRules::default();
        assert_eq!(rules.classify("LGTM"), Category::Other);
        assert_eq!(rules.classify(""), Category::Other);
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        let rules = ClassifierRules::default();
        // Both an issue keyword and a nit keyword present: Issue wins
        assert_eq!(rules.classify("nit: this is a bug actually"), Category::Issue);
        // Suggestion beats nit
        assert_eq!(rules.classify("nit: consider renaming"), Category::Suggestion);
    }

    #[test]
    fn test_deterministic() {
        let rules = ClassifierRules::default();
        let text = "maybe broken, consider a typo";
        assert_eq!(rules.classify(text), rules.classify(text));
    }

    #[test]
    fn test_category_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Category::Issue).unwrap(), "\"Issue\"");
        assert_eq!(
            serde_json::to_string(&Category::Suggestion).unwrap(),
            "\"Suggestion\""
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = ClassifierRules {
            issue: vec!["urgent".into()],
            suggestion: vec![],
            nit: vec![],
        };
        assert_eq!(rules.classify("URGENT: look at this"), Category::Issue);
        assert_eq!(rules.classify("bug"), Category::Other);
    }
}
