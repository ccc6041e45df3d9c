use std::sync::LazyLock;

use regex::Regex;

use crate::llm::{ChatMessage, Role};

static ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*origin\s*:\s*(.+?)\s*$").expect("origin pattern"));
static BUDGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*budget\s*:\s*\$?\s*(\d+)\s*$").expect("budget pattern"));
static START_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*startDate\s*:\s*(\d{4}-\d{2}-\d{2})\s*$").expect("startDate pattern")
});
static END_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*endDate\s*:\s*(\d{4}-\d{2}-\d{2})\s*$").expect("endDate pattern")
});

/// Fields typed into the chat as `key: value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub origin: Option<String>,
    pub budget: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.budget.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    fn scan_line(&mut self, line: &str) {
        if let Some(caps) = ORIGIN.captures(line) {
            if self.origin.is_none() {
                self.origin = Some(caps[1].trim().to_string());
            }
        } else if let Some(caps) = BUDGET.captures(line) {
            if self.budget.is_none() {
                self.budget = caps[1].parse().ok();
            }
        } else if let Some(caps) = START_DATE.captures(line) {
            if self.start_date.is_none() {
                self.start_date = Some(caps[1].to_string());
            }
        } else if let Some(caps) = END_DATE.captures(line) {
            if self.end_date.is_none() {
                self.end_date = Some(caps[1].to_string());
            }
        }
    }
}

/// Scan user turns newest first, lines bottom-up; the first hit per field wins.
///
/// Scanning stops at the newest user turn that yields any field, so a value
/// only present in an older turn is not picked up when a newer turn matched
/// something else.
pub fn extract_fields(messages: &[ChatMessage]) -> ExtractedFields {
    for turn in messages.iter().rev().filter(|m| m.role == Role::User) {
        let mut found = ExtractedFields::default();
        for line in turn.content.split('\n').rev().filter(|l| !l.is_empty()) {
            found.scan_line(line);
        }
        if !found.is_empty() {
            return found;
        }
    }
    ExtractedFields::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_with_dollar_sign() {
        let fields = extract_fields(&[ChatMessage::user("budget: $2500")]);
        assert_eq!(fields.budget, Some(2500));
        assert_eq!(fields.origin, None);
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        let fields = extract_fields(&[ChatMessage::user(
            "ORIGIN:   San Francisco  \nStartDate: 2026-05-01\nENDDATE:2026-05-09",
        )]);
        assert_eq!(fields.origin.as_deref(), Some("San Francisco"));
        assert_eq!(fields.start_date.as_deref(), Some("2026-05-01"));
        assert_eq!(fields.end_date.as_deref(), Some("2026-05-09"));
    }

    #[test]
    fn test_last_line_in_turn_wins() {
        let fields = extract_fields(&[ChatMessage::user("origin: Lyon\n\norigin: Paris")]);
        assert_eq!(fields.origin.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_ignores_assistant_turns() {
        let fields = extract_fields(&[
            ChatMessage::user("budget: 900"),
            ChatMessage::assistant("origin: Berlin"),
        ]);
        assert_eq!(fields.budget, Some(900));
        assert_eq!(fields.origin, None);
    }

    #[test]
    fn test_stops_at_newest_matching_turn() {
        let fields = extract_fields(&[
            ChatMessage::user("origin: Tokyo"),
            ChatMessage::user("budget: 1200"),
        ]);
        assert_eq!(fields.budget, Some(1200));
        assert_eq!(fields.origin, None);
    }

    #[test]
    fn test_skips_non_matching_newer_turns() {
        let fields = extract_fields(&[
            ChatMessage::user("origin: Tokyo"),
            ChatMessage::user("sounds great, thanks"),
        ]);
        assert_eq!(fields.origin.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let fields = extract_fields(&[ChatMessage::user(
            "I fly from Paris with about 2000 dollars\nbudget: lots\nstartDate: May 1st",
        )]);
        assert!(fields.is_empty());
    }
}
