//! Keyword classifier.
//!
//! Reservation keywords are checked first, so a message that mentions both a
//! booking and feedback is treated as a reservation.

use tracing::debug;

use crate::config::KeywordSets;
use crate::pipeline::types::Classification;

/// Case-insensitive substring classifier over two keyword sets.
#[derive(Debug, Clone)]
pub struct Classifier {
    reservation: Vec<String>,
    feedback: Vec<String>,
}

impl Classifier {
    /// Build a classifier; keywords are lowercased once here.
    pub fn new(keywords: &KeywordSets) -> Self {
        Self {
            reservation: normalize(&keywords.reservation),
            feedback: normalize(&keywords.feedback),
        }
    }

    /// Classify already-extracted text.
    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        if let Some(keyword) = first_match(&self.reservation, &lower) {
            debug!(keyword, "Matched reservation keyword");
            return Classification::Reservation;
        }
        if let Some(keyword) = first_match(&self.feedback, &lower) {
            debug!(keyword, "Matched feedback keyword");
            return Classification::Feedback;
        }
        Classification::Unclassified
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&KeywordSets::default())
    }
}

/// Lowercase keywords and drop blanks (an empty keyword would match everything).
fn normalize(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn first_match<'k>(keywords: &'k [String], lower_text: &str) -> Option<&'k str> {
    keywords
        .iter()
        .find(|k| lower_text.contains(k.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_keyword_detected() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("I'd like to book a table for 7pm, party of 4"),
            Classification::Reservation
        );
    }

    #[test]
    fn feedback_keyword_detected() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("Great experience, loved the food!"),
            Classification::Feedback
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("RESERVATION PLEASE"), Classification::Reservation);
        assert_eq!(classifier.classify("A Complaint"), Classification::Feedback);
    }

    #[test]
    fn reservation_wins_over_feedback() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("Some feedback about my last booking"),
            Classification::Reservation
        );
    }

    #[test]
    fn neither_set_is_unclassified() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("Are you hiring waiters?"),
            Classification::Unclassified
        );
        assert_eq!(classifier.classify(""), Classification::Unclassified);
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let classifier = Classifier::new(&KeywordSets {
            reservation: vec!["Reservierung".into()],
            feedback: vec!["Bewertung".into()],
        });
        assert_eq!(
            classifier.classify("Ich möchte eine reservierung"),
            Classification::Reservation
        );
        assert_eq!(
            classifier.classify("Meine Bewertung"),
            Classification::Feedback
        );
        // Default vocabulary no longer applies.
        assert_eq!(classifier.classify("booking"), Classification::Unclassified);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let classifier = Classifier::new(&KeywordSets {
            reservation: vec!["  ".into()],
            feedback: vec![String::new()],
        });
        assert_eq!(classifier.classify("anything"), Classification::Unclassified);
    }
}
