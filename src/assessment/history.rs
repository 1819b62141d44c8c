//! Completed assessments submitted to the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type tag for the built-in career quiz.
pub const CAREER_INTERESTS: &str = "career_interests";

/// A completed assessment as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: String,
    pub user_id: String,
    pub assessment_type: String,
    pub responses: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl AssessmentRecord {
    /// Human-readable name for the history table.
    pub fn display_name(&self) -> String {
        match self.assessment_type.as_str() {
            CAREER_INTERESTS => "Career Interests Assessment".to_string(),
            other => other
                .split('_')
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A completed assessment ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssessment {
    pub user_id: String,
    pub assessment_type: String,
    pub responses: Vec<String>,
    pub completed_at: DateTime<Utc>,
}
