//! Question bank items authored by educators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fewest options a bank question may have.
pub const MIN_OPTIONS: usize = 2;
/// Most options a bank question may have.
pub const MAX_OPTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A stored bank question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankQuestion {
    pub id: String,
    pub creator_id: String,
    pub question_text: String,
    pub category: String,
    pub options: Vec<QuestionOption>,
    pub created_at: DateTime<Utc>,
}

impl BankQuestion {
    /// Case-insensitive match of `search` against the text or the category.
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.question_text.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
    }

    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// Question form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

/// A question that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    pub category: String,
    pub options: Vec<QuestionOption>,
}

impl QuestionForm {
    pub fn validate(&self) -> Result<QuestionDraft, ValidationError> {
        if self.question_text.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "Question text",
            });
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::Required { field: "Category" });
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(ValidationError::TooFewOptions { min: MIN_OPTIONS });
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(ValidationError::TooManyOptions { max: MAX_OPTIONS });
        }
        if self.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(ValidationError::BlankOption);
        }
        match self.options.iter().filter(|o| o.is_correct).count() {
            0 => return Err(ValidationError::NoCorrectOption),
            1 => {}
            _ => return Err(ValidationError::MultipleCorrectOptions),
        }

        Ok(QuestionDraft {
            question_text: self.question_text.trim().to_string(),
            category: self.category.trim().to_string(),
            options: self
                .options
                .iter()
                .map(|o| QuestionOption {
                    text: o.text.trim().to_string(),
                    is_correct: o.is_correct,
                })
                .collect(),
        })
    }
}
