//! Assessment templates: named, publishable bundles of bank questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::questions::BankQuestion;
use crate::error::ValidationError;

/// A stored template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTemplate {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub question_ids: Vec<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// Template form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub question_ids: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

/// A template that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    pub title: String,
    pub description: String,
    pub question_ids: Vec<String>,
    pub published: bool,
}

impl TemplateForm {
    /// Validate against the creator's own bank; every selected id must be in it.
    /// Duplicate selections collapse to the first occurrence.
    pub fn validate(&self, bank: &[BankQuestion]) -> Result<TemplateDraft, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Required { field: "Title" });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "Description",
            });
        }
        if self.question_ids.is_empty() {
            return Err(ValidationError::NoQuestionsSelected);
        }

        let mut question_ids: Vec<String> = Vec::with_capacity(self.question_ids.len());
        for id in &self.question_ids {
            if !bank.iter().any(|q| &q.id == id) {
                return Err(ValidationError::UnknownQuestion { id: id.clone() });
            }
            if !question_ids.contains(id) {
                question_ids.push(id.clone());
            }
        }

        Ok(TemplateDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            question_ids,
            published: self.published,
        })
    }
}

/// Notice text for a publish toggle that moved the template to `published`.
pub fn publish_message(published: bool) -> &'static str {
    if published {
        "Template published successfully"
    } else {
        "Template unpublished successfully"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::educator::questions::QuestionOption;

    fn bank() -> Vec<BankQuestion> {
        ["q1", "q2"]
            .iter()
            .map(|id| BankQuestion {
                id: id.to_string(),
                creator_id: "2".into(),
                question_text: format!("Question {id}"),
                category: "Technical".into(),
                options: vec![
                    QuestionOption {
                        text: "a".into(),
                        is_correct: true,
                    },
                    QuestionOption {
                        text: "b".into(),
                        is_correct: false,
                    },
                ],
                created_at: Utc::now(),
            })
            .collect()
    }

    fn form(ids: &[&str]) -> TemplateForm {
        TemplateForm {
            title: "Intro to tech careers".into(),
            description: "Short screening quiz".into(),
            question_ids: ids.iter().map(|s| s.to_string()).collect(),
            published: false,
        }
    }

    #[test]
    fn required_fields_in_order() {
        let mut f = form(&[]);
        f.title = String::new();
        assert_eq!(f.validate(&bank()).unwrap_err().to_string(), "Title is required");
        f.title = "t".into();
        f.description = "  ".into();
        assert_eq!(
            f.validate(&bank()).unwrap_err().to_string(),
            "Description is required"
        );
        f.description = "d".into();
        assert_eq!(
            f.validate(&bank()).unwrap_err().to_string(),
            "Please select at least one question"
        );
    }

    #[test]
    fn unknown_question_rejected() {
        let err = form(&["q1", "nope"]).validate(&bank()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownQuestion { id: "nope".into() });
    }

    #[test]
    fn duplicates_collapse_in_order() {
        let draft = form(&["q2", "q1", "q2"]).validate(&bank()).unwrap();
        assert_eq!(draft.question_ids, vec!["q2", "q1"]);
    }

    #[test]
    fn publish_messages() {
        assert_eq!(publish_message(true), "Template published successfully");
        assert_eq!(publish_message(false), "Template unpublished successfully");
    }
}
