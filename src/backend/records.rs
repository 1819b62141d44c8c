//! Wire rows for the hosted record store and their conversion into domain records.
//!
//! Rows arrive as loosely shaped JSON. Each row type is parsed once here and
//! converted with `TryFrom`; the rest of the crate only sees validated records.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Profile;
use crate::assessment::history::{AssessmentRecord, NewAssessment};
use crate::educator::questions::{BankQuestion, QuestionDraft, QuestionOption};
use crate::educator::templates::{AssessmentTemplate, TemplateDraft};
use crate::error::BackendError;

fn ingest_error(entity: &str, reason: impl Into<String>) -> BackendError {
    BackendError::Ingest {
        entity: entity.to_string(),
        reason: reason.into(),
    }
}

/// Parse a JSON array of rows, dropping (and logging) rows that fail validation.
pub fn ingest_rows<R, T>(entity: &str, body: serde_json::Value) -> Result<Vec<T>, BackendError>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = BackendError>,
{
    let items = match body {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(ingest_error(
                entity,
                format!("expected an array, got {}", json_kind(&other)),
            ));
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let parsed = serde_json::from_value::<R>(item)
            .map_err(|e| ingest_error(entity, e.to_string()))
            .and_then(T::try_from);
        match parsed {
            Ok(record) => out.push(record),
            Err(e) => warn!(entity, error = %e, "Skipping malformed row"),
        }
    }
    Ok(out)
}

/// Parse the single row returned by an insert/update with `return=representation`.
pub fn ingest_one<R, T>(entity: &str, body: serde_json::Value) -> Result<T, BackendError>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = BackendError>,
{
    let item = match body {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        serde_json::Value::Array(_) => {
            return Err(ingest_error(entity, "no row returned"));
        }
        obj @ serde_json::Value::Object(_) => obj,
        other => {
            return Err(ingest_error(
                entity,
                format!("expected a row, got {}", json_kind(&other)),
            ));
        }
    };
    let row: R = serde_json::from_value(item).map_err(|e| ingest_error(entity, e.to_string()))?;
    T::try_from(row)
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ── Profiles ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = BackendError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        // The profiles table defaults role to 'student'.
        let role = match row.role.as_deref() {
            None | Some("") => Default::default(),
            Some(raw) => raw.parse().map_err(|e: String| ingest_error("profile", e))?,
        };
        Ok(Profile {
            id: row.id,
            username: row.username.filter(|s| !s.is_empty()),
            role,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar_url: row.avatar_url,
        })
    }
}

// ── Questions ───────────────────────────────────────────────────────

/// Option as stored in the `options` JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionRow {
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRow {
    pub id: String,
    pub creator_id: String,
    pub question_text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for BankQuestion {
    type Error = BackendError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let options: Vec<OptionRow> = match row.options {
            serde_json::Value::Null => Vec::new(),
            value => serde_json::from_value(value).map_err(|e| {
                ingest_error("assessment_question", format!("bad options for {}: {e}", row.id))
            })?,
        };
        Ok(BankQuestion {
            id: row.id,
            creator_id: row.creator_id,
            question_text: row.question_text,
            category: row.category.unwrap_or_default(),
            options: options
                .into_iter()
                .map(|o| QuestionOption {
                    text: o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionInsert<'a> {
    pub creator_id: &'a str,
    pub question_text: &'a str,
    pub category: &'a str,
    pub options: Vec<OptionRow>,
}

impl<'a> QuestionInsert<'a> {
    pub fn new(creator_id: &'a str, draft: &'a QuestionDraft) -> Self {
        Self {
            creator_id,
            question_text: &draft.question_text,
            category: &draft.category,
            options: draft
                .options
                .iter()
                .map(|o| OptionRow {
                    text: o.text.clone(),
                    is_correct: o.is_correct,
                })
                .collect(),
        }
    }
}

// ── Templates ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TemplateRow {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub question_ids: Vec<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for AssessmentTemplate {
    type Error = BackendError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        if row.title.trim().is_empty() {
            return Err(ingest_error("assessment_template", format!("{} has no title", row.id)));
        }
        Ok(AssessmentTemplate {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            description: row.description.filter(|d| !d.is_empty()),
            question_ids: row.question_ids,
            published: row.published,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateInsert<'a> {
    pub creator_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub question_ids: &'a [String],
    pub published: bool,
}

impl<'a> TemplateInsert<'a> {
    pub fn new(creator_id: &'a str, draft: &'a TemplateDraft) -> Self {
        Self {
            creator_id,
            title: &draft.title,
            description: &draft.description,
            question_ids: &draft.question_ids,
            published: draft.published,
        }
    }
}

// ── Assessments ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssessmentRow {
    pub id: String,
    pub user_id: String,
    pub assessment_type: String,
    #[serde(default)]
    pub responses: serde_json::Value,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for AssessmentRecord {
    type Error = BackendError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let responses: Vec<String> = serde_json::from_value(row.responses).map_err(|e| {
            ingest_error("assessment", format!("bad responses for {}: {e}", row.id))
        })?;
        Ok(AssessmentRecord {
            id: row.id,
            user_id: row.user_id,
            assessment_type: row.assessment_type,
            responses,
            completed_at: row.completed_at.unwrap_or(row.created_at),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AssessmentInsert<'a> {
    pub user_id: &'a str,
    pub assessment_type: &'a str,
    pub responses: &'a [String],
    pub completed_at: DateTime<Utc>,
}

impl<'a> From<&'a NewAssessment> for AssessmentInsert<'a> {
    fn from(record: &'a NewAssessment) -> Self {
        Self {
            user_id: &record.user_id,
            assessment_type: &record.assessment_type,
            responses: &record.responses,
            completed_at: record.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::UserRole;

    #[test]
    fn profile_role_is_parsed() {
        let row: ProfileRow = serde_json::from_value(json!({
            "id": "u1", "username": "teacher", "role": "educator",
            "first_name": "Teacher", "last_name": null, "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let profile = Profile::try_from(row).unwrap();
        assert_eq!(profile.role, UserRole::Educator);
        assert_eq!(profile.username.as_deref(), Some("teacher"));
    }

    #[test]
    fn profile_unknown_role_is_rejected() {
        let row: ProfileRow = serde_json::from_value(json!({"id": "u1", "role": "root"})).unwrap();
        let err = Profile::try_from(row).unwrap_err();
        assert!(matches!(err, BackendError::Ingest { .. }));
    }

    #[test]
    fn profile_missing_role_defaults_to_student() {
        let row: ProfileRow = serde_json::from_value(json!({"id": "u1"})).unwrap();
        assert_eq!(Profile::try_from(row).unwrap().role, UserRole::Student);
    }

    #[test]
    fn question_rows_ingest_and_skip_malformed() {
        let body = json!([
            {
                "id": "q1", "creator_id": "2", "question_text": "Pick one",
                "category": null,
                "options": [{"text": "A", "isCorrect": true}, {"text": "B"}],
                "created_at": "2024-03-01T10:00:00.123456+00:00"
            },
            {
                "id": "q2", "creator_id": "2", "question_text": "Broken",
                "options": "not-a-list",
                "created_at": "2024-03-01T10:00:00Z"
            }
        ]);
        let questions: Vec<BankQuestion> =
            ingest_rows::<QuestionRow, _>("assessment_question", body).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].category, "");
        assert!(questions[0].options[0].is_correct);
        assert!(!questions[0].options[1].is_correct);
    }

    #[test]
    fn non_array_body_is_an_error() {
        let err = ingest_rows::<QuestionRow, BankQuestion>("assessment_question", json!({"x": 1}))
            .unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn ingest_one_takes_first_row() {
        let body = json!([{
            "id": "t1", "creator_id": "2", "title": "Intro", "description": "",
            "question_ids": ["q1"], "published": true, "created_at": "2024-03-01T10:00:00Z"
        }]);
        let t: AssessmentTemplate = ingest_one::<TemplateRow, _>("assessment_template", body).unwrap();
        assert_eq!(t.id, "t1");
        assert!(t.description.is_none());
        assert!(t.published);

        let err = ingest_one::<TemplateRow, AssessmentTemplate>("assessment_template", json!([]))
            .unwrap_err();
        assert!(err.to_string().contains("no row returned"));
    }

    #[test]
    fn assessment_completed_at_falls_back_to_created_at() {
        let row: AssessmentRow = serde_json::from_value(json!({
            "id": "a1", "user_id": "3", "assessment_type": "career_interests",
            "responses": ["A", "B"], "completed_at": null,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        let created = row.created_at;
        let record = AssessmentRecord::try_from(row).unwrap();
        assert_eq!(record.completed_at, created);
        assert_eq!(record.responses, vec!["A", "B"]);
    }

    #[test]
    fn question_insert_uses_camel_case_options() {
        let draft = QuestionDraft {
            question_text: "q".into(),
            category: "c".into(),
            options: vec![QuestionOption {
                text: "A".into(),
                is_correct: true,
            }],
        };
        let body = serde_json::to_value(QuestionInsert::new("2", &draft)).unwrap();
        assert_eq!(body["options"][0]["isCorrect"], true);
        assert_eq!(body["creator_id"], "2");
    }
}
