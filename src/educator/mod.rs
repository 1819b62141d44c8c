//! Educator tools: the question bank and assessment templates.

pub mod questions;
pub mod routes;
pub mod templates;

pub use questions::{BankQuestion, QuestionDraft, QuestionForm, QuestionOption};
pub use templates::{AssessmentTemplate, TemplateDraft, TemplateForm};
