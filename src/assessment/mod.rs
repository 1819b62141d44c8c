//! The career-interest assessment: questions, quiz runner, matches, history.

pub mod history;
pub mod matches;
pub mod question;
pub mod quiz;
pub mod routes;

pub use history::{AssessmentRecord, NewAssessment};
pub use matches::{CareerMatch, career_catalog, sort_by_match_descending};
pub use question::{Question, career_interest_questions};
pub use quiz::{Advance, QuizRunner, QuizState};
