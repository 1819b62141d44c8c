//! Quiz runner: one answer slot per question, forward-only progression.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::question::Question;
use crate::error::QuizError;
use crate::notify::{Notice, Notifier};

/// Fired once each time the quiz reaches `Completed`.
pub const COMPLETION_NOTICE: &str = "Assessment completed! Here are your career matches.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum QuizState {
    /// Showing the question at this position.
    InProgress(usize),
    Completed,
}

/// Result of [`QuizRunner::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "index", rename_all = "snake_case")]
pub enum Advance {
    /// Current question is unanswered; nothing changed.
    Blocked,
    Moved(usize),
    /// The last question was answered and the quiz finished.
    Completed,
    /// Already completed; nothing changed.
    Ignored,
}

pub struct QuizRunner {
    questions: Vec<Question>,
    answers: Vec<Option<String>>,
    state: QuizState,
    /// User whose answers are held. Answers never outlive a change of user.
    owner: Option<String>,
    notifier: Arc<dyn Notifier>,
}

impl QuizRunner {
    /// A quiz with no questions starts (silently) completed.
    pub fn new(questions: Vec<Question>, notifier: Arc<dyn Notifier>) -> Self {
        let state = if questions.is_empty() {
            QuizState::Completed
        } else {
            QuizState::InProgress(0)
        };
        Self {
            answers: vec![None; questions.len()],
            questions,
            state,
            owner: None,
            notifier,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Bind the quiz to `user_id`, discarding another user's answers.
    ///
    /// Returns `true` when a previous owner's progress was dropped.
    pub fn claim(&mut self, user_id: &str) -> bool {
        if self.owner.as_deref() == Some(user_id) {
            return false;
        }
        let dropped = self.owner.is_some();
        if dropped {
            debug!(previous = ?self.owner, user_id, "Quiz changed hands; resetting");
        }
        self.reset();
        self.owner = Some(user_id.to_string());
        dropped
    }

    /// Reset and forget the owner.
    pub fn release(&mut self) {
        self.reset();
        self.owner = None;
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::InProgress(i) => self.questions.get(i),
            QuizState::Completed => None,
        }
    }

    /// Record `value` for the question at `index` without moving.
    pub fn select_answer(&mut self, index: usize, value: &str) -> Result<(), QuizError> {
        if self.state == QuizState::Completed {
            return Err(QuizError::AlreadyCompleted);
        }
        let question = self.questions.get(index).ok_or(QuizError::IndexOutOfRange {
            index,
            total: self.questions.len(),
        })?;
        if !question.has_option(value) {
            return Err(QuizError::UnknownOption {
                index,
                value: value.to_string(),
            });
        }
        self.answers[index] = Some(value.to_string());
        Ok(())
    }

    pub fn advance(&mut self) -> Advance {
        let QuizState::InProgress(i) = self.state else {
            return Advance::Ignored;
        };
        if self.answers[i].is_none() {
            return Advance::Blocked;
        }
        if i + 1 < self.questions.len() {
            self.state = QuizState::InProgress(i + 1);
            debug!(index = i + 1, "Quiz advanced");
            Advance::Moved(i + 1)
        } else {
            self.state = QuizState::Completed;
            self.notifier.notify(Notice::success(COMPLETION_NOTICE));
            Advance::Completed
        }
    }

    /// Back to the first question with every answer cleared.
    pub fn reset(&mut self) {
        self.answers.iter_mut().for_each(|a| *a = None);
        self.state = if self.questions.is_empty() {
            QuizState::Completed
        } else {
            QuizState::InProgress(0)
        };
    }

    /// The full answer set, available only once completed.
    pub fn completed_answers(&self) -> Result<Vec<String>, QuizError> {
        if self.state != QuizState::Completed {
            return Err(QuizError::NotCompleted);
        }
        // Completion requires every slot to have been answered in turn.
        Ok(self.answers.iter().flatten().cloned().collect())
    }
}
