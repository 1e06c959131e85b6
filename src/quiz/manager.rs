use std::sync::Arc;

use log::{info, warn};

use super::bank::QuestionBank;
use super::{Phase, Quiz, QuizSummary};
use super::user::User;

/// Creates quizzes from the bank and keeps track of the quiz being played
/// and the user playing it. One manager per player session.
#[derive(Debug)]
pub struct QuizManager {
    bank: Arc<QuestionBank>,
    time_per_question: u32,
    current_quiz: Option<Quiz>,
    current_user: Option<User>,
}

impl QuizManager {
    pub fn new(bank: Arc<QuestionBank>, time_per_question: u32) -> Self {
        Self {
            bank,
            time_per_question,
            current_quiz: None,
            current_user: None,
        }
    }

    /// Replaces the current quiz with a fresh one of the given type. An
    /// unknown type returns `None` and leaves the current quiz alone.
    pub fn create_quiz(&mut self, kind: &str) -> Option<&mut Quiz> {
        let questions = self.bank.get(kind)?;
        let quiz = match Quiz::new(questions, self.time_per_question) {
            Ok(quiz) => quiz,
            Err(err) => {
                warn!("cannot create a '{}' quiz: {}", kind, err);
                return None;
            }
        };
        info!("created '{}' quiz", kind);
        self.current_quiz = Some(quiz);
        self.current_quiz.as_mut()
    }

    pub fn current_quiz(&self) -> Option<&Quiz> {
        self.current_quiz.as_ref()
    }

    pub fn current_quiz_mut(&mut self) -> Option<&mut Quiz> {
        self.current_quiz.as_mut()
    }

    /// Drops the current quiz, cancelling its countdown.
    pub fn clear_current_quiz(&mut self) -> Option<Quiz> {
        self.current_quiz.take()
    }

    pub fn set_current_user(&mut self, user: User) {
        self.current_user = Some(user);
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn current_user_mut(&mut self) -> Option<&mut User> {
        self.current_user.as_mut()
    }

    pub fn quiz_types(&self) -> Vec<&str> {
        self.bank.kinds().collect()
    }

    /// Ends the current quiz and credits the current user with it. A quiz
    /// that has already ended is never credited again.
    pub fn finish_quiz(&mut self) -> Option<QuizSummary> {
        let quiz = self.current_quiz.as_mut()?;
        let user = self.current_user.as_mut()?;
        if quiz.phase() == Phase::Ended {
            return None;
        }

        quiz.end();
        user.complete_quiz(quiz);
        let summary = quiz.summary();
        info!(
            "{} finished a quiz with {}/{}",
            user.name(),
            summary.score,
            summary.total_points
        );
        Some(summary)
    }
}
