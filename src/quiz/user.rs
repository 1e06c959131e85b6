use super::Quiz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    quizzes_taken: u32,
    total_score: u32,
    total_possible_score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub quizzes_taken: u32,
    pub total_score: u32,
    pub total_possible_score: u32,
    pub average_score: f64,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quizzes_taken: 0,
            total_score: 0,
            total_possible_score: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Credits the user with a finished quiz. Not idempotent: the caller
    /// must report each quiz exactly once.
    pub fn complete_quiz(&mut self, quiz: &Quiz) {
        self.quizzes_taken += 1;
        self.total_score += quiz.score();
        self.total_possible_score += quiz.total_points();
    }

    /// Percentage over every completed quiz, 0 before the first one.
    pub fn average_score(&self) -> f64 {
        if self.quizzes_taken == 0 {
            return 0.0;
        }
        self.total_score as f64 * 100.0 / self.total_possible_score as f64
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            quizzes_taken: self.quizzes_taken,
            total_score: self.total_score,
            total_possible_score: self.total_possible_score,
            average_score: self.average_score(),
        }
    }
}
