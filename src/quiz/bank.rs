use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

use super::error::BankError;
use super::question::{letter_code, AnswerKey, Question};

const BUILTIN_BANK: &str = include_str!("bank.toml");

#[derive(Debug, Deserialize)]
struct BankFile {
    quiz: Vec<QuizSet>,
}

#[derive(Debug, Deserialize)]
struct QuizSet {
    kind: String,
    questions: Vec<Question>,
}

/// Quiz types mapped to their ordered question lists, in the order they
/// were defined. Fixed once loaded.
#[derive(Debug)]
pub struct QuestionBank {
    quizzes: Vec<(String, Arc<[Question]>)>,
}

impl QuestionBank {
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_toml_str(BUILTIN_BANK)
    }

    pub fn load(path: &Path) -> Result<Self, BankError> {
        let contents = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, BankError> {
        let file: BankFile = toml::from_str(contents)?;

        let mut kinds = HashSet::new();
        let mut quizzes = Vec::with_capacity(file.quiz.len());
        for set in file.quiz {
            if !kinds.insert(set.kind.clone()) {
                return Err(BankError::DuplicateKind(set.kind));
            }
            validate(&set)?;
            debug!("loaded {} questions for '{}'", set.questions.len(), set.kind);
            quizzes.push((set.kind, set.questions.into()));
        }

        Ok(Self { quizzes })
    }

    pub fn get(&self, kind: &str) -> Option<Arc<[Question]>> {
        self.quizzes
            .iter()
            .find(|(name, _)| name == kind)
            .map(|(_, questions)| questions.clone())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.quizzes.iter().map(|(name, _)| name.as_str())
    }
}

fn validate(set: &QuizSet) -> Result<(), BankError> {
    if set.questions.is_empty() {
        return Err(BankError::EmptyKind(set.kind.clone()));
    }

    let invalid = |question: &Question, reason: String| BankError::InvalidQuestion {
        kind: set.kind.clone(),
        id: question.id(),
        reason,
    };

    let mut ids = HashSet::new();
    for question in &set.questions {
        if !ids.insert(question.id()) {
            warn!("quiz '{}' reuses question id {}", set.kind, question.id());
        }
        if question.points() == 0 {
            return Err(invalid(question, "points must be positive".to_string()));
        }
        if let AnswerKey::MultipleChoice { options, correct } = question.answer_key() {
            if options.is_empty() {
                return Err(invalid(question, "no options".to_string()));
            }
            if letter_code(options.len() - 1).is_none() {
                return Err(invalid(
                    question,
                    format!("{} options, at most 26 can be lettered", options.len()),
                ));
            }
            let known = (0..options.len())
                .filter_map(letter_code)
                .any(|letter| correct.len() == 1 && correct.starts_with(letter));
            if !known {
                return Err(invalid(
                    question,
                    format!("answer '{}' does not name one of the options", correct),
                ));
            }
        }
    }
    Ok(())
}
