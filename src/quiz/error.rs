use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("a quiz needs at least one question")]
    NoQuestions,

    #[error("time per question must be a positive number of seconds")]
    InvalidTimeLimit,

    #[error("question {id} is worth no points")]
    ZeroPoints { id: u32 },

    #[error("the quiz has already been started")]
    AlreadyStarted,

    #[error("the quiz is not in progress")]
    NotInProgress,

    #[error("the countdown needs a running tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse question bank: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("quiz type '{0}' is defined more than once")]
    DuplicateKind(String),

    #[error("quiz type '{0}' has no questions")]
    EmptyKind(String),

    #[error("question {id} in '{kind}' is invalid: {reason}")]
    InvalidQuestion { kind: String, id: u32, reason: String },
}
