use std::path::PathBuf;

use thiserror::Error;

use crate::quiz::DEFAULT_TIME_PER_QUESTION;

pub const TIME_PER_QUESTION_VAR: &str = "QUIZ_TIME_PER_QUESTION";
pub const BANK_PATH_VAR: &str = "QUIZ_BANK_PATH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeLimit { var: &'static str, value: String },
}

/// Runtime settings read from the environment. The bot token itself is
/// picked up by teloxide from `TELOXIDE_TOKEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub time_per_question: u32,
    /// Replaces the built-in question bank when set.
    pub bank_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_per_question: DEFAULT_TIME_PER_QUESTION,
            bank_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(TIME_PER_QUESTION_VAR) {
            config.time_per_question = match value.trim().parse::<u32>() {
                Ok(seconds) if seconds > 0 => seconds,
                _ => {
                    return Err(ConfigError::InvalidTimeLimit {
                        var: TIME_PER_QUESTION_VAR,
                        value,
                    })
                }
            };
        }

        config.bank_path = lookup(BANK_PATH_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
