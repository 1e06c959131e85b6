use serde::Deserialize;

/// A single quiz question. The answer key decides how answers are checked
/// and which options the presentation offers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    id: u32,
    text: String,
    #[serde(default = "default_points")]
    points: u32,
    answer: AnswerKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerKey {
    MultipleChoice { options: Vec<String>, correct: String },
    TrueFalse { correct: bool },
}

/// One selectable choice. `value` is exactly what `Question::check_answer` expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub value: String,
    pub prefix: String,
    pub text: String,
}

fn default_points() -> u32 {
    1
}

/// Letter code of the option at `index`: 0 -> 'A', 1 -> 'B', ...
pub fn letter_code(index: usize) -> Option<char> {
    if index >= 26 {
        return None;
    }
    char::from_u32('A' as u32 + index as u32)
}

impl Question {
    pub fn multiple_choice(
        id: u32,
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            points: default_points(),
            answer: AnswerKey::MultipleChoice {
                options,
                correct: correct.into(),
            },
        }
    }

    pub fn true_false(id: u32, text: impl Into<String>, correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            points: default_points(),
            answer: AnswerKey::TrueFalse { correct },
        }
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer
    }

    /// Never fails: anything that is not the expected value is simply wrong.
    pub fn check_answer(&self, answer: &str) -> bool {
        match &self.answer {
            AnswerKey::MultipleChoice { correct, .. } => answer == correct,
            AnswerKey::TrueFalse { correct } => (answer == "true") == *correct,
        }
    }

    pub fn options(&self) -> Vec<AnswerOption> {
        match &self.answer {
            AnswerKey::MultipleChoice { options, .. } => options
                .iter()
                .enumerate()
                .filter_map(|(i, option)| {
                    let letter = letter_code(i)?.to_string();
                    Some(AnswerOption {
                        value: letter.clone(),
                        prefix: letter,
                        text: option.clone(),
                    })
                })
                .collect(),
            AnswerKey::TrueFalse { .. } => vec![
                AnswerOption {
                    value: "true".to_string(),
                    prefix: "T".to_string(),
                    text: "True".to_string(),
                },
                AnswerOption {
                    value: "false".to_string(),
                    prefix: "F".to_string(),
                    text: "False".to_string(),
                },
            ],
        }
    }
}
