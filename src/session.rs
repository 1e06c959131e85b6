//! One player's conversation with the bot: turns keyboard input and
//! countdown events into what the bot should say next.

use log::debug;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::quiz::{Phase, Quiz, QuizError, QuizEvent, QuizManager, User};
use crate::render;

/// Seconds left at which the player gets a reminder.
pub const REMINDERS: [u32; 2] = [10, 5];

const TIME_UP: &str = "⏰ Time's up!";
const MISSED: &str = "⏰ Time ran out before your answer arrived, it was not recorded.";

/// What to tell the player once the session lock is released.
#[derive(Debug)]
pub enum Outcome {
    Question { text: String, keyboard: KeyboardMarkup },
    Results { text: String, kinds: Vec<String> },
    Message(String),
    Lost,
}

#[derive(Debug)]
pub struct Session {
    manager: QuizManager,
    // question the player was last shown, answers only count against it
    shown_index: Option<usize>,
}

impl Session {
    pub fn new(manager: QuizManager) -> Self {
        Self {
            manager,
            shown_index: None,
        }
    }

    pub fn manager(&self) -> &QuizManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut QuizManager {
        &mut self.manager
    }

    pub fn set_user(&mut self, name: &str) {
        self.manager.set_current_user(User::new(name));
    }

    pub fn quiz_kinds(&self) -> Vec<String> {
        self.manager
            .quiz_types()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn stats(&self) -> Outcome {
        match self.manager.current_user() {
            Some(user) => Outcome::Message(render::stats_text(user.name(), &user.stats())),
            None => Outcome::Lost,
        }
    }

    /// Starts a quiz of the given type and shows its first question.
    /// Returns `None` for an unknown type.
    pub fn start_quiz(
        &mut self,
        kind: &str,
    ) -> Result<Option<(Outcome, UnboundedReceiver<QuizEvent>)>, QuizError> {
        let Some(quiz) = self.manager.create_quiz(kind) else {
            return Ok(None);
        };
        let events = quiz.subscribe();
        quiz.start()?;
        Ok(Some((self.show_question(None), events)))
    }

    pub fn handle_input(&mut self, input: &str) -> Result<Outcome, QuizError> {
        let Some(quiz) = self.manager.current_quiz_mut() else {
            return Ok(Outcome::Lost);
        };
        if quiz.phase() != Phase::InProgress {
            let text = render::results_text(&quiz.summary());
            self.manager.clear_current_quiz();
            self.shown_index = None;
            return Ok(Outcome::Results {
                text,
                kinds: self.quiz_kinds(),
            });
        }
        if input == render::SUBMIT_BUTTON {
            return Ok(self.finish(None));
        }
        if quiz.is_last_question() && quiz.time_remaining() == 0 {
            // the countdown expired, its event has not been handled yet
            return Ok(self.finish(Some(TIME_UP)));
        }
        if self.shown_index != Some(quiz.current_question_index()) {
            debug!(
                "dropping '{}', question {} moved on without the player",
                input,
                quiz.current_question_index()
            );
            return Ok(self.show_question(Some(MISSED)));
        }

        match input {
            render::PREVIOUS_BUTTON => {
                quiz.previous_question();
                Ok(self.show_question(None))
            }
            render::NEXT_BUTTON => {
                if quiz.next_question() {
                    return Ok(self.show_question(None));
                }
                Ok(self.finish(None))
            }
            other => {
                let Some(answer) = render::answer_for_button(quiz.current_question(), other) else {
                    return Ok(Outcome::Message(
                        "Please pick one of the options on the keyboard".to_string(),
                    ));
                };
                let correct = quiz.submit_answer(&answer)?;
                debug!("answer {} was {}", answer, if correct { "correct" } else { "wrong" });

                if quiz.next_question() {
                    return Ok(self.show_question(None));
                }
                Ok(self.finish(None))
            }
        }
    }

    /// Events about a quiz that has since moved on or finished are dropped.
    pub fn handle_timer_event(&mut self, event: QuizEvent) -> Option<Outcome> {
        let quiz = self.manager.current_quiz()?;
        if quiz.phase() != Phase::InProgress {
            return None;
        }
        let current = quiz.current_question_index();

        match event {
            QuizEvent::Tick { index, remaining } => {
                let watched = index == current && self.shown_index == Some(index);
                (watched && REMINDERS.contains(&remaining))
                    .then(|| Outcome::Message(render::reminder_text(remaining)))
            }
            QuizEvent::AutoAdvanced { index } if index == current => {
                Some(self.show_question(Some(TIME_UP)))
            }
            QuizEvent::TimeExpired { index } if index == current => {
                Some(self.finish(Some(TIME_UP)))
            }
            QuizEvent::AutoAdvanced { .. } | QuizEvent::TimeExpired { .. } => None,
        }
    }

    fn show_question(&mut self, notice: Option<&str>) -> Outcome {
        let Some(quiz) = self.manager.current_quiz() else {
            return Outcome::Lost;
        };
        self.shown_index = Some(quiz.current_question_index());
        question_outcome(quiz, notice)
    }

    /// Ends the current quiz, credits the player and drops the quiz along
    /// with its countdown.
    fn finish(&mut self, notice: Option<&str>) -> Outcome {
        let outcome = match self.manager.finish_quiz() {
            Some(summary) => Outcome::Results {
                text: with_notice(notice, render::results_text(&summary)),
                kinds: self.quiz_kinds(),
            },
            None => Outcome::Lost,
        };
        self.manager.clear_current_quiz();
        self.shown_index = None;
        outcome
    }
}

pub fn question_outcome(quiz: &Quiz, notice: Option<&str>) -> Outcome {
    let options = render::option_buttons(quiz.current_question())
        .into_iter()
        .map(KeyboardButton::new)
        .collect::<Vec<_>>();

    let mut navigation = Vec::new();
    if quiz.current_question_index() > 0 {
        navigation.push(KeyboardButton::new(render::PREVIOUS_BUTTON));
    }
    navigation.push(KeyboardButton::new(render::NEXT_BUTTON));
    navigation.push(KeyboardButton::new(render::SUBMIT_BUTTON));

    Outcome::Question {
        text: with_notice(notice, render::question_text(quiz)),
        keyboard: KeyboardMarkup::new(vec![options, navigation]),
    }
}

fn with_notice(notice: Option<&str>, text: String) -> String {
    match notice {
        Some(notice) => format!("{}\n\n{}", notice, text),
        None => text,
    }
}
