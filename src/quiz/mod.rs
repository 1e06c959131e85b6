pub mod bank;
pub mod error;
pub mod manager;
pub mod question;
pub mod timer;
pub mod user;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

pub use bank::QuestionBank;
pub use error::{BankError, QuizError};
pub use manager::QuizManager;
pub use question::{AnswerKey, AnswerOption, Question};
pub use user::{User, UserStats};

use timer::{Countdown, TICK};

pub const DEFAULT_TIME_PER_QUESTION: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Ended,
}

/// What the countdown did, as opposed to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    /// One second passed on the question at `index`.
    Tick { index: usize, remaining: u32 },
    /// Time ran out and the quiz moved on to the question at `index`.
    AutoAdvanced { index: usize },
    /// Time ran out on the last question; nothing left to advance to.
    TimeExpired { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    pub score: u32,
    pub total_points: u32,
    pub percentage: f64,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub time_spent: Duration,
}

#[derive(Debug)]
struct QuizState {
    len: usize,
    index: usize,
    score: u32,
    time_per_question: u32,
    time_remaining: u32,
    answers: Vec<Option<String>>,
    phase: Phase,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    // Bumped on every countdown restart; a tick from an older generation is stale.
    generation: u64,
    events: Option<mpsc::UnboundedSender<QuizEvent>>,
}

impl QuizState {
    fn advance(&mut self) -> bool {
        if self.index + 1 >= self.len {
            return false;
        }
        self.index += 1;
        self.time_remaining = self.time_per_question;
        true
    }

    fn emit(&self, event: QuizEvent) {
        if let Some(events) = &self.events {
            // nobody listening is fine
            let _ = events.send(event);
        }
    }
}

/// One attempt at a question set.
///
/// The questions are shared with the bank and never mutated. Everything that
/// changes during the attempt lives behind a mutex shared with the countdown
/// task, which holds only a weak reference to it.
#[derive(Debug)]
pub struct Quiz {
    questions: Arc<[Question]>,
    state: Arc<Mutex<QuizState>>,
    countdown: Countdown,
}

impl Quiz {
    pub fn new(questions: Arc<[Question]>, time_per_question: u32) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if time_per_question == 0 {
            return Err(QuizError::InvalidTimeLimit);
        }
        if let Some(question) = questions.iter().find(|question| question.points() == 0) {
            return Err(QuizError::ZeroPoints { id: question.id() });
        }

        let state = QuizState {
            len: questions.len(),
            index: 0,
            score: 0,
            time_per_question,
            time_remaining: time_per_question,
            answers: vec![None; questions.len()],
            phase: Phase::NotStarted,
            started_at: None,
            ended_at: None,
            generation: 0,
            events: None,
        };

        Ok(Self {
            questions,
            state: Arc::new(Mutex::new(state)),
            countdown: Countdown::default(),
        })
    }

    /// Receives the transitions made by the countdown. A new subscription
    /// replaces the previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<QuizEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().events = Some(tx);
        rx
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        {
            let mut state = self.lock();
            if state.phase != Phase::NotStarted {
                return Err(QuizError::AlreadyStarted);
            }
            // Fail before touching the state if no countdown can be scheduled.
            tokio::runtime::Handle::try_current().map_err(|_| QuizError::NoRuntime)?;
            state.phase = Phase::InProgress;
            state.started_at = Some(Instant::now());
        }
        debug!("quiz started with {} questions", self.questions.len());
        self.start_timer()
    }

    /// Records `answer` for the current question and reports whether it was
    /// correct. Answering the same question again overwrites the stored
    /// answer, but every correct submission adds the question's points.
    pub fn submit_answer(&mut self, answer: &str) -> Result<bool, QuizError> {
        let mut state = self.lock();
        if state.phase != Phase::InProgress {
            return Err(QuizError::NotInProgress);
        }

        let index = state.index;
        let question = &self.questions[index];
        if state.answers[index].is_some() {
            debug!("question {} answered again", index + 1);
        }
        state.answers[index] = Some(answer.to_string());

        if question.check_answer(answer) {
            state.score += question.points();
            return Ok(true);
        }
        Ok(false)
    }

    pub fn next_question(&mut self) -> bool {
        let moved = {
            let mut state = self.lock();
            state.phase == Phase::InProgress && state.advance()
        };
        self.after_navigation(moved)
    }

    pub fn previous_question(&mut self) -> bool {
        let moved = {
            let mut state = self.lock();
            if state.phase != Phase::InProgress || state.index == 0 {
                false
            } else {
                state.index -= 1;
                state.time_remaining = state.time_per_question;
                true
            }
        };
        self.after_navigation(moved)
    }

    pub fn end(&mut self) {
        self.countdown.cancel();
        let mut state = self.lock();
        if state.phase == Phase::Ended {
            return;
        }
        state.phase = Phase::Ended;
        state.ended_at = Some(Instant::now());
        state.generation += 1;
        debug!("quiz ended with score {}", state.score);
    }

    fn after_navigation(&mut self, moved: bool) -> bool {
        if !moved {
            return false;
        }
        debug!("moved to question {}", self.current_question_index() + 1);
        // Navigation only happens while in progress, which already proved a runtime exists.
        if let Err(err) = self.start_timer() {
            log::error!("failed to restart the countdown: {}", err);
        }
        true
    }

    fn start_timer(&mut self) -> Result<(), QuizError> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.time_remaining = state.time_per_question;
            state.generation
        };
        let state = Arc::downgrade(&self.state);
        self.countdown.restart(run_countdown(state, generation))
    }

    fn lock(&self) -> MutexGuard<'_, QuizState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_question_index()]
    }

    pub fn current_question_index(&self) -> usize {
        self.lock().index
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index() + 1 == self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.lock().score
    }

    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(Question::points).sum()
    }

    pub fn time_per_question(&self) -> u32 {
        self.lock().time_per_question
    }

    pub fn time_remaining(&self) -> u32 {
        self.lock().time_remaining
    }

    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn user_answers(&self) -> Vec<Option<String>> {
        self.lock().answers.clone()
    }

    /// Whole seconds since `start`, up to `end` once the quiz has ended.
    pub fn time_spent(&self) -> Duration {
        let state = self.lock();
        let Some(started_at) = state.started_at else {
            return Duration::ZERO;
        };
        let end = state.ended_at.unwrap_or_else(Instant::now);
        Duration::from_secs(end.saturating_duration_since(started_at).as_secs())
    }

    pub fn format_time_spent(&self) -> String {
        format_duration(self.time_spent())
    }

    pub fn summary(&self) -> QuizSummary {
        let answers = self.user_answers();
        let correct_answers = answers
            .iter()
            .zip(self.questions.iter())
            .filter(|(answer, question)| {
                answer
                    .as_deref()
                    .is_some_and(|answer| question.check_answer(answer))
            })
            .count();

        let score = self.score();
        let total_points = self.total_points();
        QuizSummary {
            score,
            total_points,
            percentage: score as f64 * 100.0 / total_points as f64,
            correct_answers,
            incorrect_answers: self.questions.len() - correct_answers,
            time_spent: self.time_spent(),
        }
    }
}

/// `MM:SS`, zero padded.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

async fn run_countdown(state: Weak<Mutex<QuizState>>, generation: u64) {
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    loop {
        ticker.tick().await;

        let Some(shared) = state.upgrade() else {
            return;
        };
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation || state.phase != Phase::InProgress {
            return;
        }

        state.time_remaining = state.time_remaining.saturating_sub(1);
        if state.time_remaining > 0 {
            let (index, remaining) = (state.index, state.time_remaining);
            state.emit(QuizEvent::Tick { index, remaining });
            continue;
        }

        // Expiry acts like the player pressing next: the countdown starts over
        // for the new question, or stops for good on the last one.
        if state.advance() {
            debug!("time is up, auto-advancing to question {}", state.index + 1);
            let index = state.index;
            state.emit(QuizEvent::AutoAdvanced { index });
        } else {
            debug!("time is up on the last question");
            let index = state.index;
            state.emit(QuizEvent::TimeExpired { index });
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Arc<[Question]> {
        vec![
            Question::multiple_choice(
                1,
                "What is the capital of France?",
                vec![
                    "London".to_string(),
                    "Berlin".to_string(),
                    "Paris".to_string(),
                    "Madrid".to_string(),
                ],
                "C",
            ),
            Question::true_false(2, "The Earth is the third planet from the Sun.", true),
            Question::multiple_choice(
                3,
                "Which element has the chemical symbol 'O'?",
                vec![
                    "Gold".to_string(),
                    "Oxygen".to_string(),
                    "Osmium".to_string(),
                    "Oganesson".to_string(),
                ],
                "B",
            )
            .with_points(3),
        ]
        .into()
    }

    /// Everything but the per-second ticks received so far.
    fn transitions(events: &mut mpsc::UnboundedReceiver<QuizEvent>) -> Vec<QuizEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            if !matches!(event, QuizEvent::Tick { .. }) {
                seen.push(event);
            }
        }
        seen
    }

    fn started_quiz(time_per_question: u32) -> Quiz {
        let mut quiz = Quiz::new(questions(), time_per_question).unwrap();
        quiz.start().unwrap();
        quiz
    }

    #[test]
    fn rejects_empty_question_lists_and_zero_time() {
        let empty: Arc<[Question]> = Vec::new().into();
        assert_eq!(Quiz::new(empty, 30).unwrap_err(), QuizError::NoQuestions);
        assert_eq!(
            Quiz::new(questions(), 0).unwrap_err(),
            QuizError::InvalidTimeLimit
        );
    }

    #[test]
    fn rejects_questions_worth_nothing() {
        let questions: Arc<[Question]> = vec![
            Question::true_false(1, "Light travels faster than sound.", true),
            Question::true_false(9, "CSS is a programming language.", false).with_points(0),
        ]
        .into();
        assert_eq!(
            Quiz::new(questions, 30).unwrap_err(),
            QuizError::ZeroPoints { id: 9 }
        );
    }

    #[test]
    fn fresh_quiz_has_nothing_recorded() {
        let quiz = Quiz::new(questions(), 30).unwrap();
        assert_eq!(quiz.phase(), Phase::NotStarted);
        assert_eq!(quiz.current_question_index(), 0);
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.time_remaining(), 30);
        assert_eq!(quiz.user_answers(), vec![None, None, None]);
        assert_eq!(quiz.time_spent(), Duration::ZERO);
        assert_eq!(quiz.format_time_spent(), "00:00");
    }

    #[test]
    fn start_outside_a_runtime_leaves_the_quiz_untouched() {
        let mut quiz = Quiz::new(questions(), 30).unwrap();
        assert_eq!(quiz.start(), Err(QuizError::NoRuntime));
        assert_eq!(quiz.phase(), Phase::NotStarted);
    }

    #[test]
    fn total_points_sums_question_points() {
        let quiz = Quiz::new(questions(), 30).unwrap();
        assert_eq!(quiz.total_points(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn start_begins_the_countdown() {
        let mut quiz = started_quiz(30);
        assert_eq!(quiz.phase(), Phase::InProgress);
        assert_eq!(quiz.time_remaining(), 30);
        assert!(quiz.is_timer_running());
        assert_eq!(quiz.start(), Err(QuizError::AlreadyStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn submitting_before_start_is_rejected() {
        let mut quiz = Quiz::new(questions(), 30).unwrap();
        assert_eq!(quiz.submit_answer("C"), Err(QuizError::NotInProgress));
        assert!(!quiz.next_question());
        assert_eq!(quiz.current_question_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_answer_scores_correct_answers() {
        let mut quiz = started_quiz(30);
        assert_eq!(quiz.submit_answer("A"), Ok(false));
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.submit_answer("C"), Ok(true));
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.user_answers()[0].as_deref(), Some("C"));
    }

    #[tokio::test(start_paused = true)]
    async fn answering_twice_correctly_counts_twice() {
        let mut quiz = started_quiz(30);
        assert_eq!(quiz.submit_answer("C"), Ok(true));
        assert_eq!(quiz.submit_answer("C"), Ok(true));
        assert_eq!(quiz.score(), 2);
        assert_eq!(quiz.user_answers()[0].as_deref(), Some("C"));
    }

    #[tokio::test(start_paused = true)]
    async fn last_answer_wins_but_score_never_drops() {
        let mut quiz = started_quiz(30);
        quiz.submit_answer("C").unwrap();
        quiz.submit_answer("B").unwrap();
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.user_answers()[0].as_deref(), Some("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_stops_at_both_ends() {
        let mut quiz = started_quiz(30);
        assert!(!quiz.previous_question());
        assert!(quiz.next_question());
        assert!(quiz.next_question());
        assert!(quiz.is_last_question());
        assert!(!quiz.next_question());
        assert_eq!(quiz.current_question_index(), 2);
        assert!(quiz.previous_question());
        assert_eq!(quiz.current_question_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn navigating_back_keeps_recorded_answers() {
        let mut quiz = started_quiz(30);
        quiz.submit_answer("C").unwrap();
        quiz.next_question();
        quiz.previous_question();
        assert_eq!(quiz.user_answers()[0].as_deref(), Some("C"));
        assert_eq!(quiz.score(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_resets_the_timer() {
        let mut quiz = started_quiz(10);
        time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(quiz.time_remaining(), 6);

        quiz.next_question();
        assert_eq!(quiz.time_remaining(), 10);
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(quiz.time_remaining(), 8);

        quiz.previous_question();
        assert_eq!(quiz.time_remaining(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_auto_advances_exactly_once() {
        let mut quiz = started_quiz(5);
        let mut events = quiz.subscribe();

        time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(quiz.current_question_index(), 0);
        assert_eq!(quiz.time_remaining(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(quiz.current_question_index(), 1);
        assert_eq!(quiz.time_remaining(), 5);
        assert_eq!(transitions(&mut events), vec![QuizEvent::AutoAdvanced { index: 1 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn every_second_reports_the_remaining_time() {
        let mut quiz = started_quiz(3);
        let mut events = quiz.subscribe();

        time::sleep(Duration::from_millis(3_500)).await;
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                QuizEvent::Tick { index: 0, remaining: 2 },
                QuizEvent::Tick { index: 0, remaining: 1 },
                QuizEvent::AutoAdvanced { index: 1 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_on_the_last_question_stops_the_countdown() {
        let mut quiz = started_quiz(5);
        let mut events = quiz.subscribe();
        quiz.next_question();
        quiz.next_question();

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(quiz.current_question_index(), 2);
        assert_eq!(quiz.time_remaining(), 0);
        assert_eq!(quiz.phase(), Phase::InProgress);
        assert!(!quiz.is_timer_running());
        assert_eq!(transitions(&mut events), vec![QuizEvent::TimeExpired { index: 2 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn unattended_quiz_walks_through_every_question() {
        let mut quiz = started_quiz(2);
        let mut events = quiz.subscribe();

        time::sleep(Duration::from_secs(7)).await;

        assert_eq!(
            transitions(&mut events),
            vec![
                QuizEvent::AutoAdvanced { index: 1 },
                QuizEvent::AutoAdvanced { index: 2 },
                QuizEvent::TimeExpired { index: 2 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_navigation_keeps_a_single_countdown() {
        let mut quiz = started_quiz(3);
        let mut events = quiz.subscribe();
        for _ in 0..5 {
            quiz.next_question();
            quiz.previous_question();
        }

        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(quiz.current_question_index(), 1);
        assert_eq!(transitions(&mut events), vec![QuizEvent::AutoAdvanced { index: 1 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn end_stops_the_clock_and_the_countdown() {
        let mut quiz = started_quiz(30);
        time::sleep(Duration::from_secs(65)).await;
        quiz.end();
        assert_eq!(quiz.phase(), Phase::Ended);
        assert!(!quiz.is_timer_running());

        let remaining = quiz.time_remaining();
        time::sleep(Duration::from_secs(100)).await;
        assert_eq!(quiz.time_remaining(), remaining);
        assert_eq!(quiz.time_spent(), Duration::from_secs(65));
        assert_eq!(quiz.format_time_spent(), "01:05");

        // second end keeps the first end time
        quiz.end();
        assert_eq!(quiz.time_spent(), Duration::from_secs(65));
        assert_eq!(quiz.submit_answer("C"), Err(QuizError::NotInProgress));
        assert!(!quiz.previous_question());
    }

    #[tokio::test(start_paused = true)]
    async fn time_spent_runs_until_the_quiz_ends() {
        let quiz = started_quiz(30);
        time::sleep(Duration::from_millis(12_700)).await;
        assert_eq!(quiz.time_spent(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn summary_rechecks_recorded_answers() {
        let mut quiz = started_quiz(30);
        quiz.submit_answer("C").unwrap();
        quiz.next_question();
        quiz.submit_answer("false").unwrap();
        quiz.next_question();
        quiz.submit_answer("B").unwrap();
        quiz.end();

        let summary = quiz.summary();
        assert_eq!(summary.score, 4);
        assert_eq!(summary.total_points, 5);
        assert_eq!(summary.percentage, 80.0);
        assert_eq!(summary.correct_answers, 2);
        assert_eq!(summary.incorrect_answers, 1);
    }

    #[test]
    fn durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
        assert_eq!(format_duration(Duration::from_secs(600)), "10:00");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "62:05");
    }
}
