//! Text shown by the bot. Kept free of any Telegram calls so it can be tested.

use std::time::Duration;

use teloxide::utils::html;

use crate::quiz::{format_duration, Question, Quiz, QuizSummary, UserStats};

pub const PREVIOUS_BUTTON: &str = "⬅️ Previous";
pub const NEXT_BUTTON: &str = "Next ➡️";
pub const SUBMIT_BUTTON: &str = "✅ Submit";
pub const STATS_BUTTON: &str = "📊 My stats";

pub fn question_text(quiz: &Quiz) -> String {
    let question = quiz.current_question();
    let options = question
        .options()
        .iter()
        .map(|option| format!("<b>{}</b>. {}", option.prefix, html::escape(&option.text)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Question {} of {}\n\n<b>{}</b>\n\n{}\n\n⏱ {} left",
        quiz.current_question_index() + 1,
        quiz.questions().len(),
        html::escape(question.text()),
        options,
        timer_display(quiz.time_remaining()),
    )
}

pub fn timer_display(seconds: u32) -> String {
    format_duration(Duration::from_secs(seconds as u64))
}

pub fn reminder_text(remaining: u32) -> String {
    format!("⏳ {} left on this question", timer_display(remaining))
}

/// Button labels for the options of `question`, in display order.
pub fn option_buttons(question: &Question) -> Vec<String> {
    question.options().into_iter().map(|option| option.prefix).collect()
}

/// Maps a pressed button (or a typed value) back to the answer value the
/// question checks against.
pub fn answer_for_button(question: &Question, text: &str) -> Option<String> {
    let text = text.trim();
    question
        .options()
        .into_iter()
        .find(|option| option.prefix == text || option.value == text)
        .map(|option| option.value)
}

pub fn score_message(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        return "Outstanding! You're an expert!";
    }
    if percentage >= 70.0 {
        return "Great job! You have excellent knowledge!";
    }
    if percentage >= 50.0 {
        return "Good effort! Keep learning and improve yourself!";
    }
    "Keep practicing! You'll do better next time"
}

pub fn results_text(summary: &QuizSummary) -> String {
    format!(
        "Your score {} out of {}!\n{}\n\nCorrect answers: {}\nIncorrect answers: {}\nTime spent: {}",
        summary.score,
        summary.total_points,
        score_message(summary.percentage),
        summary.correct_answers,
        summary.incorrect_answers,
        format_duration(summary.time_spent),
    )
}

pub fn stats_text(name: &str, stats: &UserStats) -> String {
    format!(
        "{}, you have taken {} quiz(zes).\nTotal score: {} out of {}\nAverage: {:.0}%",
        name, stats.quizzes_taken, stats.total_score, stats.total_possible_score, stats.average_score,
    )
}
