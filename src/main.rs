use std::{collections::HashMap, sync::Arc};

use dotenv::dotenv;
use log::{debug, error, info};
use quiz_tgbot::{
    config::Config,
    quiz::{QuestionBank, QuizEvent, QuizManager},
    render,
    session::{Outcome, Session},
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode},
};
use tokio::sync::{mpsc::UnboundedReceiver, Mutex};

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
/// One session per chat. It outlives its quizzes to keep the player's stats.
type Sessions = Arc<Mutex<HashMap<ChatId, Session>>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveName,
    ReceiveQuizChoice,
    InQuiz,
}

#[tokio::main]
async fn main() {
    // .env is optional, the variables may come from the real environment
    dotenv().ok();
    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = Config::from_env().expect("Invalid configuration");
    let bank = match &config.bank_path {
        Some(path) => QuestionBank::load(path),
        None => QuestionBank::builtin(),
    }
    .expect("Failed to load the question bank");
    info!(
        "Question bank loaded with quiz types: {}",
        bank.kinds().collect::<Vec<_>>().join(", ")
    );

    let bot = Bot::from_env();
    let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveName].endpoint(receive_name))
            .branch(dptree::case![State::ReceiveQuizChoice].endpoint(receive_quiz_choice))
            .branch(dptree::case![State::InQuiz].endpoint(in_quiz)),
    )
    .dependencies(dptree::deps![
        InMemStorage::<State>::new(),
        sessions,
        Arc::new(bank),
        config
    ])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hi! I'm the quiz bot. Pick a quiz, answer before the clock runs out and see how you did. What's your name?";

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;

    dialogue.update(State::ReceiveName).await?;
    Ok(())
}

async fn receive_name(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    sessions: Sessions,
    bank: Arc<QuestionBank>,
    config: Config,
) -> HandlerResult {
    let Some(name) = msg.text().map(str::trim).filter(|name| !name.is_empty()) else {
        bot.send_message(msg.chat.id, "Please send me your name (as text)")
            .await?;
        return Ok(());
    };

    let kinds = {
        let mut sessions = sessions.lock().await;
        let session = sessions.entry(msg.chat.id).or_insert_with(|| {
            Session::new(QuizManager::new(bank.clone(), config.time_per_question))
        });
        session.set_user(name);
        session.quiz_kinds()
    };
    info!("{} joined in chat {}", name, msg.chat.id);

    bot.send_message(msg.chat.id, format!("Nice to meet you, {}!", name))
        .await?;
    ask_quiz_choice(&bot, &dialogue, kinds).await
}

async fn receive_quiz_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    sessions: Sessions,
    storage: Arc<InMemStorage<State>>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let choice = msg.text().unwrap_or_default().trim();

    let mut events = None;
    let outcome = {
        let mut sessions = sessions.lock().await;
        match sessions.get_mut(&chat_id) {
            None => Outcome::Lost,
            Some(session) if choice == render::STATS_BUTTON => session.stats(),
            Some(session) => match session.start_quiz(choice)? {
                Some((outcome, receiver)) => {
                    events = Some(receiver);
                    outcome
                }
                None => Outcome::Message("Please choose one of the quiz types".to_string()),
            },
        }
    };

    if let Some(events) = events {
        tokio::spawn(forward_timer_events(
            bot.clone(),
            storage,
            sessions.clone(),
            chat_id,
            events,
        ));
        dialogue.update(State::InQuiz).await?;
    }
    reply(&bot, &dialogue, outcome).await
}

async fn in_quiz(bot: Bot, dialogue: QuizDialogue, msg: Message, sessions: Sessions) -> HandlerResult {
    let input = msg.text().unwrap_or_default().trim();

    let outcome = {
        let mut sessions = sessions.lock().await;
        match sessions.get_mut(&msg.chat.id) {
            None => Outcome::Lost,
            Some(session) => session.handle_input(input)?,
        }
    };

    reply(&bot, &dialogue, outcome).await
}

/// Relays countdown events of one quiz to the chat until the quiz is dropped.
async fn forward_timer_events(
    bot: Bot,
    storage: Arc<InMemStorage<State>>,
    sessions: Sessions,
    chat_id: ChatId,
    mut events: UnboundedReceiver<QuizEvent>,
) {
    let dialogue = QuizDialogue::new(storage, chat_id);
    while let Some(event) = events.recv().await {
        let outcome = {
            let mut sessions = sessions.lock().await;
            let Some(session) = sessions.get_mut(&chat_id) else {
                return;
            };
            match session.handle_timer_event(event) {
                Some(outcome) => outcome,
                None => continue,
            }
        };

        if let Err(err) = reply(&bot, &dialogue, outcome).await {
            error!("Failed to handle {:?} in chat {}: {}", event, chat_id, err);
        }
    }
    debug!("countdown events for chat {} closed", chat_id);
}

async fn reply(bot: &Bot, dialogue: &QuizDialogue, outcome: Outcome) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    match outcome {
        Outcome::Question { text, keyboard } => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
        }
        Outcome::Results { text, kinds } => {
            bot.send_message(chat_id, text).await?;
            ask_quiz_choice(bot, dialogue, kinds).await?;
        }
        Outcome::Message(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Outcome::Lost => {
            bot.send_message(chat_id, "Let's start over. What's your name?")
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(State::ReceiveName).await?;
        }
    }
    Ok(())
}

async fn ask_quiz_choice(bot: &Bot, dialogue: &QuizDialogue, kinds: Vec<String>) -> HandlerResult {
    let mut rows: Vec<Vec<KeyboardButton>> = kinds
        .into_iter()
        .map(|kind| vec![KeyboardButton::new(kind)])
        .collect();
    rows.push(vec![KeyboardButton::new(render::STATS_BUTTON)]);

    bot.send_message(dialogue.chat_id(), "Which quiz would you like to take?")
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;

    dialogue.update(State::ReceiveQuizChoice).await?;
    Ok(())
}
