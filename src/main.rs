use std::sync::Arc;

use dotenv::dotenv;
use log::{debug, warn};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove},
};
use trivia_quiz::{
    quiz::{
        self,
        result::Outcome,
        session::{QuizSession, Step},
        validator::Verdict,
        PossibleAnswer, QuestionType,
    },
    Config, QuizDocuments, QuizError,
};

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    Intro {
        session: QuizSession,
    },
    Answering {
        session: QuizSession,
        selected: Vec<String>,
    },
    Finished,
}

/// Outcome of loading the documents at startup
#[derive(Clone)]
enum Library {
    Ready(Arc<QuizDocuments>),
    LoadFailed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting trivia quiz bot...");

    let config = Config::from_env().expect("Invalid configuration");
    let bot = Bot::from_env();

    log::info!(
        "Loading quiz from {} and results from {}",
        config.quiz_source,
        config.results_source
    );
    let library = match quiz::source::load_documents(&config.quiz_source, &config.results_source)
        .await
    {
        Ok(documents) => Library::Ready(Arc::new(documents)),
        Err(err) => {
            warn!("Quiz data unavailable: {}", err);
            Library::LoadFailed
        }
    };

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<State>, State>()
            .branch(
                dptree::filter(|msg: Message| msg.text() == Some(CANCEL_COMMAND)).endpoint(cancel),
            )
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::Intro { session }].endpoint(intro))
            .branch(dptree::case![State::Answering { session, selected }].endpoint(answering))
            .branch(dptree::case![State::Finished].endpoint(start)),
    )
    .dependencies(dptree::deps![
        InMemStorage::<State>::new(),
        library,
        Arc::new(config)
    ])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const START_BUTTON: &str = "Let's Go";
const CONFIRM_BUTTON: &str = "Confirm";
const PLAY_AGAIN_BUTTON: &str = "Play again";
const CANCEL_COMMAND: &str = "/cancel";
const SELECTED_MARK: &str = "✅ ";
const LOAD_ERROR_TEXT: &str = "Can't load quiz data, sorry :(";

async fn start(bot: Bot, dialogue: QuizDialogue, library: Library, msg: Message) -> HandlerResult {
    let Library::Ready(documents) = library else {
        bot.send_message(msg.chat.id, LOAD_ERROR_TEXT)
            .reply_markup(KeyboardRemove::new())
            .await?;
        return Ok(());
    };

    let quiz = documents.quiz();
    bot.send_message(msg.chat.id, format!("{}\n\n{}", quiz.title, quiz.description))
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(START_BUTTON)]]))
        .await?;

    dialogue
        .update(State::Intro {
            session: QuizSession::new(),
        })
        .await?;
    Ok(())
}

async fn intro(
    bot: Bot,
    dialogue: QuizDialogue,
    library: Library,
    config: Arc<Config>,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    if msg.text() != Some(START_BUTTON) {
        bot.send_message(msg.chat.id, format!("Press \"{}\" when you are ready", START_BUTTON))
            .await?;
        return Ok(());
    }
    let Library::Ready(documents) = library else {
        return Ok(());
    };

    let nothing: [&str; 0] = [];
    let step = session.confirm(&documents, &nothing);
    drive(&bot, &dialogue, &documents, &config, session, Vec::new(), step).await
}

async fn answering(
    bot: Bot,
    dialogue: QuizDialogue,
    library: Library,
    config: Arc<Config>,
    (mut session, selected): (QuizSession, Vec<String>),
    msg: Message,
) -> HandlerResult {
    let Library::Ready(documents) = library else {
        return Ok(());
    };
    let Some(question) = documents.question(session.current_question_index()) else {
        return Ok(());
    };
    let answers = question.possible_answers();

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please use the buttons below")
            .reply_markup(answer_keyboard(&answers, &selected))
            .await?;
        return Ok(());
    };

    if text == CONFIRM_BUTTON {
        let step = session.confirm(&documents, &selected);
        return drive(&bot, &dialogue, &documents, &config, session, selected, step).await;
    }

    let Some(answer) = pressed_answer(text, &answers) else {
        bot.send_message(msg.chat.id, "Please use the buttons below")
            .reply_markup(answer_keyboard(&answers, &selected))
            .await?;
        return Ok(());
    };

    let selected = toggle_selection(question.question_type, selected, answer.id.canonical());
    bot.send_message(msg.chat.id, selection_summary(&answers, &selected))
        .reply_markup(answer_keyboard(&answers, &selected))
        .await?;

    dialogue.update(State::Answering { session, selected }).await?;
    Ok(())
}

async fn cancel(bot: Bot, dialogue: QuizDialogue, state: State, msg: Message) -> HandlerResult {
    let session = match state {
        State::Intro { session } | State::Answering { session, .. } => Some(session),
        State::Start | State::Finished => None,
    };
    if let Some(mut session) = session {
        match session.abort() {
            Ok(()) => log::info!(
                "Quiz in chat {} cancelled at question {} with {} points",
                msg.chat.id,
                session.current_question_index() + 1,
                session.score()
            ),
            Err(err) => debug!("Nothing to cancel in chat {}: {}", msg.chat.id, err),
        }
    }

    bot.send_message(msg.chat.id, "Quiz cancelled. Send any message to start over.")
        .reply_markup(KeyboardRemove::new())
        .await?;
    dialogue.update(State::Finished).await?;
    Ok(())
}

/// Carries a transition through to the chat: feedback, the delay before the
/// next question, the next question itself or the final result.
async fn drive(
    bot: &Bot,
    dialogue: &QuizDialogue,
    documents: &QuizDocuments,
    config: &Config,
    mut session: QuizSession,
    selected: Vec<String>,
    mut step: Result<Step, QuizError>,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    loop {
        match step {
            Ok(Step::Feedback(verdict)) => {
                bot.send_message(chat_id, feedback_text(&verdict)).await?;
                tokio::time::sleep(config.advance_delay).await;
                step = session.advance(documents);
            }
            Ok(Step::Present(index)) => {
                send_question(bot, chat_id, documents, index).await?;
                dialogue
                    .update(State::Answering {
                        session,
                        selected: Vec::new(),
                    })
                    .await?;
                return Ok(());
            }
            Ok(Step::Finished(outcome)) => {
                send_outcome(bot, chat_id, &outcome).await?;
                dialogue.update(State::Finished).await?;
                return Ok(());
            }
            Err(QuizError::NoAnswerGiven) => {
                let answers = documents
                    .question(session.current_question_index())
                    .map(|q| q.possible_answers().into_owned())
                    .unwrap_or_default();
                bot.send_message(chat_id, "Choose an answer")
                    .reply_markup(answer_keyboard(&answers, &selected))
                    .await?;
                return Ok(());
            }
            Err(QuizError::InvalidTransition { phase }) => {
                debug!("Ignoring input in chat {} while {}", chat_id, phase);
                return Ok(());
            }
            Err(err) => {
                warn!("Quiz in chat {} failed: {}", chat_id, err);
                bot.send_message(chat_id, format!("This quiz cannot be scored: {}", err))
                    .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
                        PLAY_AGAIN_BUTTON,
                    )]]))
                    .await?;
                dialogue.update(State::Finished).await?;
                return Ok(());
            }
        }
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    documents: &QuizDocuments,
    index: usize,
) -> HandlerResult {
    let Some(question) = documents.question(index) else {
        return Ok(());
    };
    debug!("Presenting question {} to chat {}", index + 1, chat_id);

    let header = format!(
        "Question {}/{}: {}",
        index + 1,
        documents.question_count(),
        question.title
    );
    send_picture(bot, chat_id, question.image(), header).await?;

    let prompt = match question.question_type {
        QuestionType::MultiChoice => "Select all that apply, then press Confirm",
        QuestionType::SingleChoice | QuestionType::TrueFalse => {
            "Pick one answer, then press Confirm"
        }
    };
    bot.send_message(chat_id, prompt)
        .reply_markup(answer_keyboard(&question.possible_answers(), &[]))
        .await?;
    Ok(())
}

async fn send_outcome(bot: &Bot, chat_id: ChatId, outcome: &Outcome) -> HandlerResult {
    send_picture(bot, chat_id, outcome.tier.image(), outcome.tier.title.clone()).await?;

    let text = format!(
        "{}\n\nYou scored {} of {} points ({:.0}%).",
        outcome.tier.message, outcome.score, outcome.total_points, outcome.percentage
    );
    bot.send_message(chat_id, text)
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
            PLAY_AGAIN_BUTTON,
        )]]))
        .await?;
    Ok(())
}

/// Sends the image with `caption`, or just the caption if the image is not
/// usable.
async fn send_picture(bot: &Bot, chat_id: ChatId, image: &str, caption: String) -> HandlerResult {
    match reqwest::Url::parse(image) {
        Ok(url) => {
            if let Err(err) = bot
                .send_photo(chat_id, InputFile::url(url))
                .caption(caption.clone())
                .await
            {
                warn!("Failed to send image {}: {}", image, err);
                bot.send_message(chat_id, caption).await?;
            }
        }
        Err(_) => {
            bot.send_message(chat_id, caption).await?;
        }
    }
    Ok(())
}

fn feedback_text(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Correct => "Huzzuh!".to_string(),
        Verdict::Incorrect { expected } if expected.is_empty() => "Wrong!".to_string(),
        Verdict::Incorrect { expected } => format!(
            "Wrong! The correct answer: {}",
            expected
                .iter()
                .map(|a| a.caption.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Single-answer questions replace the selection, multi-choice toggles it.
fn toggle_selection(
    question_type: QuestionType,
    mut selected: Vec<String>,
    id: String,
) -> Vec<String> {
    if !question_type.allows_multiple() {
        return vec![id];
    }
    match selected.iter().position(|s| *s == id) {
        Some(position) => {
            selected.remove(position);
        }
        None => selected.push(id),
    }
    selected
}

fn is_selected(answer: &PossibleAnswer, selected: &[String]) -> bool {
    let id = answer.id.canonical();
    selected.iter().any(|s| *s == id)
}

/// Button text for the answer at `index`. The 1-based number keeps labels
/// unique when captions repeat or clash with the Confirm button.
fn answer_label(index: usize, answer: &PossibleAnswer, selected: &[String]) -> String {
    let label = format!("{}. {}", index + 1, answer.caption);
    if is_selected(answer, selected) {
        format!("{}{}", SELECTED_MARK, label)
    } else {
        label
    }
}

/// Maps a pressed button back to its answer by the number in the label.
fn pressed_answer<'a>(text: &str, answers: &'a [PossibleAnswer]) -> Option<&'a PossibleAnswer> {
    let (number, _) = text.trim_start_matches(SELECTED_MARK).split_once(". ")?;
    let index = number.parse::<usize>().ok()?.checked_sub(1)?;
    answers.get(index)
}

fn answer_keyboard(answers: &[PossibleAnswer], selected: &[String]) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = answers
        .iter()
        .enumerate()
        .map(|(index, answer)| vec![KeyboardButton::new(answer_label(index, answer, selected))])
        .collect();
    rows.push(vec![KeyboardButton::new(CONFIRM_BUTTON)]);
    KeyboardMarkup::new(rows)
}

fn selection_summary(answers: &[PossibleAnswer], selected: &[String]) -> String {
    let captions = answers
        .iter()
        .filter(|answer| is_selected(answer, selected))
        .map(|answer| answer.caption.as_str())
        .collect::<Vec<_>>();
    if captions.is_empty() {
        "Nothing selected".to_string()
    } else {
        format!("Selected: {}", captions.join(", "))
    }
}
