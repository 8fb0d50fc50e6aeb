//! Trivia quiz engine: document model, answer validation, scoring and the
//! session state machine driven by the Telegram front end in `main.rs`.

pub mod config;
pub mod quiz;

pub use config::Config;
pub use quiz::{QuizDocuments, QuizError};
