//! Runtime configuration, read from the environment (and `.env` via dotenv).

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_QUIZ_SOURCE: &str =
    "https://raw.githubusercontent.com/smar152/geography-random-trivia-quiz/master/data/geography_questions.json";
pub const DEFAULT_RESULTS_SOURCE: &str =
    "https://raw.githubusercontent.com/smar152/geography-random-trivia-quiz/master/data/result.json";

/// How long correctness feedback stays on screen before the next question
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// URL or file path of the quiz document
    pub quiz_source: String,
    /// URL or file path of the result-tier document
    pub results_source: String,
    pub advance_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiz_source: DEFAULT_QUIZ_SOURCE.to_string(),
            results_source: DEFAULT_RESULTS_SOURCE.to_string(),
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
        }
    }
}

impl Config {
    /// Reads `QUIZ_SOURCE`, `RESULTS_SOURCE` and `ADVANCE_DELAY_MS`, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(source) = lookup("QUIZ_SOURCE") {
            config.quiz_source = source;
        }
        if let Some(source) = lookup("RESULTS_SOURCE") {
            config.results_source = source;
        }
        if let Some(delay) = lookup("ADVANCE_DELAY_MS") {
            let millis = delay
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "ADVANCE_DELAY_MS",
                    value: delay.clone(),
                })?;
            config.advance_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
