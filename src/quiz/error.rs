use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuizError>;

#[derive(Debug, Error)]
pub enum QuizError {
    /// A quiz or result document is missing required structure
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// One of the documents could not be fetched
    #[error("Failed to load quiz data: {0}")]
    LoadFailed(String),

    /// The user confirmed without selecting anything
    #[error("No answer given")]
    NoAnswerGiven,

    /// The quiz is worth zero points in total
    #[error("Cannot compute a percentage for a quiz worth zero points")]
    DivisionUndefined,

    /// The result table has no tier covering the percentage
    #[error("No result tier covers a score of {percentage}%")]
    NoTierMatched { percentage: f64 },

    #[error("Action not allowed while the quiz is {phase}")]
    InvalidTransition { phase: String },
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        QuizError::MalformedDocument(err.to_string())
    }
}

impl From<reqwest::Error> for QuizError {
    fn from(err: reqwest::Error) -> Self {
        QuizError::LoadFailed(err.to_string())
    }
}

impl From<std::io::Error> for QuizError {
    fn from(err: std::io::Error) -> Self {
        QuizError::LoadFailed(err.to_string())
    }
}
