pub mod error;
pub mod result;
pub mod score;
pub mod session;
pub mod source;
pub mod validator;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{QuizError, Result};

/// Shown for questions and result tiers that come without an image
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

/// Both documents a quiz needs before it can start.
#[derive(Debug, Clone)]
pub struct QuizDocuments {
    quiz: Quiz,
    results: Vec<ResultTier>,
}

impl QuizDocuments {
    pub fn new(quiz: Quiz, results: Vec<ResultTier>) -> Self {
        Self { quiz, results }
    }

    /// Parses the quiz document and the result-tier document.
    ///
    /// Missing required fields surface as [`QuizError::MalformedDocument`].
    pub fn from_json(quiz_json: &str, results_json: &str) -> Result<Self> {
        let quiz: Quiz = serde_json::from_str(quiz_json)?;
        let table: ResultTable = serde_json::from_str(results_json)?;
        Ok(Self::new(quiz, table.results))
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.quiz.questions.get(index)
    }

    pub fn result_tiers(&self) -> &[ResultTier] {
        &self.results
    }

    /// Sum of the points of every question
    pub fn total_points(&self) -> u32 {
        self.quiz
            .questions
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.points))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quiz {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

/// An answer id or an element of a correct answer.
///
/// Documents use strings, booleans and integers interchangeably, so values are
/// always compared through their canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl AnswerValue {
    /// Textual form used for every comparison: strings verbatim, booleans as
    /// `true`/`false`, integers in decimal.
    pub fn canonical(&self) -> String {
        match self {
            AnswerValue::Flag(flag) => flag.to_string(),
            AnswerValue::Number(number) => number.to_string(),
            AnswerValue::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for AnswerValue {
    fn from(text: &str) -> Self {
        AnswerValue::Text(text.to_string())
    }
}

impl From<bool> for AnswerValue {
    fn from(flag: bool) -> Self {
        AnswerValue::Flag(flag)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Many(Vec<AnswerValue>),
    Single(AnswerValue),
}

impl CorrectAnswer {
    /// Every expected value; a scalar answer has exactly one.
    pub fn values(&self) -> &[AnswerValue] {
        match self {
            CorrectAnswer::Single(value) => std::slice::from_ref(value),
            CorrectAnswer::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    TrueFalse,
}

impl QuestionType {
    pub fn allows_multiple(&self) -> bool {
        matches!(self, QuestionType::MultiChoice)
    }
}

impl FromStr for QuestionType {
    type Err = QuizError;

    // The published documents spell these "mutiplechoice-single",
    // "mutiplechoice-multiple" and "truefalse".
    fn from_str(s: &str) -> Result<Self> {
        let kind = s.to_lowercase();
        if kind.contains("truefalse") {
            Ok(QuestionType::TrueFalse)
        } else if kind.contains("single") {
            Ok(QuestionType::SingleChoice)
        } else if kind.contains("multiple") || kind.contains("mutiple") {
            Ok(QuestionType::MultiChoice)
        } else {
            Err(QuizError::MalformedDocument(format!(
                "unknown question type '{}'",
                s
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PossibleAnswer {
    #[serde(rename = "a_id")]
    pub id: AnswerValue,
    pub caption: String,
}

impl PossibleAnswer {
    pub fn new(id: impl Into<AnswerValue>, caption: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            caption: caption.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawQuestion {
    title: String,
    #[serde(default)]
    img: Option<String>,
    question_type: String,
    #[serde(default)]
    possible_answers: Vec<PossibleAnswer>,
    correct_answer: CorrectAnswer,
    points: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    pub title: String,
    pub image: Option<String>,
    pub question_type: QuestionType,
    possible_answers: Vec<PossibleAnswer>,
    pub correct_answer: CorrectAnswer,
    pub points: u32,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuizError;

    fn try_from(raw: RawQuestion) -> Result<Self> {
        let question_type: QuestionType = raw.question_type.parse()?;
        if question_type != QuestionType::TrueFalse && raw.possible_answers.is_empty() {
            return Err(QuizError::MalformedDocument(format!(
                "question '{}' has no possible answers",
                raw.title
            )));
        }
        Ok(Self {
            title: raw.title,
            image: raw.img.filter(|img| !img.is_empty()),
            question_type,
            possible_answers: raw.possible_answers,
            correct_answer: raw.correct_answer,
            points: raw.points,
        })
    }
}

impl Question {
    pub fn new(
        title: impl Into<String>,
        question_type: QuestionType,
        possible_answers: Vec<PossibleAnswer>,
        correct_answer: CorrectAnswer,
        points: u32,
    ) -> Self {
        Self {
            title: title.into(),
            image: None,
            question_type,
            possible_answers,
            correct_answer,
            points,
        }
    }

    /// Answers offered to the user.
    ///
    /// True/false questions always offer the fixed False/True pair, whatever
    /// the document says.
    pub fn possible_answers(&self) -> Cow<'_, [PossibleAnswer]> {
        match self.question_type {
            QuestionType::TrueFalse => Cow::Owned(vec![
                PossibleAnswer::new(false, "False"),
                PossibleAnswer::new(true, "True"),
            ]),
            _ => Cow::Borrowed(&self.possible_answers),
        }
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ResultTable {
    results: Vec<ResultTier>,
}

/// A band of percentage scores with its narrative outcome.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultTier {
    /// Explicit lower bound; when absent the tier starts right after the
    /// previous one
    #[serde(rename = "minpoints", default)]
    pub min_points: Option<u32>,
    /// Inclusive upper bound of the band, in percent
    #[serde(rename = "maxpoints")]
    pub max_points: u32,
    pub title: String,
    pub message: String,
    #[serde(rename = "img", default)]
    pub image: Option<String>,
}

impl ResultTier {
    pub fn image(&self) -> &str {
        self.image
            .as_deref()
            .filter(|img| !img.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}
