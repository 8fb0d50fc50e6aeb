use std::collections::HashSet;

use log::debug;

use super::{PossibleAnswer, Question, QuestionType, QuizError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Correct,
    /// Carries the answers that should have been chosen, in the order the
    /// question lists its correct values.
    Incorrect { expected: Vec<PossibleAnswer> },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// Checks the ids the user selected against the question's correct answer.
///
/// `selected` holds canonical answer ids. An empty selection is rejected with
/// [`QuizError::NoAnswerGiven`] so the caller can ask again.
pub fn validate<S: AsRef<str>>(question: &Question, selected: &[S]) -> Result<Verdict> {
    if selected.is_empty() {
        return Err(QuizError::NoAnswerGiven);
    }

    let expected: Vec<String> = question
        .correct_answer
        .values()
        .iter()
        .map(|value| value.canonical())
        .collect();

    let correct = match question.question_type {
        QuestionType::SingleChoice | QuestionType::TrueFalse => {
            selected.len() == 1 && expected.len() == 1 && selected[0].as_ref() == expected[0]
        }
        // Compared as sets, so the order of selection does not matter
        QuestionType::MultiChoice => {
            let chosen: HashSet<&str> = selected.iter().map(|id| id.as_ref()).collect();
            let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
            chosen == wanted
        }
    };

    debug!(
        "Validated '{}': selected {:?}, expected {:?}, correct = {}",
        question.title,
        selected.iter().map(|id| id.as_ref()).collect::<Vec<_>>(),
        expected,
        correct
    );

    if correct {
        return Ok(Verdict::Correct);
    }

    let offered = question.possible_answers();
    let expected = expected
        .iter()
        .filter_map(|value| {
            offered
                .iter()
                .find(|answer| &answer.id.canonical() == value)
                .cloned()
        })
        .collect();

    Ok(Verdict::Incorrect { expected })
}
