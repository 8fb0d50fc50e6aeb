use std::fmt;

use log::{debug, info, warn};

use super::result::{self, Outcome};
use super::score::Score;
use super::validator::{self, Verdict};
use super::{QuizDocuments, QuizError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Waiting for the first confirm action
    Intro,
    Presenting(usize),
    Evaluating(usize),
    /// Feedback for question `i` is on screen; the caller waits out the delay
    /// and then calls [`QuizSession::advance`].
    Advancing(usize),
    Completed(Outcome),
    /// The result table could not classify the final score
    Failed(String),
    Aborted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed(_) | Phase::Failed(_) | Phase::Aborted)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Intro => write!(f, "at the intro"),
            Phase::Presenting(index) => write!(f, "presenting question {}", index + 1),
            Phase::Evaluating(index) => write!(f, "evaluating question {}", index + 1),
            Phase::Advancing(index) => write!(f, "advancing past question {}", index + 1),
            Phase::Completed(_) => write!(f, "completed"),
            Phase::Failed(_) => write!(f, "failed"),
            Phase::Aborted => write!(f, "aborted"),
        }
    }
}

/// What the front end has to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Show the question with this index
    Present(usize),
    /// Show the verdict, wait, then call [`QuizSession::advance`]
    Feedback(Verdict),
    /// The quiz is over
    Finished(Outcome),
}

/// Progress of one quiz attempt.
///
/// The session holds no reference to the documents or to any UI; both are
/// passed into each transition. A finished session is never restarted, a new
/// attempt starts from [`QuizSession::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    current_question_index: usize,
    score: Score,
    phase: Phase,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            current_question_index: 0,
            score: Score::new(),
            phase: Phase::Intro,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn score(&self) -> u32 {
        self.score.total()
    }

    /// Handles the user's confirm action.
    ///
    /// At the intro this starts the quiz and ignores `selected`. While a
    /// question is presented the selection is validated; an empty selection
    /// returns [`QuizError::NoAnswerGiven`] and leaves the session untouched.
    pub fn confirm<S: AsRef<str>>(
        &mut self,
        documents: &QuizDocuments,
        selected: &[S],
    ) -> Result<Step> {
        match self.phase {
            Phase::Intro => {
                info!("Starting quiz '{}'", documents.quiz().title);
                if documents.question_count() == 0 {
                    return self.complete(documents).map(Step::Finished);
                }
                Ok(self.present(0))
            }
            Phase::Presenting(index) => {
                let question = documents
                    .question(index)
                    .ok_or_else(|| self.invalid_transition())?;
                let verdict = validator::validate(question, selected)?;

                self.set_phase(Phase::Evaluating(index));
                if verdict.is_correct() {
                    self.score.add(question.points);
                }
                self.set_phase(Phase::Advancing(index));

                Ok(Step::Feedback(verdict))
            }
            _ => Err(self.invalid_transition()),
        }
    }

    /// Moves past the question whose feedback was just shown.
    ///
    /// After the last question the result table is consulted exactly once. If
    /// it cannot classify the score the session ends up [`Phase::Failed`] and
    /// the error is returned.
    pub fn advance(&mut self, documents: &QuizDocuments) -> Result<Step> {
        match self.phase {
            Phase::Advancing(index) if index + 1 < documents.question_count() => {
                Ok(self.present(index + 1))
            }
            Phase::Advancing(_) => self.complete(documents).map(Step::Finished),
            _ => Err(self.invalid_transition()),
        }
    }

    /// Abandons the attempt, e.g. when the user closes the quiz mid-delay.
    pub fn abort(&mut self) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(self.invalid_transition());
        }
        self.set_phase(Phase::Aborted);
        Ok(())
    }

    fn present(&mut self, index: usize) -> Step {
        self.current_question_index = index;
        self.set_phase(Phase::Presenting(index));
        Step::Present(index)
    }

    fn complete(&mut self, documents: &QuizDocuments) -> Result<Outcome> {
        let total_points = documents.total_points();
        match result::resolve(self.score.total(), total_points, documents.result_tiers()) {
            Ok(outcome) => {
                info!(
                    "Quiz finished with {} of {} points ({:.1}%): {}",
                    outcome.score, total_points, outcome.percentage, outcome.tier.title
                );
                self.set_phase(Phase::Completed(outcome.clone()));
                Ok(outcome)
            }
            Err(err) => {
                warn!("Quiz could not be scored: {}", err);
                self.set_phase(Phase::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!("Quiz session: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn invalid_transition(&self) -> QuizError {
        QuizError::InvalidTransition {
            phase: self.phase.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{
        AnswerValue, CorrectAnswer, PossibleAnswer, Question, QuestionType, Quiz, ResultTier,
    };

    const NOTHING: [&str; 0] = [];

    fn tier(max_points: u32, title: &str) -> ResultTier {
        ResultTier {
            min_points: None,
            max_points,
            title: title.to_string(),
            message: String::new(),
            image: None,
        }
    }

    fn single(correct: &str, points: u32) -> Question {
        Question::new(
            "Pick one",
            QuestionType::SingleChoice,
            vec![
                PossibleAnswer::new("a", "A"),
                PossibleAnswer::new("b", "B"),
                PossibleAnswer::new("c", "C"),
            ],
            CorrectAnswer::Single(AnswerValue::from(correct)),
            points,
        )
    }

    fn documents(questions: Vec<Question>, tiers: Vec<ResultTier>) -> QuizDocuments {
        QuizDocuments::new(
            Quiz {
                title: "Test quiz".to_string(),
                description: String::new(),
                questions,
            },
            tiers,
        )
    }

    fn default_tiers() -> Vec<ResultTier> {
        vec![tier(49, "Low"), tier(74, "Middle"), tier(100, "High")]
    }

    #[test]
    fn test_intro_starts_first_question() {
        let docs = documents(vec![single("b", 10)], default_tiers());
        let mut session = QuizSession::new();
        assert_eq!(session.phase(), &Phase::Intro);

        let step = session.confirm(&docs, &NOTHING).unwrap();
        assert_eq!(step, Step::Present(0));
        assert_eq!(session.phase(), &Phase::Presenting(0));
        assert_eq!(session.current_question_index(), 0);
    }

    #[test]
    fn test_single_correct_answer_completes_quiz() {
        let docs = documents(vec![single("b", 10)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();

        let step = session.confirm(&docs, &["b"]).unwrap();
        assert_eq!(step, Step::Feedback(Verdict::Correct));
        assert_eq!(session.score(), 10);
        assert_eq!(session.phase(), &Phase::Advancing(0));

        match session.advance(&docs).unwrap() {
            Step::Finished(outcome) => {
                assert_eq!(outcome.score, 10);
                assert_eq!(outcome.percentage, 100.0);
                assert_eq!(outcome.tier.title, "High");
            }
            other => panic!("expected Finished, got {:?}", other),
        }
        assert!(matches!(session.phase(), Phase::Completed(_)));
    }

    #[test]
    fn test_one_wrong_one_right_lands_in_middle_tier() {
        let tiers = vec![tier(40, "Low"), tier(60, "Half"), tier(100, "High")];
        let docs = documents(vec![single("a", 5), single("c", 5)], tiers);
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();

        let step = session.confirm(&docs, &["b"]).unwrap();
        assert!(matches!(step, Step::Feedback(Verdict::Incorrect { .. })));
        assert_eq!(session.score(), 0);
        assert_eq!(session.advance(&docs).unwrap(), Step::Present(1));

        session.confirm(&docs, &["c"]).unwrap();
        assert_eq!(session.score(), 5);

        match session.advance(&docs).unwrap() {
            Step::Finished(outcome) => {
                assert_eq!(outcome.percentage, 50.0);
                assert_eq!(outcome.tier.title, "Half");
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_choice_in_reverse_order_is_correct() {
        let question = Question::new(
            "Pick the vowels",
            QuestionType::MultiChoice,
            vec![
                PossibleAnswer::new("a", "A"),
                PossibleAnswer::new("b", "B"),
                PossibleAnswer::new("c", "E"),
            ],
            CorrectAnswer::Many(vec![AnswerValue::from("a"), AnswerValue::from("c")]),
            8,
        );
        let docs = documents(vec![question], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();

        let step = session.confirm(&docs, &["c", "a"]).unwrap();
        assert_eq!(step, Step::Feedback(Verdict::Correct));
        assert_eq!(session.score(), 8);
    }

    #[test]
    fn test_no_answer_leaves_session_unchanged() {
        let docs = documents(vec![single("b", 10)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        let before = session.clone();

        let result = session.confirm(&docs, &NOTHING);
        assert!(matches!(result, Err(QuizError::NoAnswerGiven)));
        assert_eq!(session, before);
    }

    #[test]
    fn test_wrong_answer_keeps_score() {
        let docs = documents(vec![single("b", 10), single("a", 3)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        session.confirm(&docs, &["b"]).unwrap();
        session.advance(&docs).unwrap();

        session.confirm(&docs, &["a", "b"]).unwrap();
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_confirm_while_advancing_is_rejected() {
        let docs = documents(vec![single("b", 10), single("a", 3)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        session.confirm(&docs, &["b"]).unwrap();

        let result = session.confirm(&docs, &["b"]);
        assert!(matches!(result, Err(QuizError::InvalidTransition { .. })));
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_advance_outside_advancing_is_rejected() {
        let docs = documents(vec![single("b", 10)], default_tiers());
        let mut session = QuizSession::new();
        assert!(matches!(
            session.advance(&docs),
            Err(QuizError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_completed_session_is_terminal() {
        let docs = documents(vec![single("b", 10)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        session.confirm(&docs, &["b"]).unwrap();
        session.advance(&docs).unwrap();

        assert!(session.phase().is_terminal());
        assert!(session.confirm(&docs, &["b"]).is_err());
        assert!(session.advance(&docs).is_err());
        assert!(session.abort().is_err());
    }

    #[test]
    fn test_abort_during_delay() {
        let docs = documents(vec![single("b", 10), single("a", 3)], default_tiers());
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        session.confirm(&docs, &["b"]).unwrap();

        session.abort().unwrap();
        assert_eq!(session.phase(), &Phase::Aborted);
        assert!(session.advance(&docs).is_err());
    }

    #[test]
    fn test_empty_quiz_fails_at_completion() {
        let docs = documents(Vec::new(), default_tiers());
        let mut session = QuizSession::new();

        let result = session.confirm(&docs, &NOTHING);
        assert!(matches!(result, Err(QuizError::DivisionUndefined)));
        assert!(matches!(session.phase(), Phase::Failed(_)));
    }

    #[test]
    fn test_uncovered_score_fails_at_completion() {
        let tiers = vec![
            tier(50, "Low"),
            ResultTier {
                min_points: Some(60),
                ..tier(100, "High")
            },
        ];
        let question = |correct: &str| single(correct, 1);
        let mut questions: Vec<Question> = (0..11).map(|_| question("a")).collect();
        questions.extend((0..9).map(|_| question("b")));
        let docs = documents(questions, tiers);

        // 11 of 20 correct = 55%
        let mut session = QuizSession::new();
        session.confirm(&docs, &NOTHING).unwrap();
        let mut last = None;
        for _ in 0..20 {
            session.confirm(&docs, &["a"]).unwrap();
            last = Some(session.advance(&docs));
        }

        assert!(matches!(last, Some(Err(QuizError::NoTierMatched { .. }))));
        assert_eq!(session.score(), 11);
        assert!(matches!(session.phase(), Phase::Failed(_)));
    }
}
