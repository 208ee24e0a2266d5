//! Quiz rounds for the Predict and Goat routes, and the Feelings sorting
//! board. Views own the timers; everything here is synchronous state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::error::ContentError;

pub mod content;
pub mod feelings;

pub use content::{Content, FeelingsItem, GoatPair, Modality, PredictSet, Side};
pub use feelings::{Cluster, FeelingsBoard};

/// How long feedback stays up before the next question.
pub const FEEDBACK_DELAY_MS: i32 = 1500;

pub const PREDICT_CORRECT: &[&str] = &[
    "You saw what was coming...",
    "The future recognized you.",
    "Time bent in your favor.",
    "The pattern revealed itself.",
    "You predicted correctly.",
];

pub const PREDICT_INCORRECT: &[&str] = &[
    "Time slipped through your fingers...",
    "The future looked away.",
    "A different path was taken.",
    "The pattern remained hidden.",
    "You misread the signs.",
];

pub const GOAT_CORRECT: &[&str] = &[
    "The goat nods knowingly.",
    "You saw the pattern.",
    "Correct. The sequence continues.",
    "The future goat approves.",
    "You predicted the next form.",
];

pub const GOAT_INCORRECT: &[&str] = &[
    "The goat looks away.",
    "A different goat emerged.",
    "The pattern shifted.",
    "You misread the sequence.",
    "The goat remains unknowable.",
];

/// A question with one right answer.
pub trait Question {
    type Choice: Copy + PartialEq;

    /// Analytics event emitted per answer.
    const EVENT: &'static str;
    const CORRECT: &'static [&'static str];
    const INCORRECT: &'static [&'static str];

    fn answer(&self) -> Self::Choice;
    fn event_props(&self, choice: Self::Choice) -> Value;
}

impl Question for PredictSet {
    type Choice = usize;

    const EVENT: &'static str = "predict_choice";
    const CORRECT: &'static [&'static str] = PREDICT_CORRECT;
    const INCORRECT: &'static [&'static str] = PREDICT_INCORRECT;

    fn answer(&self) -> usize {
        self.answer_index
    }

    fn event_props(&self, choice: usize) -> Value {
        json!({ "idx": choice, "answer": self.answer_index })
    }
}

impl Question for GoatPair {
    type Choice = Side;

    const EVENT: &'static str = "goat_pick";
    const CORRECT: &'static [&'static str] = GOAT_CORRECT;
    const INCORRECT: &'static [&'static str] = GOAT_INCORRECT;

    fn answer(&self) -> Side {
        self.next
    }

    fn event_props(&self, choice: Side) -> Value {
        json!({ "which": choice.as_str(), "expected": self.next.as_str() })
    }
}

/// Outcome of one answer.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub correct: bool,
    /// Score before this answer was counted.
    pub previous_score: i64,
    pub score: i64,
    pub message: &'static str,
    pub event: &'static str,
    pub props: Value,
}

/// Cycles through an ordered question list keeping a signed score.
pub struct QuizRound<Q: Question> {
    items: Vec<Q>,
    index: usize,
    score: i64,
    feedback: Option<&'static str>,
    transitioning: bool,
    rng: StdRng,
}

impl<Q: Question> QuizRound<Q> {
    pub fn new(file: &'static str, items: Vec<Q>) -> Result<Self, ContentError> {
        Self::with_rng(file, items, StdRng::from_entropy())
    }

    pub fn with_seed(file: &'static str, items: Vec<Q>, seed: u64) -> Result<Self, ContentError> {
        Self::with_rng(file, items, StdRng::seed_from_u64(seed))
    }

    fn with_rng(file: &'static str, items: Vec<Q>, rng: StdRng) -> Result<Self, ContentError> {
        if items.is_empty() {
            return Err(ContentError::Empty { file });
        }
        Ok(Self {
            items,
            index: 0,
            score: 0,
            feedback: None,
            transitioning: false,
            rng,
        })
    }

    pub fn current(&self) -> &Q {
        &self.items[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn feedback(&self) -> Option<&'static str> {
        self.feedback
    }

    /// True while feedback is showing; answers are ignored until `advance`.
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Records an answer to the current question. Returns `None` while the
    /// previous answer's feedback is still up.
    pub fn answer(&mut self, choice: Q::Choice) -> Option<Verdict> {
        if self.transitioning {
            return None;
        }
        let question = &self.items[self.index];
        let correct = choice == question.answer();
        let props = question.event_props(choice);
        let previous_score = self.score;
        self.score += if correct { 1 } else { -1 };
        let pool = if correct { Q::CORRECT } else { Q::INCORRECT };
        let message = pool[self.rng.gen_range(0..pool.len())];
        self.feedback = Some(message);
        self.transitioning = true;
        Some(Verdict {
            correct,
            previous_score,
            score: self.score,
            message,
            event: Q::EVENT,
            props,
        })
    }

    /// Clears feedback and moves to the next question, wrapping around.
    pub fn advance(&mut self) {
        self.feedback = None;
        self.index = (self.index + 1) % self.items.len();
        self.transitioning = false;
    }
}

/// Ambient bus level the Goat route fades to after an answer, given the
/// score before it.
pub fn goat_ambient_level(previous_score: i64, correct: bool) -> f32 {
    if correct {
        0.3 + previous_score.min(10) as f32 * 0.02
    } else {
        (0.3 - previous_score.unsigned_abs() as f32 * 0.02).max(0.2)
    }
}

/// Seed-derived proportions of a drawn goat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoatShape {
    pub ear: u32,
    pub horn: u32,
}

impl GoatShape {
    pub fn from_seed(seed: u32) -> Self {
        Self {
            ear: 6 + seed % 4,
            horn: 10 + seed.wrapping_mul(3) % 6,
        }
    }

    /// Inline SVG for the goat card.
    pub fn svg(&self) -> String {
        format!(
            "<svg viewBox='0 0 100 60' width='100%' height='100%'>\
             <circle cx='30' cy='30' r='14' stroke='#9cd3ff' fill='none' stroke-width='2' style='filter:drop-shadow(0 0 8px rgba(156,211,255,0.5))'/>\
             <path d='M38 26 q {horn} -10 16 0' stroke='#e6f0f2' fill='none' stroke-width='2'/>\
             <circle cx='26' cy='28' r='2' fill='#e6f0f2'/>\
             <circle cx='34' cy='28' r='2' fill='#e6f0f2'/>\
             <path d='M20 20 q {ear} -8 8 0' stroke='#e6f0f2' fill='none' stroke-width='2'/>\
             <rect x='50' y='34' width='28' height='10' stroke='#9cd3ff' fill='none' stroke-width='2'/>\
             </svg>",
            horn = self.horn,
            ear = self.ear,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict() -> Vec<PredictSet> {
        (0..3)
            .map(|i| PredictSet {
                prompt: format!("p{i}"),
                choices: vec!["x".into(), "y".into(), "z".into()],
                answer_index: i,
            })
            .collect()
    }

    #[test]
    fn answer_scores_and_locks_until_advance() {
        let mut round = QuizRound::with_seed("predict_sets.json", predict(), 1).unwrap();
        let v = round.answer(0).unwrap();
        assert!(v.correct);
        assert_eq!(v.score, 1);
        assert!(PREDICT_CORRECT.contains(&v.message));
        assert_eq!(v.props, json!({ "idx": 0, "answer": 0 }));
        assert!(round.answer(0).is_none());
        round.advance();
        assert_eq!(round.index(), 1);
        assert!(round.feedback().is_none());
        let v = round.answer(0).unwrap();
        assert!(!v.correct);
        assert_eq!(v.previous_score, 1);
        assert_eq!(round.score(), 0);
        assert!(PREDICT_INCORRECT.contains(&v.message));
    }

    #[test]
    fn advance_wraps_around() {
        let mut round = QuizRound::with_seed("predict_sets.json", predict(), 2).unwrap();
        for _ in 0..3 {
            round.advance();
        }
        assert_eq!(round.index(), 0);
    }

    #[test]
    fn empty_sets_are_rejected() {
        let err = QuizRound::<GoatPair>::new("goat_pairs.json", vec![]).err();
        assert_eq!(err, Some(ContentError::Empty { file: "goat_pairs.json" }));
    }

    #[test]
    fn goat_event_uses_side_names() {
        let pair = GoatPair {
            a_seed: 1,
            b_seed: 2,
            next: Side::B,
        };
        let mut round = QuizRound::with_seed("goat_pairs.json", vec![pair], 3).unwrap();
        let v = round.answer(Side::A).unwrap();
        assert_eq!(v.event, "goat_pick");
        assert_eq!(v.props, json!({ "which": "a", "expected": "b" }));
    }

    #[test]
    fn ambient_level_follows_score() {
        assert!((goat_ambient_level(0, true) - 0.3).abs() < 1e-6);
        assert!((goat_ambient_level(25, true) - 0.5).abs() < 1e-6);
        assert!((goat_ambient_level(-2, false) - 0.26).abs() < 1e-6);
        assert!((goat_ambient_level(-20, false) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn goat_shape_from_seed() {
        assert_eq!(GoatShape::from_seed(5), GoatShape { ear: 7, horn: 13 });
        let svg = GoatShape::from_seed(5).svg();
        assert!(svg.contains("q 13 -10") && svg.contains("q 7 -8"));
    }
}
