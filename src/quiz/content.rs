//! Static question sets, embedded at build time and validated on load.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

pub const PREDICT_FILE: &str = "predict_sets.json";
pub const GOAT_FILE: &str = "goat_pairs.json";
pub const FEELINGS_FILE: &str = "feelings_items.json";

const PREDICT_JSON: &str = include_str!("../../data/predict_sets.json");
const GOAT_JSON: &str = include_str!("../../data/goat_pairs.json");
const FEELINGS_JSON: &str = include_str!("../../data/feelings_items.json");

/// "What happens five steps later?" question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictSet {
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
}

/// Left or right goat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

/// Two goats; `next` names the one that continues the sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoatPair {
    pub a_seed: u32,
    pub b_seed: u32,
    pub next: Side,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Image,
}

/// Something to sort by feel. `alt` doubles as the visible label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeelingsItem {
    pub id: String,
    #[serde(default)]
    pub alt: String,
    pub modality: Modality,
    #[serde(default)]
    pub src: Option<String>,
}

/// All three question sets.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    pub predict: Vec<PredictSet>,
    pub goat: Vec<GoatPair>,
    pub feelings: Vec<FeelingsItem>,
}

impl Content {
    /// The sets shipped with the crate.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_json(PREDICT_JSON, GOAT_JSON, FEELINGS_JSON)
    }

    pub fn from_json(predict: &str, goat: &str, feelings: &str) -> Result<Self, ContentError> {
        Ok(Self {
            predict: parse_predict(predict)?,
            goat: parse_goat(goat)?,
            feelings: parse_feelings(feelings)?,
        })
    }
}

fn parse<T: for<'de> Deserialize<'de>>(file: &'static str, json: &str) -> Result<Vec<T>, ContentError> {
    let items: Vec<T> = serde_json::from_str(json).map_err(|e| ContentError::Malformed {
        file,
        reason: e.to_string(),
    })?;
    if items.is_empty() {
        return Err(ContentError::Empty { file });
    }
    Ok(items)
}

pub fn parse_predict(json: &str) -> Result<Vec<PredictSet>, ContentError> {
    let sets: Vec<PredictSet> = parse(PREDICT_FILE, json)?;
    for (index, set) in sets.iter().enumerate() {
        if set.choices.len() < 2 {
            return Err(ContentError::TooFewChoices {
                file: PREDICT_FILE,
                index,
            });
        }
        if set.answer_index >= set.choices.len() {
            return Err(ContentError::AnswerOutOfRange {
                file: PREDICT_FILE,
                index,
                answer: set.answer_index,
                choices: set.choices.len(),
            });
        }
    }
    Ok(sets)
}

/// `next` outside `"a"`/`"b"` is rejected by deserialization.
pub fn parse_goat(json: &str) -> Result<Vec<GoatPair>, ContentError> {
    parse(GOAT_FILE, json)
}

pub fn parse_feelings(json: &str) -> Result<Vec<FeelingsItem>, ContentError> {
    let items: Vec<FeelingsItem> = parse(FEELINGS_FILE, json)?;
    let mut seen = HashSet::new();
    for item in &items {
        if !seen.insert(item.id.as_str()) {
            return Err(ContentError::DuplicateId {
                file: FEELINGS_FILE,
                id: item.id.clone(),
            });
        }
        if item.alt.trim().is_empty() {
            return Err(ContentError::MissingAlt {
                file: FEELINGS_FILE,
                id: item.id.clone(),
            });
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_content_loads() {
        let content = Content::builtin().expect("shipped content must validate");
        assert!(!content.predict.is_empty());
        assert!(!content.goat.is_empty());
        assert!(!content.feelings.is_empty());
    }

    #[test]
    fn rejects_answer_past_choices() {
        let json = r#"[{"prompt":"p","choices":["a","b"],"answer_index":2}]"#;
        assert!(matches!(
            parse_predict(json),
            Err(ContentError::AnswerOutOfRange { answer: 2, choices: 2, .. })
        ));
    }

    #[test]
    fn rejects_unknown_goat_side() {
        let json = r#"[{"a_seed":1,"b_seed":2,"next":"c"}]"#;
        assert!(matches!(parse_goat(json), Err(ContentError::Malformed { .. })));
    }

    #[test]
    fn rejects_blank_alt() {
        let json = r#"[{"id":"hum","alt":"  ","modality":"audio","src":"a.m4a"}]"#;
        assert_eq!(
            parse_feelings(json),
            Err(ContentError::MissingAlt {
                file: FEELINGS_FILE,
                id: "hum".into()
            })
        );
    }

    #[test]
    fn rejects_empty_sets() {
        assert_eq!(parse_goat("[]"), Err(ContentError::Empty { file: GOAT_FILE }));
    }
}
