//! Error types shared across the crate.
//!
//! Everything user-facing degrades silently (muted audio, static background),
//! so these mostly end up in a `tracing::warn!` rather than in front of the
//! player. Only `AppError` crosses the wasm boundary.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Static content (question sets) failed to load or validate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("malformed {file}: {reason}")]
    Malformed { file: &'static str, reason: String },

    #[error("{file} is empty")]
    Empty { file: &'static str },

    #[error("{file}[{index}]: answer_index {answer} out of range for {choices} choices")]
    AnswerOutOfRange {
        file: &'static str,
        index: usize,
        answer: usize,
        choices: usize,
    },

    #[error("{file}[{index}]: needs at least two choices")]
    TooFewChoices { file: &'static str, index: usize },

    #[error("{file}: duplicate id {id}")]
    DuplicateId { file: &'static str, id: String },

    #[error("{file}: item {id} has no alt text")]
    MissingAlt { file: &'static str, id: String },
}

/// Audio graph construction or playback failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("failed to load audio {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("audio graph error: {0}")]
    Graph(String),
}

/// Talking to the embedding parent window failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("no parent window to post to")]
    NoParent,

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("postMessage failed: {0}")]
    Post(String),
}

/// Errors from the content-lint tool.
#[derive(Error, Debug)]
pub enum LintError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy file {path}: {source}")]
    Policy {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level failure while booting the browser app.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("no {0} available")]
    Missing(&'static str),

    #[error("dom error: {0}")]
    Dom(String),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl From<JsValue> for AppError {
    fn from(value: JsValue) -> Self {
        AppError::Dom(js_error_message(&value))
    }
}

impl From<AppError> for JsValue {
    fn from(err: AppError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort text for a thrown JS value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_error_messages_name_the_file() {
        let err = ContentError::AnswerOutOfRange {
            file: "predict_sets.json",
            index: 2,
            answer: 5,
            choices: 4,
        };
        assert_eq!(
            err.to_string(),
            "predict_sets.json[2]: answer_index 5 out of range for 4 choices"
        );
    }

    #[test]
    fn app_error_wraps_content_error_transparently() {
        let err: AppError = ContentError::Empty { file: "goat_pairs.json" }.into();
        assert_eq!(err.to_string(), "goat_pairs.json is empty");
    }
}
