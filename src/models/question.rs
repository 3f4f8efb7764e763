//! Wire model and validation for exam questions.
//!
//! The remote pools and the cache files share one format: a JSON array of
//! question objects. Decoding always validates the whole batch; a single bad
//! entry rejects the payload rather than being dropped.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Fewest answer choices a question can offer and still be askable.
const MIN_ANSWERS: usize = 2;

/// One exam question with its answer choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    /// 0-based index into `answers`.
    pub correct: usize,
    pub answers: Vec<String>,
}

impl Question {
    /// The text of the correct answer choice.
    pub fn correct_answer(&self) -> Option<&str> {
        self.answers.get(self.correct).map(String::as_str)
    }

    fn validate(&self) -> Result<(), SyncError> {
        if self.answers.len() < MIN_ANSWERS {
            return Err(SyncError::InvalidRecord {
                id: self.id.clone(),
                reason: format!("only {} answer choice(s)", self.answers.len()),
            });
        }
        if self.correct >= self.answers.len() {
            return Err(SyncError::InvalidRecord {
                id: self.id.clone(),
                reason: format!(
                    "correct answer index {} out of range ({} answers)",
                    self.correct,
                    self.answers.len()
                ),
            });
        }
        Ok(())
    }
}

/// Decode a raw pool payload into a validated question list.
///
/// Fails on invalid JSON, on an empty pool (an empty bank is unusable, not
/// valid-but-empty), and on the first question violating the answer-index
/// invariant. Never returns partial content.
pub fn parse_questions(bytes: &[u8]) -> Result<Vec<Question>, SyncError> {
    let questions: Vec<Question> =
        serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedContent(e.to_string()))?;

    if questions.is_empty() {
        return Err(SyncError::MalformedContent("pool contains no questions".to_string()));
    }

    for question in &questions {
        question.validate()?;
    }

    Ok(questions)
}
