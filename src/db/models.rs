use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AnswerStatus, MistakeOption, TestStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One accepted canonical answer phrase. Individual words of `key` may carry
/// alternatives; the matcher accepts any of them in place of the word.
///
/// Stored as an ordered list of `{word, alternatives}` pairs rather than a
/// map so the JSON wire format and the in-memory shape cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AnswerKey {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) alternatives: Vec<WordAlternatives>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WordAlternatives {
    pub(crate) word: String,
    #[serde(default)]
    pub(crate) alternatives: Vec<String>,
}

/// One step of a question's rating scale. The maximum `mark` across the
/// scale is the award for a fully correct automatic match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RatingLevel {
    pub(crate) mark: i32,
    pub(crate) description: String,
}

/// Maps each surface-mistake category to its marking outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MarkConfig {
    pub(crate) case_mistakes: MistakeOption,
    pub(crate) contraction_mistakes: MistakeOption,
    pub(crate) punctuation_mistakes: MistakeOption,
    pub(crate) spelling_mistakes: MistakeOption,
    pub(crate) grammatical_errors: MistakeOption,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Test {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) status: TestStatus,
    pub(crate) mark_config: Json<MarkConfig>,
    pub(crate) developer_id: String,
    pub(crate) marked_by: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) last_status_change_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) keys: Json<Vec<AnswerKey>>,
    pub(crate) rating_scale: Json<Vec<RatingLevel>>,
    pub(crate) mark_level: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Question {
    /// Highest mark on the rating scale; the award for an exact key match.
    pub(crate) fn max_score(&self) -> i32 {
        self.rating_scale.0.iter().map(|level| level.mark).max().unwrap_or(0)
    }

    pub(crate) fn min_score(&self) -> i32 {
        self.rating_scale.0.iter().map(|level| level.mark).min().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) student_name: String,
    pub(crate) answer_text: Option<String>,
    pub(crate) mark_gained: i32,
    pub(crate) status: AnswerStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
