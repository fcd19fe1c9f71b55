use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{AnswerKey, MarkConfig, Question, RatingLevel, Test, WordAlternatives};
use crate::db::types::{MistakeOption, TestStatus};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "markConfig")]
    pub(crate) mark_config: MarkConfigBody,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "markConfig")]
    pub(crate) mark_config: MarkConfigBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkConfigBody {
    #[serde(alias = "caseMistakes")]
    pub(crate) case_mistakes: MistakeOption,
    #[serde(alias = "contractionMistakes")]
    pub(crate) contraction_mistakes: MistakeOption,
    #[serde(alias = "punctuationMistakes")]
    pub(crate) punctuation_mistakes: MistakeOption,
    #[serde(alias = "spellingMistakes")]
    pub(crate) spelling_mistakes: MistakeOption,
    #[serde(alias = "grammaticalErrors")]
    pub(crate) grammatical_errors: MistakeOption,
}

impl MarkConfigBody {
    pub(crate) fn into_config(self) -> MarkConfig {
        MarkConfig {
            case_mistakes: self.case_mistakes,
            contraction_mistakes: self.contraction_mistakes,
            punctuation_mistakes: self.punctuation_mistakes,
            spelling_mistakes: self.spelling_mistakes,
            grammatical_errors: self.grammatical_errors,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkerAssign {
    #[serde(alias = "markerId")]
    pub(crate) marker_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "keys must not be empty"))]
    pub(crate) keys: Vec<AnswerKeyBody>,
    #[serde(alias = "ratingScale")]
    #[validate(length(min = 1, message = "rating_scale must not be empty"))]
    pub(crate) rating_scale: Vec<RatingLevelBody>,
    #[serde(default = "default_mark_level")]
    #[serde(alias = "markLevel")]
    #[validate(range(min = 1, message = "mark_level must be positive"))]
    pub(crate) mark_level: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AnswerKeyBody {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) alternatives: Vec<WordAlternativesBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WordAlternativesBody {
    pub(crate) word: String,
    #[serde(default)]
    pub(crate) alternatives: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RatingLevelBody {
    pub(crate) mark: i32,
    #[serde(default)]
    pub(crate) description: String,
}

impl AnswerKeyBody {
    pub(crate) fn into_key(self) -> AnswerKey {
        AnswerKey {
            key: self.key,
            alternatives: self
                .alternatives
                .into_iter()
                .map(|group| WordAlternatives { word: group.word, alternatives: group.alternatives })
                .collect(),
        }
    }
}

impl RatingLevelBody {
    pub(crate) fn into_level(self) -> RatingLevel {
        RatingLevel { mark: self.mark, description: self.description }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) status: TestStatus,
    pub(crate) mark_config: MarkConfig,
    pub(crate) developer_id: String,
    pub(crate) marked_by: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TestResponse {
    pub(crate) fn from_db(test: Test) -> Self {
        Self {
            id: test.id,
            name: test.name,
            status: test.status,
            mark_config: test.mark_config.0,
            developer_id: test.developer_id,
            marked_by: test.marked_by,
            is_published: test.is_published,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) keys: Vec<AnswerKey>,
    pub(crate) rating_scale: Vec<RatingLevel>,
    pub(crate) mark_level: i32,
    pub(crate) max_score: i32,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        let max_score = question.max_score();
        Self {
            id: question.id,
            test_id: question.test_id,
            title: question.title,
            keys: question.keys.0,
            rating_scale: question.rating_scale.0,
            mark_level: question.mark_level,
            max_score,
            created_at: format_primitive(question.created_at),
        }
    }
}

fn default_mark_level() -> i32 {
    1
}
