use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Developer,
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "teststatus", rename_all = "snake_case")]
pub(crate) enum TestStatus {
    Unmarked,
    AutoMarking,
    AutoMarkFlagged,
    MarkCompleted,
    /// Never produced by the automatic transitions; kept so rows set by
    /// manual data fixes stay readable.
    MarkInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "answerstatus", rename_all = "lowercase")]
pub(crate) enum AnswerStatus {
    Unmarked,
    Flagged,
    Completed,
}

/// Marking outcome for one mistake category: tolerate it (`Correct`),
/// zero the answer (`Incorrect`), or defer to a human (`Flag`). Lives
/// inside the `mark_config` JSON, never as a column of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MistakeOption {
    Correct,
    Incorrect,
    Flag,
}
