use serde::{Deserialize, Serialize};

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{Answer, Question};
use crate::db::types::{AnswerStatus, TestStatus};
use crate::services::marking::{IngestSummary, MarkReport};

/// Uploaded answer sheet: a rectangular grid of cells. Row 0 is the header
/// (student column followed by question titles), every other row is one
/// student's answers.
#[derive(Debug, Deserialize)]
pub(crate) struct SheetUpload {
    pub(crate) grid: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SheetAccepted {
    pub(crate) students: usize,
    pub(crate) answers: usize,
    pub(crate) status: TestStatus,
}

impl SheetAccepted {
    pub(crate) fn from_summary(summary: IngestSummary) -> Self {
        Self {
            students: summary.students,
            answers: summary.answers,
            status: TestStatus::AutoMarking,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkReportResponse {
    pub(crate) status: TestStatus,
    pub(crate) unmarked: i64,
    pub(crate) flagged: i64,
    pub(crate) completed: i64,
}

impl MarkReportResponse {
    pub(crate) fn from_report(report: MarkReport) -> Self {
        Self {
            status: report.status,
            unmarked: report.unmarked,
            flagged: report.flagged,
            completed: report.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerMarkUpdate {
    pub(crate) mark: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) question_title: Option<String>,
    pub(crate) student_name: String,
    pub(crate) answer_text: Option<String>,
    pub(crate) mark_gained: i32,
    pub(crate) status: AnswerStatus,
    pub(crate) updated_at: String,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            question_title: None,
            student_name: answer.student_name,
            answer_text: answer.answer_text,
            mark_gained: answer.mark_gained,
            status: answer.status,
            updated_at: format_primitive(answer.updated_at),
        }
    }

    pub(crate) fn with_question(answer: Answer, question: &Question) -> Self {
        let mut response = Self::from_db(answer);
        response.question_title = Some(question.title.clone());
        response
    }
}
