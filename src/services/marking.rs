use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Answer, Question};
use crate::db::types::{AnswerStatus, TestStatus};
use crate::repositories;
use crate::services::scoring::FLAGGED;
use crate::services::sheet::{self, SheetError};

#[derive(Debug, Error)]
pub(crate) enum MarkingError {
    #[error("Test not found")]
    TestNotFound,
    #[error("Answer not found")]
    AnswerNotFound,
    #[error("Test has been auto marked.")]
    AlreadyMarked,
    #[error("Test has not been auto marked yet")]
    NotYetMarked,
    #[error("Answer has already been marked")]
    AnswerAlreadyMarked,
    #[error("Question with title {0} does not exist")]
    QuestionNotFound(String),
    #[error("Mark {mark} is outside the rating scale [{min}, {max}]")]
    MarkOutOfScale { mark: i32, min: i32, max: i32 },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("database error")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct IngestSummary {
    pub(crate) students: usize,
    pub(crate) answers: usize,
}

#[derive(Debug)]
pub(crate) struct MarkReport {
    pub(crate) status: TestStatus,
    pub(crate) unmarked: i64,
    pub(crate) flagged: i64,
    pub(crate) completed: i64,
}

/// Stores an uploaded answer sheet and moves the test into `auto_marking`.
///
/// The status transition is a compare-and-set inside the same transaction as
/// the answer inserts, so a concurrent upload of the same test fails cleanly
/// and a failed sheet leaves no partial rows behind. Scoring itself runs
/// afterwards, see [`run_auto_marking`].
pub(crate) async fn ingest_sheet(
    state: &AppState,
    test_id: &str,
    grid: &[Vec<String>],
) -> Result<IngestSummary, MarkingError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(MarkingError::TestNotFound)?;
    if test.status != TestStatus::Unmarked {
        return Err(MarkingError::AlreadyMarked);
    }

    let answer_sheet = sheet::parse_grid(grid, state.settings().marking())?;

    let mut question_ids = Vec::with_capacity(answer_sheet.question_titles.len());
    for title in &answer_sheet.question_titles {
        let question = repositories::questions::find_by_title(state.db(), test_id, title)
            .await?
            .ok_or_else(|| MarkingError::QuestionNotFound(title.clone()))?;
        question_ids.push(question.id);
    }

    let now = primitive_now_utc();
    let mut tx = state.db().begin().await?;

    let claimed: Option<(String,)> = sqlx::query_as(
        "UPDATE tests SET status = $1, last_status_change_at = $2, updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING id",
    )
    .bind(TestStatus::AutoMarking)
    .bind(now)
    .bind(test_id)
    .bind(TestStatus::Unmarked)
    .fetch_optional(&mut *tx)
    .await?;
    if claimed.is_none() {
        return Err(MarkingError::AlreadyMarked);
    }

    let mut inserted = 0;
    for row in &answer_sheet.rows {
        for (question_id, answer_text) in question_ids.iter().zip(&row.answers) {
            repositories::answers::create(
                &mut *tx,
                repositories::answers::CreateAnswer {
                    id: &Uuid::new_v4().to_string(),
                    question_id,
                    student_name: &row.student_name,
                    answer_text: answer_text.as_deref(),
                    created_at: now,
                },
            )
            .await?;
            inserted += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        test_id,
        students = answer_sheet.rows.len(),
        answers = inserted,
        "Ingested answer sheet"
    );

    Ok(IngestSummary { students: answer_sheet.rows.len(), answers: inserted })
}

/// Scores every unmarked answer of a test and settles the final status.
///
/// Only answers still in `unmarked` are touched, so an interrupted pass can
/// be resumed by running it again. The terminal status is derived from the
/// answer table, not from in-memory tallies.
pub(crate) async fn run_auto_marking(state: &AppState, test_id: &str) -> anyhow::Result<()> {
    let Some(test) = repositories::tests::find_by_id(state.db(), test_id).await? else {
        anyhow::bail!("Test {test_id} disappeared before scoring");
    };
    if test.status != TestStatus::AutoMarking {
        tracing::debug!(test_id, status = ?test.status, "Skipping scoring pass");
        return Ok(());
    }

    let questions: HashMap<String, Question> =
        repositories::questions::list_by_test(state.db(), test_id)
            .await?
            .into_iter()
            .map(|question| (question.id.clone(), question))
            .collect();

    let pending = repositories::answers::list_unmarked_for_test(state.db(), test_id).await?;
    let mut scored = 0usize;
    let mut flagged = 0usize;

    for answer in &pending {
        let Some(question) = questions.get(&answer.question_id) else {
            continue;
        };

        let mark = state.scorer().score(
            answer.answer_text.as_deref(),
            &question.keys.0,
            &test.mark_config.0,
            question.max_score(),
        );
        // The flag sentinel never reaches storage; a flagged answer carries
        // mark 0 until a human decides.
        let (stored_mark, status) = if mark == FLAGGED {
            flagged += 1;
            (0, AnswerStatus::Flagged)
        } else {
            (mark, AnswerStatus::Completed)
        };

        repositories::answers::update_mark(
            state.db(),
            &answer.id,
            stored_mark,
            status,
            primitive_now_utc(),
        )
        .await?;
        scored += 1;
    }

    let counts = repositories::answers::status_counts_for_test(state.db(), test_id).await?;
    let final_status = if counts.flagged > 0 {
        TestStatus::AutoMarkFlagged
    } else {
        TestStatus::MarkCompleted
    };
    repositories::tests::update_status(state.db(), test_id, final_status, primitive_now_utc())
        .await?;

    metrics::counter!("automark_answers_scored_total").increment(scored as u64);
    metrics::counter!("automark_answers_flagged_total").increment(flagged as u64);
    tracing::info!(test_id, scored, flagged, status = ?final_status, "Auto marking finished");

    Ok(())
}

/// Applies a human mark to one flagged answer. The mark must sit on the
/// question's rating scale; once no unmarked or flagged answers remain the
/// test moves to `mark_completed`.
pub(crate) async fn update_answer_mark(
    state: &AppState,
    test_id: &str,
    answer_id: &str,
    mark: i32,
) -> Result<Answer, MarkingError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(MarkingError::TestNotFound)?;
    if !matches!(test.status, TestStatus::AutoMarkFlagged | TestStatus::MarkCompleted) {
        return Err(MarkingError::NotYetMarked);
    }

    let answer = repositories::answers::find_by_id(state.db(), answer_id)
        .await?
        .ok_or(MarkingError::AnswerNotFound)?;
    if answer.status != AnswerStatus::Flagged {
        return Err(MarkingError::AnswerAlreadyMarked);
    }
    let question = repositories::questions::find_by_id(state.db(), &answer.question_id)
        .await?
        .filter(|question| question.test_id == test_id)
        .ok_or(MarkingError::AnswerNotFound)?;

    let (min, max) = (question.min_score(), question.max_score());
    if mark < min || mark > max {
        return Err(MarkingError::MarkOutOfScale { mark, min, max });
    }

    let now = primitive_now_utc();
    let answer = repositories::answers::update_mark(
        state.db(),
        answer_id,
        mark,
        AnswerStatus::Completed,
        now,
    )
    .await?
    .ok_or(MarkingError::AnswerNotFound)?;

    let counts = repositories::answers::status_counts_for_test(state.db(), test_id).await?;
    if counts.unmarked == 0 && counts.flagged == 0 && test.status != TestStatus::MarkCompleted {
        repositories::tests::update_status(state.db(), test_id, TestStatus::MarkCompleted, now)
            .await?;
        tracing::info!(test_id, "All flagged answers resolved; marking completed");
    }

    Ok(answer)
}

/// Answers of a test that still need a human decision.
pub(crate) async fn flagged_answers(
    state: &AppState,
    test_id: &str,
) -> Result<Vec<(Answer, Question)>, MarkingError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(MarkingError::TestNotFound)?;
    if !matches!(test.status, TestStatus::AutoMarkFlagged | TestStatus::MarkCompleted) {
        return Err(MarkingError::NotYetMarked);
    }

    let questions: HashMap<String, Question> =
        repositories::questions::list_by_test(state.db(), test_id)
            .await?
            .into_iter()
            .map(|question| (question.id.clone(), question))
            .collect();

    let answers = repositories::answers::list_for_test(state.db(), test_id).await?;
    Ok(answers
        .into_iter()
        .filter(|answer| answer.status == AnswerStatus::Flagged)
        .filter_map(|answer| {
            questions.get(&answer.question_id).cloned().map(|question| (answer, question))
        })
        .collect())
}

pub(crate) async fn report(state: &AppState, test_id: &str) -> Result<MarkReport, MarkingError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(MarkingError::TestNotFound)?;

    let counts = match test.status {
        TestStatus::Unmarked | TestStatus::AutoMarking => Default::default(),
        _ => repositories::answers::status_counts_for_test(state.db(), test_id).await?,
    };

    Ok(MarkReport {
        status: test.status,
        unmarked: counts.unmarked,
        flagged: counts.flagged,
        completed: counts.completed,
    })
}

/// Renders the marked sheet as CSV. Flagged answers are labelled, and a
/// student's total is labelled too while any of their answers is still
/// flagged.
pub(crate) async fn download_csv(state: &AppState, test_id: &str) -> Result<String, MarkingError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(MarkingError::TestNotFound)?;
    if !matches!(test.status, TestStatus::AutoMarkFlagged | TestStatus::MarkCompleted) {
        return Err(MarkingError::NotYetMarked);
    }

    let questions = repositories::questions::list_by_test(state.db(), test_id).await?;
    let answers = repositories::answers::list_for_test(state.db(), test_id).await?;
    Ok(render_marked_sheet(&questions, &answers))
}

fn render_marked_sheet(questions: &[Question], answers: &[Answer]) -> String {
    let column_of: HashMap<&str, usize> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| (question.id.as_str(), index))
        .collect();

    // Students appear in first-seen order.
    let mut order: Vec<&str> = Vec::new();
    let mut cells: HashMap<&str, Vec<Option<&Answer>>> = HashMap::new();
    for answer in answers {
        let row = cells.entry(answer.student_name.as_str()).or_insert_with(|| {
            order.push(answer.student_name.as_str());
            vec![None; questions.len()]
        });
        if let Some(&column) = column_of.get(answer.question_id.as_str()) {
            row[column] = Some(answer);
        }
    }

    let mut grid = Vec::with_capacity(order.len() + 1);
    let mut header = Vec::with_capacity(questions.len() + 2);
    header.push("Student".to_string());
    header.extend(questions.iter().map(|question| question.title.clone()));
    header.push("Total".to_string());
    grid.push(header);

    for student in order {
        let row_answers = &cells[student];
        let mut row = Vec::with_capacity(questions.len() + 2);
        row.push(student.to_string());

        let mut total = 0;
        let mut tainted = false;
        for answer in row_answers {
            match answer {
                Some(answer) if answer.status == AnswerStatus::Flagged => {
                    tainted = true;
                    total += answer.mark_gained;
                    row.push(format!("{}(flagged)", answer.mark_gained));
                }
                Some(answer) => {
                    total += answer.mark_gained;
                    row.push(answer.mark_gained.to_string());
                }
                None => row.push(String::new()),
            }
        }
        row.push(if tainted { format!("{total}(flagged)") } else { total.to_string() });
        grid.push(row);
    }

    sheet::render_csv(&grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::RatingLevel;
    use sqlx::types::Json;

    fn question(id: &str, title: &str) -> Question {
        let now = primitive_now_utc();
        Question {
            id: id.to_string(),
            test_id: "t1".to_string(),
            title: title.to_string(),
            keys: Json(Vec::new()),
            rating_scale: Json(vec![
                RatingLevel { mark: 0, description: "wrong".to_string() },
                RatingLevel { mark: 2, description: "right".to_string() },
            ]),
            mark_level: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(id: &str, question_id: &str, student: &str, mark: i32, status: AnswerStatus) -> Answer {
        let now = primitive_now_utc();
        Answer {
            id: id.to_string(),
            question_id: question_id.to_string(),
            student_name: student.to_string(),
            answer_text: Some("x".to_string()),
            mark_gained: mark,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn marked_sheet_labels_flagged_cells_and_totals() {
        let questions = vec![question("q1", "Q1"), question("q2", "Q2")];
        let answers = vec![
            answer("a1", "q1", "Alice", 2, AnswerStatus::Completed),
            answer("a2", "q2", "Alice", 0, AnswerStatus::Flagged),
            answer("a3", "q1", "Bob", 0, AnswerStatus::Completed),
            answer("a4", "q2", "Bob", 2, AnswerStatus::Completed),
        ];

        let csv = render_marked_sheet(&questions, &answers);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Student,Q1,Q2,Total");
        assert_eq!(lines[1], "Alice,2,0(flagged),2(flagged)");
        assert_eq!(lines[2], "Bob,0,2,2");
    }

    #[test]
    fn marked_sheet_keeps_first_seen_student_order() {
        let questions = vec![question("q1", "Q1")];
        let answers = vec![
            answer("a1", "q1", "Zoe", 2, AnswerStatus::Completed),
            answer("a2", "q1", "Amy", 0, AnswerStatus::Completed),
        ];

        let csv = render_marked_sheet(&questions, &answers);
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("Zoe,"));
        assert!(lines[2].starts_with("Amy,"));
    }
}
