use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentUser};
use crate::core::state::AppState;
use crate::schemas::marking::{
    AnswerMarkUpdate, AnswerResponse, MarkReportResponse, SheetAccepted, SheetUpload,
};
use crate::services::marking;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:test_id/sheet", post(upload_sheet))
        .route("/:test_id/report", get(report))
        .route("/:test_id/download", get(download))
        .route("/:test_id/answers/flagged", get(flagged_answers))
        .route("/:test_id/answers/:answer_id/mark", put(update_answer_mark))
}

/// Accepts an answer sheet and kicks off the scoring pass in the background.
/// The response returns before scoring finishes; poll the report endpoint
/// for the outcome.
async fn upload_sheet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(test_id): Path<String>,
    Json(payload): Json<SheetUpload>,
) -> Result<(StatusCode, Json<SheetAccepted>), ApiError> {
    guards::require_test_owner(&state, &user, &test_id).await?;

    let summary = marking::ingest_sheet(&state, &test_id, &payload.grid).await?;

    let worker_state = state.clone();
    let worker_test_id = test_id.clone();
    tokio::spawn(async move {
        if let Err(err) = marking::run_auto_marking(&worker_state, &worker_test_id).await {
            tracing::error!(test_id = %worker_test_id, error = %err, "Auto marking failed");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(SheetAccepted::from_summary(summary))))
}

async fn report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(test_id): Path<String>,
) -> Result<Json<MarkReportResponse>, ApiError> {
    guards::require_test_access(&state, &user, &test_id).await?;

    let report = marking::report(&state, &test_id).await?;
    Ok(Json(MarkReportResponse::from_report(report)))
}

async fn download(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let test = guards::require_test_access(&state, &user, &test_id).await?;

    let csv = marking::download_csv(&state, &test_id).await?;
    let disposition = format!("attachment; filename=\"{}-marks.csv\"", sanitize_filename(&test.name));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

async fn flagged_answers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(test_id): Path<String>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    guards::require_test_marker(&state, &user, &test_id).await?;

    let answers = marking::flagged_answers(&state, &test_id).await?;
    Ok(Json(
        answers
            .into_iter()
            .map(|(answer, question)| AnswerResponse::with_question(answer, &question))
            .collect(),
    ))
}

async fn update_answer_mark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((test_id, answer_id)): Path<(String, String)>,
    Json(payload): Json<AnswerMarkUpdate>,
) -> Result<Json<AnswerResponse>, ApiError> {
    guards::require_test_marker(&state, &user, &test_id).await?;

    let answer = marking::update_answer_mark(&state, &test_id, &answer_id, payload.mark).await?;
    Ok(Json(AnswerResponse::from_db(answer)))
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "test".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests;
