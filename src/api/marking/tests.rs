use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::models::MarkConfig;
use crate::db::types::{MistakeOption, TestStatus, UserRole};
use crate::repositories;
use crate::services::marking;
use crate::test_support;

fn contraction_flag_config() -> MarkConfig {
    MarkConfig { contraction_mistakes: MistakeOption::Flag, ..test_support::lenient_config() }
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn full_marking_workflow() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev001", UserRole::Developer).await;
    let marker = test_support::insert_user(db, "marker001", UserRole::Marker).await;
    let dev_token = test_support::bearer_token(&developer.id, ctx.state.settings());
    let marker_token = test_support::bearer_token(&marker.id, ctx.state.settings());

    let test =
        test_support::insert_test(db, "Capitals", &developer.id, contraction_flag_config()).await;
    test_support::insert_question(db, &test.id, "Q1", vec![test_support::simple_key("Paris")], 2)
        .await;
    test_support::insert_question(db, &test.id, "Q2", vec![test_support::simple_key("London")], 2)
        .await;

    let upload = json!({
        "grid": [
            ["Student", "Q1", "Q2"],
            ["Alice", "paris", "LONDON"],
            ["Bob", "it's Paris", ""]
        ]
    });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&dev_token),
            Some(upload),
        ))
        .await
        .expect("upload sheet");

    let status = response.status();
    let accepted = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::ACCEPTED, "response: {accepted}");
    assert_eq!(accepted["students"], 2);
    assert_eq!(accepted["answers"], 4);

    // The scoring pass is idempotent, so driving it directly keeps the
    // test independent from the spawned background task.
    marking::run_auto_marking(&ctx.state, &test.id).await.expect("auto marking");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/marking/{}/report", test.id),
            Some(&dev_token),
            None,
        ))
        .await
        .expect("report");
    let report = test_support::read_json(response).await;
    assert_eq!(report["status"], "auto_mark_flagged");
    assert_eq!(report["flagged"], 1);
    assert_eq!(report["completed"], 3);
    assert_eq!(report["unmarked"], 0);

    // Resolving the one flagged answer completes the marking.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/tests/{}/marker", test.id),
            Some(&dev_token),
            Some(json!({ "marker_id": marker.id })),
        ))
        .await
        .expect("assign marker");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/marking/{}/answers/flagged", test.id),
            Some(&marker_token),
            None,
        ))
        .await
        .expect("flagged answers");
    let flagged = test_support::read_json(response).await;
    assert_eq!(flagged.as_array().expect("array").len(), 1);
    let answer_id = flagged[0]["id"].as_str().expect("answer id").to_string();
    assert_eq!(flagged[0]["question_title"], "Q1");
    assert_eq!(flagged[0]["mark_gained"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/marking/{}/answers/{answer_id}/mark", test.id),
            Some(&marker_token),
            Some(json!({ "mark": 2 })),
        ))
        .await
        .expect("manual mark");
    let status = response.status();
    let marked = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {marked}");
    assert_eq!(marked["status"], "completed");
    assert_eq!(marked["mark_gained"], 2);

    let updated = repositories::tests::find_by_id(db, &test.id)
        .await
        .expect("fetch test")
        .expect("test exists");
    assert_eq!(updated.status, TestStatus::MarkCompleted);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/marking/{}/download", test.id),
            Some(&dev_token),
            None,
        ))
        .await
        .expect("download");
    assert_eq!(response.status(), StatusCode::OK);
    let csv = test_support::read_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Student,Q1,Q2,Total");
    // Student order is not part of the contract; find rows by name.
    assert!(lines.contains(&"Alice,2,2,4"), "csv: {csv}");
    assert!(lines.contains(&"Bob,2,0,2"), "csv: {csv}");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn second_upload_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev002", UserRole::Developer).await;
    let token = test_support::bearer_token(&developer.id, ctx.state.settings());
    let test = test_support::insert_test(db, "Rivers", &developer.id, contraction_flag_config())
        .await;
    test_support::insert_question(db, &test.id, "Q1", vec![test_support::simple_key("Nile")], 1)
        .await;

    let upload = json!({ "grid": [["Student", "Q1"], ["Alice", "Nile"]] });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&token),
            Some(upload.clone()),
        ))
        .await
        .expect("first upload");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&token),
            Some(upload),
        ))
        .await
        .expect("second upload");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["detail"], "Test has been auto marked.");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn unknown_question_title_rejects_the_sheet() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev003", UserRole::Developer).await;
    let token = test_support::bearer_token(&developer.id, ctx.state.settings());
    let test = test_support::insert_test(db, "Rivers", &developer.id, contraction_flag_config())
        .await;
    test_support::insert_question(db, &test.id, "Q1", vec![test_support::simple_key("Nile")], 1)
        .await;

    let upload = json!({ "grid": [["Student", "Q1", "Q99"], ["Alice", "Nile", "x"]] });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&token),
            Some(upload),
        ))
        .await
        .expect("upload");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "Question with title Q99 does not exist");

    // A rejected sheet leaves the test untouched.
    let test = repositories::tests::find_by_id(db, &test.id)
        .await
        .expect("fetch test")
        .expect("test exists");
    assert_eq!(test.status, TestStatus::Unmarked);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn manual_mark_must_sit_on_the_rating_scale() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev004", UserRole::Developer).await;
    let token = test_support::bearer_token(&developer.id, ctx.state.settings());
    let test = test_support::insert_test(db, "Rivers", &developer.id, contraction_flag_config())
        .await;
    test_support::insert_question(db, &test.id, "Q1", vec![test_support::simple_key("Nile")], 2)
        .await;

    let upload = json!({ "grid": [["Student", "Q1"], ["Alice", "it's the Nile"]] });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&token),
            Some(upload),
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    marking::run_auto_marking(&ctx.state, &test.id).await.expect("auto marking");

    let flagged = marking::flagged_answers(&ctx.state, &test.id).await.expect("flagged");
    let (answer, _question) = flagged.first().expect("one flagged answer");

    // Admins may mark without an assignment.
    let admin = test_support::insert_user(db, "admin004", UserRole::Admin).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/marking/{}/answers/{}/mark", test.id, answer.id),
            Some(&admin_token),
            Some(json!({ "mark": 5 })),
        ))
        .await
        .expect("out of scale mark");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "Mark 5 is outside the rating scale [0, 2]");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn completed_answer_cannot_be_remarked() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev006", UserRole::Developer).await;
    let token = test_support::bearer_token(&developer.id, ctx.state.settings());
    let test = test_support::insert_test(db, "Rivers", &developer.id, contraction_flag_config())
        .await;
    test_support::insert_question(db, &test.id, "Q1", vec![test_support::simple_key("Nile")], 2)
        .await;

    let upload = json!({ "grid": [["Student", "Q1"], ["Alice", "it's the Nile"]] });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/marking/{}/sheet", test.id),
            Some(&token),
            Some(upload),
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    marking::run_auto_marking(&ctx.state, &test.id).await.expect("auto marking");

    let flagged = marking::flagged_answers(&ctx.state, &test.id).await.expect("flagged");
    let (answer, _question) = flagged.first().expect("one flagged answer");

    let admin = test_support::insert_user(db, "admin006", UserRole::Admin).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/marking/{}/answers/{}/mark", test.id, answer.id),
            Some(&admin_token),
            Some(json!({ "mark": 2 })),
        ))
        .await
        .expect("first mark");
    assert_eq!(response.status(), StatusCode::OK);

    // A flagged answer is marked exactly once.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/marking/{}/answers/{}/mark", test.id, answer.id),
            Some(&admin_token),
            Some(json!({ "mark": 0 })),
        ))
        .await
        .expect("second mark");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["detail"], "Answer has already been marked");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn unassigned_marker_cannot_mark() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let developer = test_support::insert_user(db, "dev005", UserRole::Developer).await;
    let outsider = test_support::insert_user(db, "marker005", UserRole::Marker).await;
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());
    let test = test_support::insert_test(db, "Rivers", &developer.id, contraction_flag_config())
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/marking/{}/answers/flagged", test.id),
            Some(&outsider_token),
            None,
        ))
        .await
        .expect("flagged answers");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
