//! Project creation, survey links, anonymous submission and statistics

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use common::{add_bcrypt_school, bearer, create_test_app, login, ScriptedLlm, TestApp};
use serde_json::{json, Value};

async fn signed_in_app() -> (TestApp, String) {
    let app = create_test_app(ScriptedLlm::replying(&[])).await;
    add_bcrypt_school(&app.store, "W001", "pass-word").await;
    let token = login(&app.server, "W001", "pass-word").await;
    (app, token)
}

async fn create_project(app: &TestApp, token: &str) -> Value {
    let response = app
        .server
        .post("/projects")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({ "title": "2025 학교평가", "year": 2025 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_project_creation_seeds_questions() {
    let (app, token) = signed_in_app().await;

    let created = create_project(&app, &token).await;
    assert_eq!(created["questionsCreated"], 32);
    assert_eq!(created["project"]["status"], "draft");
    assert_eq!(created["project"]["year"], 2025);
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let all = app
        .server
        .get(&format!("/projects/{}/questions", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    all.assert_status_ok();
    let all: Value = all.json();
    assert_eq!(all.as_array().map(Vec::len), Some(32));

    let students = app
        .server
        .get(&format!("/projects/{}/questions?respondentType=student", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    students.assert_status_ok();
    let students: Value = students.json();
    let students = students.as_array().unwrap();
    assert_eq!(students.len(), 7);
    assert!(students.iter().all(|q| q["respondent_type"] == "student"));
    assert!(students.iter().all(|q| q["question_type"] == "rating"));
    let orders: Vec<i64> = students
        .iter()
        .map(|q| q["order_index"].as_i64().unwrap())
        .collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted);

    let listed = app
        .server
        .get("/projects")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let listed: Value = listed.json();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_project_validation_and_status() {
    let (app, token) = signed_in_app().await;

    app.server
        .post("/projects")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "옛 평가", "year": 2019 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let activated = app
        .server
        .post(&format!("/projects/{}/status", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "active" }))
        .await;
    activated.assert_status_ok();
    let activated: Value = activated.json();
    assert_eq!(activated["status"], "active");

    app.server
        .post(&format!("/projects/{}/status", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "finished" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/projects/not-a-uuid")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_schools_projects_are_hidden() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    add_bcrypt_school(&app.store, "W002", "other-pass").await;
    let other = login(&app.server, "W002", "other-pass").await;

    for path in [
        format!("/projects/{}", project_id),
        format!("/projects/{}/questions", project_id),
        format!("/projects/{}/stats", project_id),
        format!("/projects/{}/links", project_id),
    ] {
        app.server
            .get(&path)
            .add_header(AUTHORIZATION, bearer(&other))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_survey_link_submission_and_stats() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let link = app
        .server
        .post(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "respondentType": "student" }))
        .await;
    link.assert_status(StatusCode::CREATED);
    let link: Value = link.json();
    let code = link["access_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    // respondents need no session; codes are case-insensitive
    let survey = app
        .server
        .get(&format!("/survey/{}", code.to_lowercase()))
        .await;
    survey.assert_status_ok();
    let survey: Value = survey.json();
    assert_eq!(survey["projectTitle"], "2025 학교평가");
    assert_eq!(survey["respondentType"], "student");
    let questions = survey["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 7);

    let answers = json!([
        { "questionId": questions[0]["id"], "value": "5" },
        { "questionId": questions[1]["id"], "value": "4" },
    ]);
    let receipt = app
        .server
        .post(&format!("/survey/{}/responses", code))
        .json(&json!({ "sessionId": "respondent-1", "answers": answers }))
        .await;
    receipt.assert_status(StatusCode::CREATED);
    let receipt: Value = receipt.json();
    assert_eq!(receipt["sessionId"], "respondent-1");
    assert_eq!(receipt["responsesSaved"], 2);

    let stats = app
        .server
        .get(&format!("/projects/{}/stats", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    stats.assert_status_ok();
    let stats: Value = stats.json();
    assert_eq!(stats["totalQuestions"], 32);
    assert_eq!(stats["totalResponses"], 2);
    assert_eq!(stats["responsesByType"]["student"], 2);
    assert_eq!(stats["averageRating"], 4.5);
    assert_eq!(stats["completionRate"]["student"], 29);
    assert_eq!(stats["completionRate"]["teacher"], 0);
    assert_eq!(stats["chartData"][0]["respondentType"], "student");
    assert_eq!(stats["chartData"][0]["averageScore"], 4.5);
    let by_indicator = stats["byIndicator"].as_object().unwrap();
    assert_eq!(by_indicator.values().filter_map(Value::as_u64).sum::<u64>(), 2);
}

#[tokio::test]
async fn test_submission_rejects_foreign_questions() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let teacher_questions = app
        .server
        .get(&format!("/projects/{}/questions?respondentType=teacher", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let teacher_questions: Value = teacher_questions.json();

    let link = app
        .server
        .post(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "respondentType": "parent" }))
        .await;
    let link: Value = link.json();
    let code = link["access_code"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/survey/{}/responses", code))
        .json(&json!({
            "answers": [{ "questionId": teacher_questions[0]["id"], "value": "3" }]
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post(&format!("/survey/{}/responses", code))
        .json(&json!({ "answers": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deactivated_and_expired_links() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let link = app
        .server
        .post(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "respondentType": "teacher" }))
        .await;
    let link: Value = link.json();
    let code = link["access_code"].as_str().unwrap().to_string();
    let link_id = link["id"].as_str().unwrap().to_string();

    let deactivated = app
        .server
        .post(&format!("/links/{}/deactivate", link_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    deactivated.assert_status_ok();
    let deactivated: Value = deactivated.json();
    assert_eq!(deactivated["is_active"], false);

    app.server
        .get(&format!("/survey/{}", code))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let expired = app
        .server
        .post(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "respondentType": "staff",
            "expiresAt": "2021-01-01T00:00:00Z"
        }))
        .await;
    expired.assert_status(StatusCode::CREATED);
    let expired: Value = expired.json();
    let expired_code = expired["access_code"].as_str().unwrap().to_string();

    app.server
        .get(&format!("/survey/{}", expired_code))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let links = app
        .server
        .get(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let links: Value = links.json();
    assert_eq!(links.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_question_management() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();
    let questions_path = format!("/projects/{}/questions", project_id);

    let choice = app
        .server
        .post(&questions_path)
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "respondentType": "student",
            "questionText": "가장 좋아하는 시간은?",
            "questionType": "multiple_choice",
            "options": ["체육", "음악", "점심"],
            "sectionName": "학교생활",
            "description": "하나를 고르세요"
        }))
        .await;
    choice.assert_status(StatusCode::CREATED);
    let choice: Value = choice.json();
    assert_eq!(choice["question_type"], "multiple_choice");
    assert_eq!(choice["options"], json!(["체육", "음악", "점심"]));
    assert_eq!(choice["section_name"], "학교생활");
    assert_eq!(choice["is_required"], true);
    let question_id = choice["id"].as_str().unwrap().to_string();

    // the new question is last in the student survey
    let students = app
        .server
        .get(&format!("{}?respondentType=student", questions_path))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let students: Value = students.json();
    let students = students.as_array().unwrap();
    assert_eq!(students.len(), 8);
    assert_eq!(students[7]["id"], question_id.as_str());

    for invalid in [
        json!({ "respondentType": "student", "questionText": "  " }),
        json!({ "respondentType": "student", "questionText": "순위", "questionType": "priority" }),
        json!({ "respondentType": "student", "questionText": "점수", "options": ["1", "2"] }),
        json!({ "respondentType": "pupil", "questionText": "질문" }),
    ] {
        app.server
            .post(&questions_path)
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&invalid)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let edited = app
        .server
        .patch(&format!("/questions/{}", question_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "questionType": "text", "isRequired": false, "sectionName": "" }))
        .await;
    edited.assert_status_ok();
    let edited: Value = edited.json();
    assert_eq!(edited["question_type"], "text");
    assert!(edited["options"].is_null());
    assert!(edited["section_name"].is_null());
    assert_eq!(edited["is_required"], false);
    assert_eq!(edited["question_text"], "가장 좋아하는 시간은?");

    add_bcrypt_school(&app.store, "W003", "other-pass").await;
    let other = login(&app.server, "W003", "other-pass").await;
    app.server
        .post(&questions_path)
        .add_header(AUTHORIZATION, bearer(&other))
        .json(&json!({ "respondentType": "student", "questionText": "질문" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .delete(&format!("/questions/{}", question_id))
        .add_header(AUTHORIZATION, bearer(&other))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/questions/{}", question_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .patch(&format!("/questions/{}", question_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "questionText": "다시" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_closed_project_refuses_submissions() {
    let (app, token) = signed_in_app().await;
    let created = create_project(&app, &token).await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let link = app
        .server
        .post(&format!("/projects/{}/links", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "respondentType": "teacher" }))
        .await;
    let link: Value = link.json();
    let code = link["access_code"].as_str().unwrap().to_string();
    let survey: Value = app.server.get(&format!("/survey/{}", code)).await.json();
    let answers = json!([{ "questionId": survey["questions"][0]["id"], "value": "4" }]);

    app.server
        .post(&format!("/projects/{}/status", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "closed" }))
        .await
        .assert_status_ok();

    let refused = app
        .server
        .post(&format!("/survey/{}/responses", code))
        .json(&json!({ "answers": answers }))
        .await;
    refused.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = refused.json();
    assert_eq!(body["code"], "BAD_REQUEST");

    let stats: Value = app
        .server
        .get(&format!("/projects/{}/stats", project_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(stats["totalResponses"], 0);
}

#[tokio::test]
async fn test_indicator_tree_is_public() {
    let app = create_test_app(ScriptedLlm::replying(&[])).await;

    let response = app.server.get("/indicators").await;
    response.assert_status_ok();
    let tree: Value = response.json();
    let domains = tree.as_array().unwrap();
    assert_eq!(domains.len(), 3);
    assert_eq!(domains[0]["code"], "I");
    assert_eq!(domains[0]["areas"][0]["code"], "I-1-1");
    assert_eq!(domains[0]["areas"][0]["indicators"][1]["code"], "I-1-1-2");
    let indicators: usize = domains
        .iter()
        .flat_map(|d| d["areas"].as_array().unwrap())
        .map(|a| a["indicators"].as_array().unwrap().len())
        .sum();
    assert_eq!(indicators, 9);
}
