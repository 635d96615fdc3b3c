use axum::http::StatusCode;
use serde_json::json;

mod common;

fn strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_filters_cascade_from_chapter() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::get(&app, "/api/v1/quiz/filters?chapter=C1", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(strings(&json["chapters"]), vec!["C1", "C2"]);
    assert_eq!(strings(&json["selected_chapters"]), vec!["C1"]);
    assert_eq!(strings(&json["sub_topics"]), vec!["S1", "S2"]);
    assert_eq!(strings(&json["topics"]), vec!["T1", "T2", "T3"]);
    assert!(json["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_filters_with_repeated_sub_topics() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::get(
        &app,
        "/api/v1/quiz/filters?chapter=C1&chapter=C2&sub_topic=S2&sub_topic=S3",
        &cookie,
    )
    .await;
    let json = response.json();
    assert_eq!(strings(&json["selected_sub_topics"]), vec!["S2", "S3"]);
    assert_eq!(strings(&json["topics"]), vec!["T3", "T4"]);
}

#[tokio::test]
async fn test_quiz_returns_all_candidates_when_fewer_than_requested() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::post_json(
        &app,
        "/api/v1/quiz",
        &cookie,
        json!({ "chapters": ["C2"], "count": 5 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let json = response.json();
    assert_eq!(json["candidate_count"], 2);
    assert_eq!(json["resampled"], "initial");

    let questions = json["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        assert_eq!(question["chapter"], "C2");
        assert!(question.get("correct_answer").is_none());
    }
}

#[tokio::test]
async fn test_quiz_drops_blank_options_and_skips_blank_rows() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "count": 10 })).await;
    let json = response.json();
    assert_eq!(json["candidate_count"], 5);

    for question in json["questions"].as_array().unwrap() {
        let options = question["options"].as_array().unwrap();
        match question["question"].as_str().unwrap() {
            "Q1" | "Q5" => assert_eq!(options.len(), 3),
            _ => assert_eq!(options.len(), 4),
        }
    }
}

#[tokio::test]
async fn test_quiz_is_stable_across_renders() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;
    let body = json!({ "chapters": ["C1"], "count": 5 });

    let first = common::post_json(&app, "/api/v1/quiz", &cookie, body.clone())
        .await
        .json();
    let second = common::post_json(&app, "/api/v1/quiz", &cookie, body)
        .await
        .json();

    assert_eq!(first["questions"], second["questions"]);
    assert!(second["resampled"].is_null());
}

#[tokio::test]
async fn test_count_change_alone_keeps_the_set() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let first = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "count": 5 }))
        .await
        .json();
    let second = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "count": 10 }))
        .await
        .json();

    assert!(second["resampled"].is_null());
    assert_eq!(first["questions"], second["questions"]);
}

#[tokio::test]
async fn test_filter_change_and_refresh_resample() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": ["C1"] })).await;

    let changed = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": ["C2"] }))
        .await
        .json();
    assert_eq!(changed["resampled"], "filters_changed");

    let refreshed = common::post_json(
        &app,
        "/api/v1/quiz",
        &cookie,
        json!({ "chapters": ["C2"], "refresh": true }),
    )
    .await
    .json();
    assert_eq!(refreshed["resampled"], "refresh");
}

#[tokio::test]
async fn test_refresh_endpoint_clears_active_quiz() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    common::post_json(&app, "/api/v1/quiz", &cookie, json!({})).await;
    let response = common::post_json(&app, "/api/v1/quiz/refresh", &cookie, json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let hint = common::get(&app, "/api/v1/quiz/questions/0/hint", &cookie).await;
    assert_eq!(hint.status, StatusCode::CONFLICT);

    let next = common::post_json(&app, "/api/v1/quiz", &cookie, json!({}))
        .await
        .json();
    assert_eq!(next["resampled"], "refresh");
}

#[tokio::test]
async fn test_quiz_after_logout_is_a_refresh() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    common::post_json(&app, "/api/v1/quiz", &cookie, json!({})).await;
    common::post_json(&app, "/api/v1/auth/logout", &cookie, json!({})).await;

    let next = common::post_json(&app, "/api/v1/quiz", &cookie, json!({}))
        .await
        .json();
    assert_eq!(next["resampled"], "refresh");
}

#[tokio::test]
async fn test_sessions_do_not_share_quizzes() {
    let (app, _dir) = common::create_test_app().await;
    let first = common::open_session(&app).await;
    let second = common::open_session(&app).await;

    common::post_json(&app, "/api/v1/quiz", &first, json!({})).await;

    let response = common::post_json(
        &app,
        "/api/v1/quiz/submit",
        &second,
        json!({ "answers": [] }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_empty_selection_is_unprocessable() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response =
        common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": [] })).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unsupported_count_is_rejected() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "count": 7 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::post_json(
        &app,
        "/api/v1/quiz/submit",
        &cookie,
        json!({ "answers": "A1" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["status"], 400);
}

#[tokio::test]
async fn test_hint_reveals_supplementary_text() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let quiz = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": ["C2"] }))
        .await
        .json();
    let question = quiz["questions"][0]["question"].as_str().unwrap().to_string();

    let hint = common::get(&app, "/api/v1/quiz/questions/0/hint", &cookie).await;
    assert_eq!(hint.status, StatusCode::OK);
    let json = hint.json();
    assert_eq!(json["faq"], format!("FAQ for {}", question));
    assert_eq!(json["answer_text"], format!("Answer for {}", question));
    assert_eq!(json["reference_id"], format!("P-{}", question));

    let missing = common::get(&app, "/api/v1/quiz/questions/9/hint", &cookie).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_quiz_conflicts() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let response = common::post_json(
        &app,
        "/api/v1/quiz/submit",
        &cookie,
        json!({ "answers": ["A1"] }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submit_grades_and_summarizes() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    let quiz = common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": ["C1"] }))
        .await
        .json();
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);

    // Correct for every question except Q2, which is answered wrong
    let answers: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            let text = q["question"].as_str().unwrap();
            if text == "Q2" {
                json!("A2")
            } else {
                json!(common::correct_answer(text))
            }
        })
        .collect();

    let response = common::post_json(
        &app,
        "/api/v1/quiz/submit",
        &cookie,
        json!({ "answers": answers }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let report = response.json();
    assert_eq!(report["correct_count"], 2);
    assert_eq!(report["total"], 3);

    for result in report["results"].as_array().unwrap() {
        let expected = if result["question"] == "Q2" { "×" } else { "〇" };
        assert_eq!(result["mark"], expected);
    }

    let chapter_rows = report["chapter_summary"]["rows"].as_array().unwrap();
    assert_eq!(chapter_rows.len(), 2);
    assert_eq!(chapter_rows[0]["keys"], json!(["C1"]));
    assert_eq!(chapter_rows[0]["accuracy"], "66.7%");
    assert_eq!(chapter_rows[1]["keys"], json!(["合計"]));
    assert_eq!(chapter_rows[1]["accuracy"], "66.7%");

    let sub_topic_rows = report["sub_topic_summary"]["rows"].as_array().unwrap();
    assert_eq!(sub_topic_rows[0]["keys"], json!(["C1", "S1"]));
    assert_eq!(sub_topic_rows[0]["accuracy"], "50.0%");
    assert_eq!(sub_topic_rows[1]["keys"], json!(["C1", "S2"]));
    assert_eq!(sub_topic_rows[1]["accuracy"], "100.0%");
    assert_eq!(sub_topic_rows[2]["keys"], json!(["", "合計"]));

    let topic_rows = report["topic_summary"]["rows"].as_array().unwrap();
    assert_eq!(topic_rows.len(), 4);
    assert_eq!(topic_rows[3]["keys"], json!(["", "", "合計"]));
}

#[tokio::test]
async fn test_unanswered_questions_count_as_incorrect() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = common::open_session(&app).await;

    common::post_json(&app, "/api/v1/quiz", &cookie, json!({ "chapters": ["C2"] })).await;
    let report = common::post_json(
        &app,
        "/api/v1/quiz/submit",
        &cookie,
        json!({ "answers": [null] }),
    )
    .await
    .json();

    assert_eq!(report["correct_count"], 0);
    assert_eq!(report["total"], 2);
    assert!(report["results"][1]["selected"].is_null());
}
