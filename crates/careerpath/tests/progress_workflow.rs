//! End-to-end coverage of the per-user surface: profile, result history,
//! sharing, and the learning plan lifecycle.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn profile_is_created_lazily_on_first_access() {
    let platform = build_platform();
    let response = send(
        &platform.router,
        "GET",
        "/api/users/profile",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], "user-alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["name"], "Alice");

    use careerpath::progress::repository::ProfileRepository;
    assert!(platform
        .profiles
        .fetch("user-alice")
        .expect("repo fetch")
        .is_some());
}

#[tokio::test]
async fn profile_routes_require_authentication() {
    let platform = build_platform();
    let response = send(&platform.router, "GET", "/api/users/profile", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No token provided");
}

#[tokio::test]
async fn profile_update_validates_and_merges() {
    let platform = build_platform();

    let invalid = send(
        &platform.router,
        "PUT",
        "/api/users/profile",
        Some(ALICE_TOKEN),
        Some(json!({ "name": "a", "age": 5 })),
    )
    .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body = json_body(invalid).await;
    assert_eq!(body["details"].as_array().map(Vec::len), Some(2));

    let valid = send(
        &platform.router,
        "PUT",
        "/api/users/profile",
        Some(ALICE_TOKEN),
        Some(json!({ "bio": "Exploring new directions", "age": 29 })),
    )
    .await;
    assert_eq!(valid.status(), StatusCode::OK);
    let body = json_body(valid).await;
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["profile"]["bio"], "Exploring new directions");
    assert_eq!(body["profile"]["name"], "Alice");
}

#[tokio::test]
async fn result_history_filters_and_paginates() {
    let platform = build_platform();
    submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 5 } })).await;
    submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 3 } })).await;

    let page = json_body(
        send(
            &platform.router,
            "GET",
            "/api/users/results?limit=1",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(page["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["pagination"]["total"], 2);
    assert_eq!(page["pagination"]["has_more"], true);

    let filtered = json_body(
        send(
            &platform.router,
            "GET",
            "/api/users/results?test_id=analytical_thinking",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(filtered["pagination"]["total"], 0);
}

#[tokio::test]
async fn foreign_results_read_as_not_found() {
    let platform = build_platform();
    let (_, body) =
        submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 5 } })).await;
    let result_id = body["result"]["id"].as_str().expect("result id").to_string();

    let own = send(
        &platform.router,
        "GET",
        &format!("/api/users/results/{result_id}"),
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(own.status(), StatusCode::OK);

    // a different authenticated user sees 404, not 403, so existence never leaks
    let foreign = send(
        &platform.router,
        "GET",
        &format!("/api/users/results/{result_id}"),
        Some(BOB_TOKEN),
        None,
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let foreign_delete = send(
        &platform.router,
        "DELETE",
        &format!("/api/users/results/{result_id}"),
        Some(BOB_TOKEN),
        None,
    )
    .await;
    assert_eq!(foreign_delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owners_can_delete_their_results() {
    let platform = build_platform();
    let (_, body) =
        submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 5 } })).await;
    let result_id = body["result"]["id"].as_str().expect("result id").to_string();

    let response = send(
        &platform.router,
        "DELETE",
        &format!("/api/users/results/{result_id}"),
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let gone = send(
        &platform.router,
        "GET",
        &format!("/api/users/results/{result_id}"),
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sharing_toggles_visibility_and_returns_a_link() {
    let platform = build_platform();
    let (_, body) =
        submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 5 } })).await;
    let result_id = body["result"]["id"].as_str().expect("result id").to_string();

    let shared = json_body(
        send(
            &platform.router,
            "POST",
            &format!("/api/users/results/{result_id}/share"),
            Some(ALICE_TOKEN),
            Some(json!({})),
        )
        .await,
    )
    .await;
    assert_eq!(shared["message"], "Result shared successfully");
    assert_eq!(
        shared["share_url"],
        format!("http://localhost:3000/shared-results/{result_id}")
    );

    let unshared = json_body(
        send(
            &platform.router,
            "POST",
            &format!("/api/users/results/{result_id}/share"),
            Some(ALICE_TOKEN),
            Some(json!({ "is_shared": false })),
        )
        .await,
    )
    .await;
    assert_eq!(unshared["message"], "Result sharing disabled");
    assert!(unshared["share_url"].is_null());
}

#[tokio::test]
async fn learning_plan_lifecycle() {
    let platform = build_platform();

    // nothing generated yet
    let missing = send(
        &platform.router,
        "GET",
        "/api/users/learning-plan",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = json_body(missing).await;
    assert_eq!(
        body["message"],
        "Complete some tests to generate a learning plan"
    );

    // no history: generation refuses
    let refused = send(
        &platform.router,
        "POST",
        "/api/users/learning-plan/generate",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
    let body = json_body(refused).await;
    assert_eq!(body["error"], "No test results available");

    // two attempts: weak social/leadership, strong technical/analytical
    submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 2 } })).await;
    submit_orientation(
        &platform.router,
        ALICE_TOKEN,
        json!({ "q1": { "answer_id": "a2" } }),
    )
    .await;

    let generated = send(
        &platform.router,
        "POST",
        "/api/users/learning-plan/generate",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(generated.status(), StatusCode::CREATED);
    let body = json_body(generated).await;
    let plan = &body["learning_plan"];

    let strengths: Vec<&str> = plan["strengths"]
        .as_array()
        .expect("strengths")
        .iter()
        .map(|entry| entry["category"].as_str().expect("category"))
        .collect();
    assert_eq!(strengths, vec!["analytical", "technical"]);

    let improvements: Vec<&str> = plan["improvements"]
        .as_array()
        .expect("improvements")
        .iter()
        .map(|entry| entry["category"].as_str().expect("category"))
        .collect();
    assert_eq!(improvements, vec!["leadership", "social"]);

    // strengths first, then improvements, with the fixed priorities
    let recommendations = plan["recommendations"].as_array().expect("recommendations");
    assert_eq!(recommendations.len(), 4);
    assert_eq!(recommendations[0]["type"], "strength");
    assert_eq!(recommendations[0]["priority"], "medium");
    assert_eq!(recommendations[3]["type"], "improvement");
    assert_eq!(recommendations[3]["estimated_time"], "3-6 months");

    // regeneration over the same history is idempotent modulo timestamps
    let regenerated = json_body(
        send(
            &platform.router,
            "POST",
            "/api/users/learning-plan/generate",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(
        regenerated["learning_plan"]["strengths"],
        plan["strengths"]
    );
    assert_eq!(
        regenerated["learning_plan"]["recommendations"],
        plan["recommendations"]
    );

    // whole-object replacement via PUT
    let replaced = json_body(
        send(
            &platform.router,
            "PUT",
            "/api/users/learning-plan",
            Some(ALICE_TOKEN),
            Some(json!({ "status": "paused" })),
        )
        .await,
    )
    .await;
    assert_eq!(replaced["learning_plan"]["status"], "paused");
    assert_eq!(
        replaced["learning_plan"]["strengths"].as_array().map(Vec::len),
        Some(0)
    );

    let fetched = json_body(
        send(
            &platform.router,
            "GET",
            "/api/users/learning-plan",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(fetched["status"], "paused");
}

#[tokio::test]
async fn stats_summarize_the_callers_history() {
    let platform = build_platform();

    let empty = json_body(
        send(
            &platform.router,
            "GET",
            "/api/users/stats",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(empty["tests_completed"], 0);
    assert!(empty["favorite_category"].is_null());

    submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 5 } })).await;
    submit_orientation(&platform.router, ALICE_TOKEN, json!({ "q2": { "value": 1 } })).await;

    let stats = json_body(
        send(
            &platform.router,
            "GET",
            "/api/users/stats",
            Some(ALICE_TOKEN),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(stats["tests_completed"], 2);
    assert_eq!(stats["average_score"], 3);
    assert_eq!(stats["favorite_category"], "orientation");
    assert_eq!(stats["total_time_minutes"], 10);
    assert_eq!(stats["recent_activity"].as_array().map(Vec::len), Some(2));
}
