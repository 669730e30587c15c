//! HTTP-level tests for the project and account resources over Postgres.
//!
//! Ignored by default; run with `cargo test -p siteops-api -- --ignored` and
//! `DATABASE_URL` set.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

async fn create_account(pool: &PgPool) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/accounts",
        json!({ "business_name": "Acme", "email": "owner@acme.test", "domain": "acme.test" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn project_lifecycle_round_trip(pool: PgPool) {
    let account_id = create_account(&pool).await;

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/projects",
        json!({ "name": "Acme Main", "project_type": "main_site", "account_id": account_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let project = body_json(response).await;
    let id = project["data"]["id"].as_i64().unwrap();
    assert_eq!(project["data"]["status"], "draft");

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/projects/{id}/status"),
        json!({ "status": "live-customer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(build_test_app(pool.clone()), &format!("/api/v1/projects/{id}")).await;
    assert_eq!(body_json(response).await["data"]["status"], "live-customer");

    let response = delete(build_test_app(pool.clone()), &format!("/api/v1/projects/{id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(build_test_app(pool), &format!("/api/v1/projects/{id}/history")).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn project_update_cannot_strip_required_account(pool: PgPool) {
    let account_id = create_account(&pool).await;
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/projects",
        json!({ "name": "Starter", "project_type": "template" }),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/projects/{id}"),
        json!({ "project_type": "landing_page" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(
        build_test_app(pool),
        &format!("/api/v1/projects/{id}"),
        json!({ "project_type": "landing_page", "account_id": account_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn account_list_includes_project_counts(pool: PgPool) {
    let account_id = create_account(&pool).await;
    for name in ["Main", "Landing"] {
        let response = post_json(
            build_test_app(pool.clone()),
            "/api/v1/projects",
            json!({ "name": name, "project_type": "landing_page", "account_id": account_id }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get(build_test_app(pool), "/api/v1/accounts").await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["project_count"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn project_for_missing_account_is_a_conflict(pool: PgPool) {
    let response = post_json(
        build_test_app(pool),
        "/api/v1/projects",
        json!({ "name": "Orphan", "project_type": "main_site", "account_id": 987_654 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Referenced record is missing or still in use"));
}
