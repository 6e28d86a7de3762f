use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use migration::MigratorTrait;
use server::{ServerState, router};

async fn test_router() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();

    let engine = engine::Engine::builder().database(db.clone()).build();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn basic_auth() -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("alice:password")
    )
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn patch(uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn equal_expense(group_id: &str, payer: &str, amount_minor: i64, members: &[&str]) -> Value {
    json!({
        "group_id": group_id,
        "description": "Dinner",
        "amount_minor": amount_minor,
        "payer_id": payer,
        "policy": "EQUAL",
        "participants": members
            .iter()
            .map(|id| json!({"user_id": id, "included": true, "raw_value": null}))
            .collect::<Vec<_>>(),
    })
}

async fn create_and_save(
    router: &Router,
    group_id: &str,
    payer: &str,
    amount_minor: i64,
    members: &[&str],
) -> Value {
    let response = router
        .clone()
        .oneshot(post(
            "/expenses",
            equal_expense(group_id, payer, amount_minor, members),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;

    let response = router
        .clone()
        .oneshot(post(
            "/expenseShares/save",
            json!({
                "expense_id": created["id"],
                "shares_revision": created["shares_revision"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let router = test_router().await;

    let request = Request::builder()
        .method("GET")
        .uri("/debts/user/alice")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("GET")
        .uri("/debts/user/alice")
        .header(
            header::AUTHORIZATION,
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode("alice:wrong")
            ),
        )
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_expense_returns_computed_shares() {
    let router = test_router().await;

    let response = router
        .oneshot(post(
            "/expenses",
            equal_expense("trip", "an", 100, &["an", "binh", "chi"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    let amounts: Vec<i64> = created["shares"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["amount_minor"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, vec![33, 33, 34]);
    assert_eq!(created["shares_revision"], 0);
}

#[tokio::test]
async fn invalid_percentages_are_unprocessable() {
    let router = test_router().await;

    let response = router
        .oneshot(post(
            "/expenses",
            json!({
                "group_id": "trip",
                "description": null,
                "amount_minor": 1000,
                "payer_id": "an",
                "policy": "PERCENTAGE",
                "participants": [
                    {"user_id": "an", "included": true, "raw_value": "50"},
                    {"user_id": "binh", "included": true, "raw_value": "40"},
                ],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn save_with_stale_revision_conflicts() {
    let router = test_router().await;

    let response = router
        .clone()
        .oneshot(post(
            "/expenses",
            equal_expense("trip", "an", 60_000, &["an", "binh"]),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;

    let save = json!({
        "expense_id": created["id"],
        "shares_revision": created["shares_revision"],
    });
    let response = router.clone().oneshot(post("/expenseShares/save", save.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(post("/expenseShares/save", save)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn summary_reflects_settlement_flow() {
    let router = test_router().await;

    // an pays 400 with binh: binh owes an 200.
    create_and_save(&router, "trip", "an", 400, &["an", "binh"]).await;
    // binh pays 240 with an: an owes binh 120.
    let saved = create_and_save(&router, "trip", "binh", 240, &["binh", "an"]).await;

    let response = router
        .clone()
        .oneshot(get("/debts/user/binh/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["total_payable_minor"], 200);
    assert_eq!(summary["total_receivable_minor"], 120);
    assert_eq!(summary["net_minor"], -80);
    assert_eq!(summary["suggestions"][0]["action"], "PAY");
    assert_eq!(summary["suggestions"][0]["net_minor"], 80);

    // Settle the receivable side; the cross debt disappears.
    let debt_id = saved["debts"][0]["id"].as_str().unwrap().to_string();
    let response = router
        .clone()
        .oneshot(patch(&format!("/debts/{debt_id}/settle"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outcome"], "SETTLED");

    // Settling again is a safe no-op.
    let response = router
        .clone()
        .oneshot(patch(&format!("/debts/{debt_id}/settle"), None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["outcome"], "ALREADY_SETTLED");

    let response = router
        .oneshot(get("/debts/user/binh/summary"))
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total_receivable_minor"], 0);
    assert!(summary["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn settle_unknown_debt_is_not_found() {
    let router = test_router().await;

    let response = router
        .oneshot(patch(
            "/debts/00000000-0000-4000-8000-000000000000/settle",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settle_batch_with_unknown_id_mutates_nothing() {
    let router = test_router().await;

    let saved = create_and_save(&router, "trip", "an", 90_000, &["an", "binh", "chi"]).await;
    let first = saved["debts"][0]["id"].clone();

    let response = router
        .clone()
        .oneshot(post(
            "/debts/settleBatch",
            json!({"debt_ids": [first, "00000000-0000-4000-8000-000000000000"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router.oneshot(get("/debts/user/binh")).await.unwrap();
    let debts = body_json(response).await;
    assert!(debts["debts"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["status"] == "UNSETTLED"));
}

#[tokio::test]
async fn group_net_balances_sum_to_zero() {
    let router = test_router().await;

    create_and_save(&router, "trip", "an", 90_000, &["an", "binh", "chi"]).await;

    let response = router
        .oneshot(get("/debts/group/trip/netBalances"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let nets: Vec<i64> = body["balances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["net_minor"].as_i64().unwrap())
        .collect();
    assert_eq!(nets.iter().sum::<i64>(), 0);
    assert!(nets.contains(&60_000));
}
