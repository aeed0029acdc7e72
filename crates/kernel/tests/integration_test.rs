#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP integration tests for the ledger resources.
//!
//! Every test drives the real router against its own in-memory database.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, build_household_tree, response_json};

async fn create_transaction(app: &TestApp, dataset: i64, timestamp: i64, amount: i64) -> i64 {
    let response = app
        .post_json(
            &format!("/dataset/{dataset}/transactions"),
            json!({ "timestamp": timestamp, "description": "Card payment", "amount": amount }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"].as_i64().unwrap()
}

async fn transactions(app: &TestApp, query: &str) -> Vec<Value> {
    let response = app.get(&format!("/transactions{query}")).await;
    assert_eq!(response.status(), StatusCode::OK, "{query}");
    response_json(response).await["transactions"]
        .as_array()
        .unwrap()
        .clone()
}

fn category_ids(transaction: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = transaction["combined_categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "status": "healthy", "database": true })
    );
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn new_transaction_has_one_uncategorized_part() {
    let app = TestApp::new().await;
    let dataset = app.create_dataset().await;
    let id = create_transaction(&app, dataset, 1_000, 450).await;

    let listed = transactions(&app, "").await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id);
    assert_eq!(listed[0]["malformed"], false);
    assert_eq!(listed[0]["transaction_amount"], 450);
    assert_eq!(listed[0]["combined_amount"], 450);
    assert_eq!(listed[0]["combined_categories"], json!([]));

    let parts = response_json(app.get(&format!("/transaction/{id}/parts")).await).await;
    assert_eq!(
        parts["parts"],
        json!([{ "id": 1, "comment": "", "amount": 450, "category": null }])
    );
}

#[tokio::test]
async fn transaction_into_missing_dataset_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .post_json(
            "/dataset/7/transactions",
            json!({ "timestamp": 1, "description": "x", "amount": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn filters_by_time_and_orders_newest_first() {
    let app = TestApp::new().await;
    let dataset = app.create_dataset().await;
    let early = create_transaction(&app, dataset, 1_000, 10).await;
    let late = create_transaction(&app, dataset, 2_000, 20).await;

    let all = transactions(&app, "").await;
    let ids: Vec<i64> = all.iter().map(|t| t["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![late, early]);

    let after = transactions(&app, "?from=1500").await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["id"], late);

    let before = transactions(&app, "?to=1500").await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0]["id"], early);

    assert!(transactions(&app, &format!("?dataset={}", dataset + 1)).await.is_empty());

    let response = app.get("/transactions?dataset=-1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app.get("/transactions?from=yesterday").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn parts_categorize_and_roll_up() {
    let app = TestApp::new().await;
    build_household_tree(&app).await;
    let dataset = app.create_dataset().await;
    let txn = create_transaction(&app, dataset, 1_000, 450).await;

    // File the original part under Groceries and split off a Utilities part.
    let response = app
        .patch_json("/transaction_part/1", json!({ "category": 4 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .post_json(
            &format!("/transaction/{txn}/parts"),
            json!({ "amount": 100, "category": 5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let listed = transactions(&app, "").await;
    assert_eq!(listed[0]["combined_amount"], 550);
    assert_eq!(category_ids(&listed[0]), vec![4, 5]);

    // Food itself has no parts; its subtree does.
    assert!(transactions(&app, "?category=2").await.is_empty());
    let food = transactions(&app, "?category=2&subcategories=true").await;
    assert_eq!(food.len(), 1);
    assert_eq!(food[0]["combined_amount"], 450);
    assert_eq!(category_ids(&food[0]), vec![4]);

    let totals = response_json(app.get("/categories/totals").await).await;
    assert_eq!(
        totals["totals"],
        json!([
            { "id": 1, "name": "Root", "depth": 0, "total": 550, "transactions": 1 },
            { "id": 2, "name": "Food", "depth": 1, "total": 450, "transactions": 1 },
            { "id": 4, "name": "Groceries", "depth": 2, "total": 450, "transactions": 1 },
            { "id": 5, "name": "Utilities", "depth": 1, "total": 100, "transactions": 1 },
        ])
    );

    let later = response_json(app.get("/categories/totals?from=5000").await).await;
    assert_eq!(later["totals"], json!([]));
}

#[tokio::test]
async fn control_characters_in_category_names_are_listed() {
    let app = TestApp::new().await;
    let root = app.create_category("Root", None, "root").await;
    let odd = app
        .create_category("Bad\u{1}Na\u{2}me", Some(root), "first")
        .await;
    let dataset = app.create_dataset().await;
    create_transaction(&app, dataset, 1_000, 75).await;

    let response = app
        .patch_json("/transaction_part/1", json!({ "category": odd }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let listed = transactions(&app, "").await;
    assert_eq!(
        listed[0]["combined_categories"],
        json!([{ "id": odd, "name": "Bad\u{1}Na\u{2}me" }])
    );
}

#[tokio::test]
async fn part_patch_distinguishes_null_from_missing() {
    let app = TestApp::new().await;
    build_household_tree(&app).await;
    let dataset = app.create_dataset().await;
    let txn = create_transaction(&app, dataset, 1_000, 300).await;

    app.patch_json("/transaction_part/1", json!({ "category": 3 }))
        .await;

    // Omitting the category leaves it alone.
    let response = app
        .patch_json("/transaction_part/1", json!({ "comment": "split later" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let parts = response_json(app.get(&format!("/transaction/{txn}/parts")).await).await;
    assert_eq!(parts["parts"][0]["category"], json!({ "id": 3, "name": "Rent" }));
    assert_eq!(parts["parts"][0]["comment"], "split later");

    // An explicit null clears it.
    let response = app
        .patch_json("/transaction_part/1", json!({ "category": null }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let parts = response_json(app.get(&format!("/transaction/{txn}/parts")).await).await;
    assert_eq!(parts["parts"][0]["category"], Value::Null);

    let response = app.patch_json("/transaction_part/1", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_json("/transaction_part/1", json!({ "category": 99 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .patch_json("/transaction_part/99", json!({ "amount": 5 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn part_creation_rules() {
    let app = TestApp::new().await;
    let dataset = app.create_dataset().await;
    let txn = create_transaction(&app, dataset, 1_000, 300).await;

    let response = app
        .post_json(&format!("/transaction/{txn}/parts"), json!({ "amount": -1 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "The amount is too small.");

    let response = app
        .post_json(
            &format!("/transaction/{txn}/parts"),
            json!({ "amount": 5, "category": 12 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_json("/transaction/99/parts", json!({ "amount": 5 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transaction_patch_and_delete() {
    let app = TestApp::new().await;
    let dataset = app.create_dataset().await;
    let txn = create_transaction(&app, dataset, 1_000, 300).await;

    sqlx::query("UPDATE txn SET malformed = 1")
        .execute(&app.db)
        .await
        .unwrap();
    assert_eq!(transactions(&app, "").await[0]["malformed"], true);

    // Any patch, even an empty one, marks the transaction reviewed.
    let response = app.patch_json(&format!("/transaction/{txn}"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .patch_json(
            &format!("/transaction/{txn}"),
            json!({ "description": "Bakery" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = transactions(&app, "").await;
    assert_eq!(listed[0]["malformed"], false);
    assert_eq!(listed[0]["description"], "Bakery");

    let response = app.patch_json("/transaction/99", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/transaction/{txn}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(transactions(&app, "").await.is_empty());

    // Parts went with it.
    let response = app.get(&format!("/transaction/{txn}/parts")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let (parts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM txn_part")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(parts, 0);

    let response = app.delete(&format!("/transaction/{txn}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Datasets
// =============================================================================

#[tokio::test]
async fn datasets_and_sources() {
    let app = TestApp::new().await;
    let dataset = app.create_dataset().await;

    let sources = response_json(app.get("/dataset_sources").await).await;
    assert_eq!(
        sources["sources"],
        json!([{ "id": 1, "name": "Checking", "comment": "" }])
    );

    let listed = response_json(app.get("/datasets").await).await;
    assert_eq!(listed["datasets"].as_array().unwrap().len(), 1);
    assert_eq!(listed["datasets"][0]["id"], dataset);
    assert_eq!(listed["datasets"][0]["source_name"], "Checking");
    assert!(listed["datasets"][0]["created"].as_i64().unwrap() > 0);

    let one = response_json(app.get(&format!("/dataset/{dataset}")).await).await;
    assert_eq!(one["datasets"], listed["datasets"]);

    let none = response_json(app.get("/dataset/42").await).await;
    assert_eq!(none["datasets"], json!([]));

    let response = app.post_json("/dataset_source/42/datasets", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_json("/dataset_sources", json!({ "name": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Tags and settings
// =============================================================================

#[tokio::test]
async fn tags_list_suggest_and_name() {
    let app = TestApp::new().await;
    for name in ["coffee", "commute", "gift"] {
        let response = app.post_json("/tags", json!({ "name": name })).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let listed = response_json(app.get("/tags").await).await;
    assert_eq!(listed["tags"].as_array().unwrap().len(), 3);

    let suggested = response_json(app.get("/tags?query=co").await).await;
    assert_eq!(
        suggested["suggestions"],
        json!([{ "id": 1, "label": "coffee" }, { "id": 2, "label": "commute" }])
    );

    let name = response_json(app.get("/tag/3/name").await).await;
    assert_eq!(name, json!({ "name": "gift" }));

    let response = app.get("/tag/9/name").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_name_setting() {
    let app = TestApp::new().await;

    let name = response_json(app.get("/setting/name").await).await;
    assert_eq!(name, json!({ "name": "Money" }));

    let response = app
        .send_json(Method::PUT, "/setting/name", json!({ "name": "Household" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let name = response_json(app.get("/setting/name").await).await;
    assert_eq!(name, json!({ "name": "Household" }));

    let response = app
        .send_json(Method::PUT, "/setting/name", json!({ "name": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
