//! Integration tests for starting and completing operations and for direct
//! defect ledger writes.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use common::{
    build_test_app, complete_operation, create_master_defect, create_order, create_user,
    delete_auth, expect_status, get_auth, post_json_auth, put_json_auth, start_operation,
    TestUser,
};
use pchart_core::defect::DefectQuantities;
use pchart_core::production_order::OrderStatus;
use pchart_core::roles::{ROLE_ADMIN, ROLE_USER, ROLE_VIEWER};
use pchart_db::repositories::{OperationDefectRepo, OperationRepo, ProductionOrderRepo};
use serde_json::json;
use sqlx::PgPool;

/// How long the competing transaction holds its row locks before committing.
const HOLD: Duration = Duration::from_millis(300);

async fn order_detail(pool: &PgPool, user: &TestUser, order_number: &str) -> serde_json::Value {
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/production-orders/{order_number}"),
        &user.token,
    )
    .await;
    expect_status(response, StatusCode::OK).await["data"].clone()
}

async fn record_defect(
    pool: &PgPool,
    user: &TestUser,
    order_number: &str,
    defect_id: i64,
) -> axum::response::Response {
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/operation-defects",
        json!({
            "po_number": order_number,
            "operation_code": "OP10",
            "defect": {"defect_id": defect_id, "quantity_nogood": 1},
        }),
        &user.token,
    )
    .await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn complete_first_operation_flows_into_next(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    let dent = create_master_defect(&pool, "Dent").await;
    create_order(&pool, &admin, "PO-100", 100).await;

    let json = expect_status(
        start_operation(&pool, &alice, "PO-100", "OP10").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"]["already_started"], false);
    assert_eq!(json["data"]["operation"]["input_quantity"], 100);
    assert_eq!(json["data"]["order"]["status"], "inProgress");

    let json = expect_status(
        complete_operation(
            &pool,
            &alice,
            "PO-100",
            "OP10",
            json!([
                {"defect_id": scratch, "quantity_nogood": 5},
                {"defect_id": dent, "quantity_nogood": 0},
            ]),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let data = &json["data"];
    assert_eq!(data["operation"]["output_quantity"], 95);
    assert_eq!(data["operation"]["line_no"], "L1");
    assert!(data["operation"]["end_time"].is_string());
    assert_eq!(data["defects"].as_array().unwrap().len(), 2);
    assert_eq!(data["next_operation"]["operation_code"], "OP20");
    assert_eq!(data["next_operation"]["input_quantity"], 95);
    assert!(data["next_operation"]["start_time"].is_string());
    assert_eq!(data["order"]["current_operation"], "OP20");
    assert_eq!(data["warnings"], json!([]));

    let detail = order_detail(&pool, &alice, "PO-100").await;
    assert_eq!(detail["order"]["current_operation"], "OP20");
    assert_eq!(detail["operations"][0]["output_quantity"], 95);
    assert_eq!(detail["operations"][1]["input_quantity"], 95);
    assert!(detail["operations"][2]["start_time"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejected_completion_changes_nothing(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    create_order(&pool, &admin, "PO-101", 100).await;
    expect_status(
        start_operation(&pool, &alice, "PO-101", "OP10").await,
        StatusCode::OK,
    )
    .await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/operations/complete",
        json!({
            "po_number": "PO-101",
            "operation_code": "OP10",
            "line_no": "   ",
            "defects": [{"defect_id": scratch, "quantity_nogood": 5}],
        }),
        &alice.token,
    )
    .await;
    let json = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let detail = order_detail(&pool, &alice, "PO-101").await;
    assert!(detail["operations"][0]["end_time"].is_null());
    assert!(detail["operations"][0]["output_quantity"].is_null());
    assert!(detail["operations"][1]["start_time"].is_null());
    assert_eq!(detail["order"]["current_operation"], "OP10");
    assert_eq!(detail["defects"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn operations_start_in_order(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    create_order(&pool, &admin, "PO-102", 40).await;

    let json = expect_status(
        start_operation(&pool, &alice, "PO-102", "OP20").await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(json["code"], "INVALID_TRANSITION");

    expect_status(
        start_operation(&pool, &alice, "PO-102", "OP99").await,
        StatusCode::NOT_FOUND,
    )
    .await;

    // Completing before starting is refused as well.
    expect_status(
        complete_operation(&pool, &alice, "PO-102", "OP10", json!([])).await,
        StatusCode::CONFLICT,
    )
    .await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_start_is_a_no_op(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    create_order(&pool, &admin, "PO-103", 40).await;

    let first = expect_status(
        start_operation(&pool, &alice, "PO-103", "OP10").await,
        StatusCode::OK,
    )
    .await;
    let second = expect_status(
        start_operation(&pool, &alice, "PO-103", "OP10").await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(second["data"]["already_started"], true);
    assert_eq!(
        first["data"]["operation"]["start_time"],
        second["data"]["operation"]["start_time"]
    );
    assert_eq!(second["data"]["operation"]["input_quantity"], 40);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn viewer_cannot_change_operations(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let viewer = create_user(&pool, "vera", ROLE_VIEWER).await;
    create_order(&pool, &admin, "PO-104", 40).await;

    expect_status(
        start_operation(&pool, &viewer, "PO-104", "OP10").await,
        StatusCode::FORBIDDEN,
    )
    .await;

    // Reading is fine.
    let detail = order_detail(&pool, &viewer, "PO-104").await;
    assert_eq!(detail["order"]["status"], "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn last_completion_finishes_the_order(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    create_order(&pool, &admin, "PO-105", 20).await;

    expect_status(
        start_operation(&pool, &alice, "PO-105", "OP10").await,
        StatusCode::OK,
    )
    .await;
    for code in ["OP10", "OP20", "OP30"] {
        let json = expect_status(
            complete_operation(
                &pool,
                &alice,
                "PO-105",
                code,
                json!([{"defect_id": scratch, "quantity_nogood": 1}]),
            )
            .await,
            StatusCode::OK,
        )
        .await;
        assert!(json["data"]["next_operation"].is_object());
    }

    let json = expect_status(
        complete_operation(&pool, &alice, "PO-105", "OP40", json!([])).await,
        StatusCode::OK,
    )
    .await;
    assert!(json["data"]["next_operation"].is_null());
    assert_eq!(json["data"]["operation"]["output_quantity"], 17);
    assert_eq!(json["data"]["order"]["status"], "completed");
    assert_eq!(json["data"]["order"]["current_operation"], "OP40");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_ledger_is_admin_only(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    let dent = create_master_defect(&pool, "Dent").await;
    create_order(&pool, &admin, "PO-106", 30).await;
    expect_status(
        start_operation(&pool, &alice, "PO-106", "OP10").await,
        StatusCode::OK,
    )
    .await;

    // Direct writes while the operation runs.
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/operation-defects",
        json!({
            "po_number": "PO-106",
            "operation_code": "OP10",
            "defect": {"defect_id": scratch, "quantity_rework": 1, "quantity_nogood": 2},
        }),
        &alice.token,
    )
    .await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["quantity"], 3);
    let entry_id = json["data"]["id"].as_i64().unwrap();

    expect_status(
        complete_operation(&pool, &alice, "PO-106", "OP10", json!([])).await,
        StatusCode::OK,
    )
    .await;

    let json = expect_status(
        record_defect(&pool, &alice, "PO-106", dent).await,
        StatusCode::FORBIDDEN,
    )
    .await;
    assert!(json["error"].as_str().unwrap().contains("edit request"));
    expect_status(
        record_defect(&pool, &admin, "PO-106", dent).await,
        StatusCode::OK,
    )
    .await;

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/operation-defects/{entry_id}"),
        &alice.token,
    )
    .await;
    expect_status(response, StatusCode::FORBIDDEN).await;

    // Stored output is untouched by direct admin writes.
    let detail = order_detail(&pool, &alice, "PO-106").await;
    assert_eq!(detail["operations"][0]["output_quantity"], 28);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn snapshot_rejects_duplicate_defects(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    create_order(&pool, &admin, "PO-107", 30).await;
    expect_status(
        start_operation(&pool, &alice, "PO-107", "OP10").await,
        StatusCode::OK,
    )
    .await;

    let json = expect_status(
        complete_operation(
            &pool,
            &alice,
            "PO-107",
            "OP10",
            json!([
                {"defect_id": scratch, "quantity_nogood": 1},
                {"defect_id": scratch, "quantity_nogood": 2},
            ]),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    expect_status(
        complete_operation(
            &pool,
            &alice,
            "PO-107",
            "OP10",
            json!([{"defect_id": 999_999, "quantity_nogood": 1}]),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn direct_write_waits_for_a_completion_in_flight(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    let alice = create_user(&pool, "alice", ROLE_USER).await;
    let scratch = create_master_defect(&pool, "Scratch").await;
    create_order(&pool, &admin, "PO-130", 100).await;
    expect_status(
        start_operation(&pool, &alice, "PO-130", "OP10").await,
        StatusCode::OK,
    )
    .await;

    // Complete OP10 the way the completion path does, but hold the commit.
    let mut tx = pool.begin().await.unwrap();
    let order = ProductionOrderRepo::find_by_number_for_update(&mut tx, "PO-130")
        .await
        .unwrap()
        .unwrap();
    let op10 = OperationRepo::list_for_order_for_update(&mut tx, order.id)
        .await
        .unwrap()[0]
        .clone();
    let five = DefectQuantities::new(None, 0, 5, None, true).unwrap();
    OperationDefectRepo::upsert(&mut *tx, op10.id, scratch, &five)
        .await
        .unwrap();
    OperationRepo::mark_completed(&mut tx, op10.id, 95, Utc::now(), "L1", 1.0)
        .await
        .unwrap()
        .unwrap();

    let (write, ()) = tokio::join!(record_defect(&pool, &alice, "PO-130", scratch), async {
        tokio::time::sleep(HOLD).await;
        tx.commit().await.unwrap();
    });

    let json = expect_status(write, StatusCode::FORBIDDEN).await;
    assert_eq!(json["code"], "FORBIDDEN");
    let detail = order_detail(&pool, &alice, "PO-130").await;
    assert_eq!(detail["operations"][0]["output_quantity"], 95);
    assert_eq!(detail["defects"][0]["quantity_nogood"], 5);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn quantity_edit_waits_for_a_start_in_flight(pool: PgPool) {
    let admin = create_user(&pool, "admin", ROLE_ADMIN).await;
    create_order(&pool, &admin, "PO-131", 100).await;

    let mut tx = pool.begin().await.unwrap();
    let order = ProductionOrderRepo::find_by_number_for_update(&mut tx, "PO-131")
        .await
        .unwrap()
        .unwrap();
    ProductionOrderRepo::set_progress(&mut tx, order.id, OrderStatus::InProgress, "OP10")
        .await
        .unwrap();

    let edit = put_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/production-orders/PO-131",
        json!({"quantity": 120}),
        &admin.token,
    );
    let (edit, ()) = tokio::join!(edit, async {
        tokio::time::sleep(HOLD).await;
        tx.commit().await.unwrap();
    });

    let json = expect_status(edit, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");
    let detail = order_detail(&pool, &admin, "PO-131").await;
    assert_eq!(detail["order"]["quantity"], 100);
}
