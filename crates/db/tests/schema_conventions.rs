//! Checks the migrated schema against the conventions the repositories rely on.

use sqlx::PgPool;

async fn base_tables(pool: &PgPool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
           AND table_name <> '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn column_type(pool: &PgPool, table: &str, column: &str) -> Option<String> {
    sqlx::query_scalar(
        "SELECT data_type::text FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_optional(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn every_table_is_migrated(pool: PgPool) {
    let tables = base_tables(&pool).await;
    for expected in [
        "defect_edit_requests",
        "master_defects",
        "notifications",
        "operation_defects",
        "operations",
        "production_orders",
        "users",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn ids_are_bigint_and_timestamps_are_timestamptz(pool: PgPool) {
    for table in base_tables(&pool).await {
        assert_eq!(
            column_type(&pool, &table, "id").await.as_deref(),
            Some("bigint"),
            "{table}.id"
        );
        for col in ["created_at", "updated_at"] {
            assert_eq!(
                column_type(&pool, &table, col).await.as_deref(),
                Some("timestamp with time zone"),
                "{table}.{col}"
            );
        }
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn updated_at_trigger_is_attached_everywhere(pool: PgPool) {
    let triggered: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT event_object_table::text FROM information_schema.triggers
         WHERE trigger_schema = 'public' AND action_statement LIKE '%trigger_set_updated_at%'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let missing: Vec<String> = base_tables(&pool)
        .await
        .into_iter()
        .filter(|t| !triggered.contains(t))
        .collect();
    assert!(missing.is_empty(), "no updated_at trigger on {missing:?}");
}

#[sqlx::test(migrations = "./migrations")]
async fn text_columns_never_use_varchar(pool: PgPool) {
    let varchar: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::text, column_name::text FROM information_schema.columns
         WHERE table_schema = 'public' AND data_type = 'character varying'
           AND table_name <> '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(varchar.is_empty(), "VARCHAR columns: {varchar:?}");
}

#[sqlx::test(migrations = "./migrations")]
async fn foreign_key_columns_are_indexed(pool: PgPool) {
    let fk_columns: Vec<(String, String)> = sqlx::query_as(
        "SELECT DISTINCT tc.table_name::text, kcu.column_name::text
         FROM information_schema.table_constraints tc
         JOIN information_schema.key_column_usage kcu
           ON tc.constraint_name = kcu.constraint_name
          AND tc.table_schema = kcu.table_schema
         WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(!fk_columns.is_empty());

    for (table, column) in fk_columns {
        let indexed: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM pg_indexes
                 WHERE schemaname = 'public' AND tablename = $1
                   AND indexdef LIKE '%(' || $2 || '%'
             )",
        )
        .bind(&table)
        .bind(&column)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(indexed, "{table}.{column} has no index");
    }
}

/// Users are hard-deleted while their locks and requests stay behind, so
/// nothing may reference `users` through a foreign key.
#[sqlx::test(migrations = "./migrations")]
async fn nothing_references_users(pool: PgPool) {
    let referencing: Vec<String> = sqlx::query_scalar(
        "SELECT tc.table_name::text
         FROM information_schema.table_constraints tc
         JOIN information_schema.constraint_column_usage ccu
           ON tc.constraint_name = ccu.constraint_name
          AND tc.table_schema = ccu.table_schema
         WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'
           AND ccu.table_name = 'users'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(referencing.is_empty(), "FKs to users from {referencing:?}");
}

#[sqlx::test(migrations = "./migrations")]
async fn defect_split_is_enforced_by_the_database(pool: PgPool) {
    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO production_orders (order_number, quantity, current_operation)
         VALUES ('PO-CK', 10, 'OP10') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let operation_id: i64 = sqlx::query_scalar(
        "INSERT INTO operations (production_order_id, operation_code, sequence_index)
         VALUES ($1, 'OP10', 0) RETURNING id",
    )
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    let defect_id: i64 =
        sqlx::query_scalar("INSERT INTO master_defects (name) VALUES ('Scratch') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();

    let err = sqlx::query(
        "INSERT INTO operation_defects
             (operation_id, defect_id, quantity, quantity_rework, quantity_nogood)
         VALUES ($1, $2, 5, 1, 1)",
    )
    .bind(operation_id)
    .bind(defect_id)
    .execute(&pool)
    .await
    .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("ck_operation_defects_split"));
}
