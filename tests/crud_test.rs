//! Integration tests for the data operations.
//!
//! Set TEST_MYSQL_URL to run these tests.

mod common;

use like_mysql::models::Outcome;
use like_mysql::{Assignment, ColumnSpec, Find, TableOptions, Value};
use serde_json::json;

#[tokio::test]
async fn test_insert_and_select_one() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;

    let id = db
        .insert(&table, &[("username", "alice".into())])
        .await
        .unwrap();
    assert!(id > 0);

    let row = db
        .select_one(&table, &[], &Find::new("id = ?").bind(id))
        .await
        .unwrap()
        .expect("inserted row should be found");
    assert_eq!(
        serde_json::Value::Object(row),
        json!({ "id": id, "username": "alice", "count": 0 })
    );

    let missing = db
        .select_one(&table, &["id"], &Find::new("username = ?").bind("nobody"))
        .await
        .unwrap();
    assert!(missing.is_none());

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_update_counts_changed_rows() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;
    db.insert(&table, &[("username", "bob".into())])
        .await
        .unwrap();

    let bob = Find::new("username = ?").bind("bob");

    // Same value: matched but unchanged
    let changed = db
        .update(&table, &Assignment::bound([("count", 0)]), &bob)
        .await
        .unwrap();
    assert_eq!(changed, 0);

    let changed = db
        .update(&table, &Assignment::bound([("count", 5)]), &bob)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let changed = db
        .update(
            &table,
            &Assignment::arithmetic([("count", "count + ?")], [1]),
            &bob,
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let row = db
        .select_one(&table, &["count"], &bob)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["count"], json!(6));

    let last = db.last_execution().expect("last execution recorded");
    assert!(last.sql.starts_with("SELECT `count` FROM"));
    assert_eq!(last.values, vec![Value::from("bob")]);

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_update_counts_case_only_change() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;
    db.insert(&table, &[("username", "bob".into())])
        .await
        .unwrap();

    // Equal under utf8mb4_unicode_ci, different bytes on disk
    let changed = db
        .update(
            &table,
            &Assignment::bound([("username", "BOB")]),
            &Find::new("username = ?").bind("bob"),
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let rows = db.select(&table, &["username"], &Find::all()).await.unwrap();
    assert_eq!(rows[0]["username"], json!("BOB"));

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_update_same_float_is_unchanged() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::unique_name("ratios");
    let columns = [
        ("id", ColumnSpec::new("int").increment().primary()),
        ("ratio", ColumnSpec::new("float")),
    ];
    db.create_table(&table, &columns, &TableOptions::default())
        .await
        .unwrap();
    let id = db
        .insert(&table, &[("ratio", Value::Float(0.1))])
        .await
        .unwrap();
    let by_id = Find::new("id = ?").bind(id);

    let changed = db
        .update(&table, &Assignment::bound([("ratio", Value::Float(0.1))]), &by_id)
        .await
        .unwrap();
    assert_eq!(changed, 0);

    let changed = db
        .update(&table, &Assignment::bound([("ratio", Value::Float(0.25))]), &by_id)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_update_with_bad_expression_reports_update_error() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;
    db.insert(&table, &[("username", "gina".into())])
        .await
        .unwrap();

    let err = db
        .update(
            &table,
            &Assignment::arithmetic([("count", "no_such_column + ?")], [1]),
            &Find::new("username = ?").bind("gina"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("ER_BAD_FIELD_ERROR"));
    assert!(err.to_string().contains("field list"), "unexpected error: {err}");

    let last = db.last_execution().unwrap();
    assert!(last.sql.starts_with("UPDATE "));
    assert!(last.outcome.is_none());

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_exists_count_delete() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;

    let carol = Find::new("username = ?").bind("carol");
    assert!(!db.exists(&table, &carol).await.unwrap());

    for name in ["carol", "dave", "erin"] {
        db.insert(&table, &[("username", name.into())])
            .await
            .unwrap();
    }

    assert!(db.exists(&table, &carol).await.unwrap());
    assert_eq!(db.count(&table, &Find::all()).await.unwrap(), 3);

    let ordered = db
        .select(&table, &["username"], &Find::new("ORDER BY username DESC"))
        .await
        .unwrap();
    let names: Vec<_> = ordered.iter().map(|r| r["username"].clone()).collect();
    assert_eq!(names, vec![json!("erin"), json!("dave"), json!("carol")]);

    assert_eq!(db.delete(&table, &carol).await.unwrap(), 1);
    assert_eq!(db.delete(&table, &carol).await.unwrap(), 0);
    assert_eq!(db.count(&table, &Find::all()).await.unwrap(), 2);

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_server_errors_carry_codes() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::create_users_table(&db).await;
    db.insert(&table, &[("username", "frank".into())])
        .await
        .unwrap();

    let err = db
        .insert(&table, &[("username", "frank".into())])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("ER_DUP_ENTRY"));
    assert!(!err.is_retryable());

    let err = db
        .insert(&table, &[("username", "a_name_far_too_long_for_16".into())])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("ER_DATA_TOO_LONG"));

    let err = db
        .query(&format!("SELECT nope FROM {}", table), &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("ER_BAD_FIELD_ERROR"));

    common::drop(&db, &table).await;
    db.end().await;
}

#[tokio::test]
async fn test_connection_records_last_execution() {
    let Some(db) = common::connect().await else {
        return;
    };
    let mut conn = db.get_connection().await.unwrap();
    assert!(conn.last_execution().is_none());

    let rows = conn
        .query("SELECT COUNT(1) AS answer FROM (SELECT 1 AS one) AS t WHERE one = ?", &[Value::from(1)])
        .await
        .unwrap();
    assert_eq!(rows[0]["answer"], json!(1));

    let last = conn.last_execution().unwrap();
    assert_eq!(last.values, vec![Value::Int(1)]);
    assert!(matches!(last.outcome, Some(Outcome::Rows(_))));

    conn.release();
    db.end().await;
}
