//! Integration tests for the guarded DDL operations.
//!
//! Set TEST_MYSQL_URL to run these tests.

mod common;

use like_mysql::{ColumnSpec, DatabaseOptions, Find, TableOptions};
use serde_json::json;

#[tokio::test]
async fn test_create_and_drop_table_report_changes() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::unique_name("schema");
    let columns = [
        ("id", ColumnSpec::new("bigint").unsigned().increment().primary()),
        ("slug", ColumnSpec::new("varchar").length(32u32).required()),
        (
            "price",
            ColumnSpec::new("decimal").length(vec![10u32, 2u32]).default_value("0.00"),
        ),
        ("created", ColumnSpec::new("datetime")),
    ];
    let options = TableOptions::default()
        .unique("slug_uq", ["slug"])
        .index("created_idx", ["created DESC", "slug"])
        .auto_increment(100);

    assert!(db.create_table(&table, &columns, &options).await.unwrap());
    assert!(!db.create_table(&table, &columns, &options).await.unwrap());

    let id = db
        .insert(&table, &[("slug", "widget".into())])
        .await
        .unwrap();
    assert_eq!(id, 100);

    let row = db
        .select_one(&table, &["price"], &Find::new("id = ?").bind(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["price"], json!(0.0));

    assert!(db.drop_table(&[table.as_str()]).await.unwrap());
    assert!(!db.drop_table(&[table.as_str()]).await.unwrap());
    db.end().await;
}

#[tokio::test]
async fn test_create_and_drop_database_report_changes() {
    let Some(db) = common::connect().await else {
        return;
    };
    let name = common::unique_name("likedb");
    let options = DatabaseOptions::default();

    assert!(db.create_database(&name, &options).await.unwrap());
    assert!(!db.create_database(&name, &options).await.unwrap());
    assert!(db.drop_database(&name).await.unwrap());
    assert!(!db.drop_database(&name).await.unwrap());
    db.end().await;
}
