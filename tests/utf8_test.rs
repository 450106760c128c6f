//! Integration tests for non-ASCII text through the utf8mb4 defaults.
//!
//! Set TEST_MYSQL_URL to run these tests.

mod common;

use like_mysql::{Assignment, ColumnSpec, Find, TableOptions, Value};
use serde_json::json;

#[tokio::test]
async fn test_utf8_round_trip_through_builders() {
    let Some(db) = common::connect().await else {
        return;
    };
    let table = common::unique_name("utf8");
    let columns = [
        ("id", ColumnSpec::new("int").increment().primary()),
        ("name", ColumnSpec::new("varchar").length(100u32)),
        ("description", ColumnSpec::new("text")),
    ];
    assert!(
        db.create_table(&table, &columns, &TableOptions::default())
            .await
            .unwrap()
    );

    let id = db
        .insert(
            &table,
            &[
                ("name", "张三".into()),
                ("description", "这是中文描述 🚀".into()),
            ],
        )
        .await
        .unwrap();

    let by_name = Find::new("name = ?").bind("张三");
    let row = db.select_one(&table, &[], &by_name).await.unwrap().unwrap();
    assert_eq!(row["id"], json!(id));
    assert_eq!(row["description"], json!("这是中文描述 🚀"));

    let changed = db
        .update(
            &table,
            &Assignment::bound([("description", Value::from("Ünïcödé ✓"))]),
            &by_name,
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let rows = db
        .query(
            &format!("SELECT description FROM {} WHERE id = ?", table),
            &[Value::from(id)],
        )
        .await
        .unwrap();
    assert_eq!(rows[0]["description"], json!("Ünïcödé ✓"));

    common::drop(&db, &table).await;
    db.end().await;
}
