//! Integration tests against PostgreSQL.
//!
//! These tests require a PostgreSQL database to be running.
//! Set DATABASE_URL, DATABASE_USERNAME and DATABASE_PASSWORD and run with
//! `--ignored`.

use futures::{StreamExt, TryStreamExt};
use ouroboros_sql::{params, ConnectionConfig, DatabaseClient, QueryRunner, Row, Value};

fn client_from_env() -> DatabaseClient {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut config = ConnectionConfig::from_env().unwrap();
    if config.url.is_none() {
        config.url = Some("postgresql://localhost/test_db".to_string());
    }
    config.username.get_or_insert_with(|| "postgres".to_string());
    config.password.get_or_insert_with(|| "postgres".to_string());

    DatabaseClient::from_config(config)
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when database is available
async fn test_insert_returns_generated_key_and_select_reads_it() {
    let client = client_from_env();

    client
        .update("DROP TABLE IF EXISTS facade_users", params![])
        .count()
        .await
        .unwrap();
    client
        .update(
            "CREATE TABLE facade_users (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, nickname TEXT)",
            params![],
        )
        .count()
        .await
        .unwrap();

    let keys: Vec<i64> = client
        .update("INSERT INTO facade_users(name) VALUES ($1)", params!["alice"])
        .generated_keys()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(keys, vec![1]);

    let rows: Vec<Row> = client
        .query_with("SELECT name, nickname FROM facade_users WHERE id = $1", params![keys[0]])
        .try_collect()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").unwrap(), &Value::String("alice".to_string()));
    assert!(rows[0].get("nickname").unwrap().is_null());

    let err = client
        .update("INSERT INTO facade_users(id, name) VALUES ($1, $2)", params![1i64, "dup"])
        .count()
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation());

    client
        .update("DROP TABLE facade_users", params![])
        .count()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_empty_and_malformed_queries() {
    let client = client_from_env();

    let rows: Vec<Row> = client.query("SELECT 1 WHERE 1=0").try_collect().await.unwrap();
    assert!(rows.is_empty());

    let results: Vec<_> = client.query("SELEKT 1").collect().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap_err().is_query_execution());
}

#[tokio::test]
#[ignore]
async fn test_typed_columns_decode() {
    let client = client_from_env();

    let rows: Vec<Row> = client
        .query("SELECT 1::int2 AS s, 2::int4 AS i, 3::int8 AS b, 1.5::float8 AS d, true AS t, '{\"a\":1}'::jsonb AS j")
        .try_collect()
        .await
        .unwrap();
    let row = &rows[0];

    assert_eq!(row.get("s").unwrap(), &Value::SmallInt(1));
    assert_eq!(row.get("i").unwrap(), &Value::Int(2));
    assert_eq!(row.get("b").unwrap(), &Value::BigInt(3));
    assert_eq!(row.get("d").unwrap(), &Value::Double(1.5));
    assert_eq!(row.get("t").unwrap(), &Value::Bool(true));
    assert_eq!(row.get("j").unwrap(), &Value::Json(serde_json::json!({"a": 1})));
}

#[tokio::test]
#[ignore]
async fn test_null_parameter_needs_cast_for_boolean_column() {
    let client = client_from_env();

    client
        .update("DROP TABLE IF EXISTS facade_nulls", params![])
        .count()
        .await
        .unwrap();
    client
        .update("CREATE TABLE facade_nulls (id INT4 PRIMARY KEY, active BOOLEAN)", params![])
        .count()
        .await
        .unwrap();

    let uncast = client
        .update("INSERT INTO facade_nulls(id, active) VALUES ($1, $2)", params![1, None::<bool>])
        .count()
        .await;
    assert!(uncast.unwrap_err().is_query_execution());

    let inserted = client
        .update(
            "INSERT INTO facade_nulls(id, active) VALUES ($1, $2::boolean)",
            params![1, None::<bool>],
        )
        .count()
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    client
        .update("DROP TABLE facade_nulls", params![])
        .count()
        .await
        .unwrap();
}
