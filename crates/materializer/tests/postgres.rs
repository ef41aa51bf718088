//! End-to-end runs against a throwaway Postgres container. Needs Docker:
//! `cargo test -p materializer --test postgres -- --ignored`

use common::config::components::job::MaterializerConfig;
use common::config::components::source::SourceTable;
use materializer::{list_views, materialize_views, MaterializerError};
use std::time::Duration;
use test_utils::{setup_postgres, PgTestContainer};
use tokio_postgres::{Client, NoTls};

async fn seed(pg: &PgTestContainer, definitions: &[&str]) -> anyhow::Result<Client> {
    // the image restarts once after initdb; give it a moment
    tokio::time::sleep(Duration::from_secs(3)).await;
    let (client, conn) = tokio_postgres::connect(&pg.conn_string(), NoTls).await?;
    tokio::spawn(async move {
        let _ = conn.await;
    });

    client
        .batch_execute(
            "CREATE TABLE big_exposition_tool (
                id SERIAL PRIMARY KEY,
                owner TEXT,
                createviewquery TEXT NOT NULL
            )",
        )
        .await?;
    for definition in definitions {
        client
            .execute(
                "INSERT INTO big_exposition_tool (owner, createviewquery) VALUES ('bi', $1)",
                &[definition],
            )
            .await?;
    }
    Ok(client)
}

fn config(pg: &PgTestContainer, enable_catalog_support: bool) -> MaterializerConfig {
    MaterializerConfig {
        app_name: "big_exposition_tool_automated_process".to_string(),
        enable_catalog_support,
        source: SourceTable::default(),
        connection: pg.connection_details(),
    }
}

async fn view_exists(client: &Client, name: &str) -> anyhow::Result<bool> {
    let row = client
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM pg_views WHERE schemaname = 'public' AND viewname = $1)",
            &[&name],
        )
        .await?;
    Ok(row.get(0))
}

#[tokio::test]
#[ignore = "requires docker"]
async fn creates_views_from_source_rows() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    let client = seed(
        &pg,
        &["CREATE VIEW v1 AS SELECT 1 AS n", "CREATE VIEW v2 AS SELECT 2 AS n"],
    )
    .await?;

    let summary = materialize_views(&config(&pg, true)).await?;
    assert_eq!(summary.executed, 2);

    let v1: i32 = client.query_one("SELECT n FROM v1", &[]).await?.get(0);
    let v2: i32 = client.query_one("SELECT n FROM v2", &[]).await?.get(0);
    assert_eq!((v1, v2), (1, 2));

    // the job's backend exits shortly after the client hangs up
    tokio::time::sleep(Duration::from_millis(500)).await;
    let open: i64 = client
        .query_one(
            "SELECT count(*) FROM pg_stat_activity WHERE application_name = $1",
            &[&"big_exposition_tool_automated_process"],
        )
        .await?
        .get(0);
    assert_eq!(open, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn malformed_definition_creates_nothing() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    let client = seed(&pg, &["CREATE VIEW BAD SELECT"]).await?;

    let err = materialize_views(&config(&pg, true)).await.unwrap_err();
    assert!(matches!(
        err,
        MaterializerError::StatementExecutionError { index: 0, .. }
    ));
    assert!(!view_exists(&client, "bad").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn partial_batch_stays_applied() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    let client = seed(
        &pg,
        &[
            "CREATE VIEW first_view AS SELECT 1",
            "CREATE VIEW second_view AS SELECT * FROM missing_table",
            "CREATE VIEW third_view AS SELECT 3",
        ],
    )
    .await?;

    let err = materialize_views(&config(&pg, true)).await.unwrap_err();
    assert_eq!(err.statement_index(), Some(1));
    assert!(view_exists(&client, "first_view").await?);
    assert!(!view_exists(&client, "second_view").await?);
    assert!(!view_exists(&client, "third_view").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn missing_source_table_is_a_schema_error() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let err = materialize_views(&config(&pg, true)).await.unwrap_err();
    assert!(matches!(err, MaterializerError::SchemaError { .. }));
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn without_catalog_support_views_do_not_persist() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    let client = seed(&pg, &["CREATE VIEW scratch AS SELECT 1"]).await?;

    let summary = materialize_views(&config(&pg, false)).await?;
    assert_eq!(summary.executed, 1);
    assert!(!view_exists(&client, "scratch").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_reads_without_executing() -> anyhow::Result<()> {
    let pg = setup_postgres().await.unwrap();
    let client = seed(&pg, &["CREATE VIEW listed AS SELECT 1"]).await?;

    let statements = list_views(&config(&pg, true)).await?;
    assert_eq!(statements.as_sql(), vec!["CREATE VIEW listed AS SELECT 1"]);
    assert!(!view_exists(&client, "listed").await?);
    Ok(())
}
