//! Runs generated statements against an in-memory SQLite database and
//! checks the shape of the destination tables.

use sqlx::Row;
use sqlx::any::AnyPoolOptions;
use tablepivot::prelude::*;

async fn open() -> PivotDB {
    // One connection: every connection to sqlite::memory: is its own database.
    PivotDB::connect_with(AnyPoolOptions::new().max_connections(1), "sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite")
}

async fn exec(db: &PivotDB, sql: &str) {
    db.execute_statement(sql)
        .await
        .unwrap_or_else(|e| panic!("Failed to execute {sql}: {e}"));
}

async fn seed_numbers(db: &PivotDB, table: &str, rows: u64) {
    exec(db, &format!("CREATE TABLE {table} (x INTEGER, y TEXT)")).await;
    let values: Vec<String> = (1..=rows).map(|i| format!("({i}, 'v{i}')")).collect();
    if !values.is_empty() {
        exec(db, &format!("INSERT INTO {table} VALUES {}", values.join(", "))).await;
    }
}

async fn column_count(db: &PivotDB, table: &str) -> i64 {
    sqlx::query(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('{}')",
        table.replace('\'', "''")
    ))
    .fetch_one(db.pool())
    .await
    .expect("Failed to count columns")
    .get::<i64, _>(0)
}

async fn col_names(db: &PivotDB, table: &str) -> Vec<String> {
    sqlx::query(&format!("SELECT col_name FROM {table} ORDER BY col_name"))
        .fetch_all(db.pool())
        .await
        .expect("Failed to read pivoted rows")
        .iter()
        .map(|row| row.get::<String, _>(0))
        .collect()
}

fn table(name: &str) -> TableIdentifier {
    TableIdentifier::parse(name).unwrap()
}

#[tokio::test]
async fn test_truncated_pivot_shape() {
    let db = open().await;
    seed_numbers(&db, "T", 15).await;

    let stmt = tablepivot::generate(&db, db.dialect(), &table("t"), RowCap::new(10))
        .await
        .unwrap();
    assert!(stmt.advisory().is_some());
    assert!(stmt.as_str().lines().next().unwrap().contains("15"));

    exec(&db, stmt.as_str()).await;

    // col_name + row_1..row_10
    assert_eq!(column_count(&db, "t_PIVOTED").await, 11);
    assert_eq!(col_names(&db, "t_PIVOTED").await, vec!["x", "y"]);
}

#[tokio::test]
async fn test_single_row_single_column() {
    let db = open().await;
    exec(&db, "CREATE TABLE one (v TEXT)").await;
    exec(&db, "INSERT INTO one VALUES ('hello')").await;

    let stmt = tablepivot::generate(&db, Dialect::SQLite, &table("one"), RowCap::default())
        .await
        .unwrap();
    exec(&db, stmt.as_str()).await;

    let row = sqlx::query("SELECT col_name, row_1 FROM one_PIVOTED")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>(0), "v");
    assert_eq!(row.get::<Option<String>, _>(1).as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_all_null_column_keeps_its_row() {
    let db = open().await;
    exec(&db, "CREATE TABLE m (id INTEGER, note TEXT)").await;
    exec(&db, "INSERT INTO m VALUES (1, NULL), (2, NULL)").await;

    let stmt = tablepivot::generate(&db, Dialect::SQLite, &table("m"), RowCap::new(5))
        .await
        .unwrap();
    assert_eq!(stmt.effective_row_count(), 2);
    exec(&db, stmt.as_str()).await;

    assert_eq!(col_names(&db, "m_PIVOTED").await, vec!["id", "note"]);
    assert_eq!(column_count(&db, "m_PIVOTED").await, 3);

    // The Any driver cannot decode a NULL cell into Option<String>, so let
    // SQLite do the NULL test.
    let nulls = sqlx::query(
        "SELECT row_1 IS NULL, row_2 IS NULL FROM m_PIVOTED WHERE col_name = 'note'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(nulls.get::<i64, _>(0), 1);
    assert_eq!(nulls.get::<i64, _>(1), 1);

    let ids = sqlx::query("SELECT row_1 IS NULL FROM m_PIVOTED WHERE col_name = 'id'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(ids.get::<i64, _>(0), 0);
}

#[tokio::test]
async fn test_zero_cap_creates_key_column_only() {
    let db = open().await;
    seed_numbers(&db, "z", 3).await;

    let stmt = tablepivot::generate(&db, Dialect::SQLite, &table("z"), RowCap::new(0))
        .await
        .unwrap();
    exec(&db, stmt.as_str()).await;

    assert_eq!(column_count(&db, "z_PIVOTED").await, 1);
    assert!(col_names(&db, "z_PIVOTED").await.is_empty());
}

#[tokio::test]
async fn test_rerun_replaces_destination() {
    let db = open().await;
    seed_numbers(&db, "r", 4).await;

    for _ in 0..2 {
        let report = tablepivot::run_all(&db, &db, Dialect::SQLite, &["r"], RowCap::new(3)).await;
        assert!(report.is_success(), "{report}");
        assert_eq!(column_count(&db, "r_PIVOTED").await, 4);
        assert_eq!(col_names(&db, "r_PIVOTED").await, vec!["x", "y"]);
    }
}

#[tokio::test]
async fn test_batch_continues_past_missing_table() {
    let db = open().await;
    seed_numbers(&db, "a", 2).await;
    seed_numbers(&db, "b", 2).await;

    let report = tablepivot::run_all(
        &db,
        &db,
        Dialect::SQLite,
        &["a", "missing", "b"],
        RowCap::default(),
    )
    .await;

    assert_eq!(
        report.to_string(),
        "Successfully pivoted table: a\n\
         Error pivoting table 'missing': no columns found for table missing\n\
         Successfully pivoted table: b"
    );
    assert_eq!(column_count(&db, "a_PIVOTED").await, 3);
    assert_eq!(column_count(&db, "b_PIVOTED").await, 3);
}

#[tokio::test]
async fn test_awkward_identifiers_are_quoted() {
    let db = open().await;
    exec(&db, r#"CREATE TABLE "odd names" ("unit price" REAL, "it's" TEXT, "order" INTEGER)"#).await;
    exec(&db, r#"INSERT INTO "odd names" VALUES (9.5, 'yes', 1)"#).await;

    let report = tablepivot::run_all(
        &db,
        &db,
        Dialect::SQLite,
        &[r#""odd names""#],
        RowCap::default(),
    )
    .await;
    assert!(report.is_success(), "{report}");

    let names = col_names(&db, r#""odd names_PIVOTED""#).await;
    assert_eq!(names, vec!["it's", "order", "unit price"]);
}
