use rusqlite::Connection;
use storefront_core::db::migrations::latest_version;
use storefront_core::db::{
    open_db, open_db_in_memory, open_db_reset, reset_schema, schema_matches_mapping, DbError,
    DbLocation, MAPPED_TABLES,
};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for mapping in MAPPED_TABLES {
        assert_table_exists(&conn, mapping.table);
    }
    assert!(schema_matches_mapping(&conn).unwrap());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "stores");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reset_schema_discards_existing_rows() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO stores (name) VALUES ('Old Store');", [])
        .unwrap();
    conn.execute(
        "INSERT INTO products (name, price) VALUES ('Old Product', '1.00');",
        [],
    )
    .unwrap();

    reset_schema(&mut conn).unwrap();

    assert_eq!(row_count(&conn, "stores"), 0);
    assert_eq!(row_count(&conn, "products"), 0);
    assert_eq!(schema_version(&conn), latest_version());
    assert!(schema_matches_mapping(&conn).unwrap());
}

#[test]
fn reset_schema_rebuilds_missing_tables() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE store_products;").unwrap();
    assert!(!schema_matches_mapping(&conn).unwrap());

    reset_schema(&mut conn).unwrap();

    assert_table_exists(&conn, "store_products");
    assert!(schema_matches_mapping(&conn).unwrap());
}

#[test]
fn reset_schema_on_file_database_persists_clean_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reset.db");

    let mut conn = open_db(&path).unwrap();
    conn.execute("INSERT INTO stores (name) VALUES ('Gone');", [])
        .unwrap();
    reset_schema(&mut conn).unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    assert_eq!(row_count(&reopened, "stores"), 0);
}

#[test]
fn open_db_reset_rebuilds_database_with_newer_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE stores (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO stores (name) VALUES ('From The Future');
         PRAGMA user_version = 999;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db_reset(&path).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(row_count(&conn, "stores"), 0);
    assert!(schema_matches_mapping(&conn).unwrap());
}

#[test]
fn open_db_reset_replaces_conflicting_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE employees (id INTEGER PRIMARY KEY, full_name TEXT);")
        .unwrap();
    drop(conn);

    assert!(open_db(&path).is_err());
    let conn = DbLocation::File(path).open_reset().unwrap();

    assert!(schema_matches_mapping(&conn).unwrap());
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn both_open_modes_yield_ready_schema_in_memory() {
    for conn in [
        DbLocation::Memory.open().unwrap(),
        DbLocation::Memory.open_reset().unwrap(),
    ] {
        assert_eq!(schema_version(&conn), latest_version());
        assert!(schema_matches_mapping(&conn).unwrap());
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
