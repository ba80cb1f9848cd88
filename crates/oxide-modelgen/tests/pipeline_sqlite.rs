//! End-to-end generation against a temporary SQLite database.
//!
//! Generates models for a schema covering the SQLite type vocabulary plus a
//! one-to-many relation, checks the emitted files, then writes and reads a
//! row through the Rust types the generator resolved.

use std::path::Path;

use chrono::{TimeZone, Utc};
use oxide_modelgen::prelude::*;
use oxide_pgtypes::Interval;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS all_types (
        id INTEGER PRIMARY KEY,
        bool_col BOOLEAN,
        bool2_col BOOL,
        tiny1 TINYINT(1),
        tiny_col TINYINT,
        tiny4_col TINYINT(4),
        small_col SMALLINT,
        int2_col INT2,
        medium_col MEDIUMINT,
        int_col INT,
        int8_col INT8,
        big_col BIGINT,
        ubig_col UNSIGNED BIG INT,
        real_col REAL,
        double_col DOUBLE,
        float_col FLOAT,
        text_col TEXT,
        varchar_col VARCHAR(255),
        char_col CHAR(10),
        clob_col CLOB,
        uuid_col UUID,
        json_col JSON,
        jsonb_col JSONB,
        blob_col BLOB,
        date_col DATE,
        datetime_col DATETIME,
        ts_col TIMESTAMP,
        numeric_col NUMERIC,
        decimal_col DECIMAL,
        duration_col DURATION,
        interval_col INTERVAL
    )",
    "CREATE TABLE IF NOT EXISTS child (
        id INTEGER PRIMARY KEY,
        all_types_id INTEGER NOT NULL,
        name TEXT,
        FOREIGN KEY(all_types_id) REFERENCES all_types(id)
    )",
];

/// Declares a row struct together with its `(field, type)` list, so the
/// struct can be checked against the one the generator emitted.
macro_rules! row_mirror {
    ($name:ident { $($field:ident: $ty:ty,)* }) => {
        #[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
        struct $name {
            $($field: $ty,)*
        }

        impl $name {
            const FIELDS: &'static [(&'static str, &'static str)] =
                &[$((stringify!($field), stringify!($ty)),)*];
        }
    };
}

// Types are spelled exactly as the generator spells them.
row_mirror!(AllTypeRow {
    id: i64,
    bool_col: Option<bool>,
    bool2_col: Option<bool>,
    tiny1: Option<bool>,
    tiny_col: Option<i8>,
    tiny4_col: Option<i8>,
    small_col: Option<i16>,
    int2_col: Option<i16>,
    medium_col: Option<i32>,
    int_col: Option<i64>,
    int8_col: Option<i64>,
    big_col: Option<i64>,
    ubig_col: Option<u64>,
    real_col: Option<f64>,
    double_col: Option<f64>,
    float_col: Option<f32>,
    text_col: Option<String>,
    varchar_col: Option<String>,
    char_col: Option<String>,
    clob_col: Option<String>,
    uuid_col: uuid::Uuid,
    json_col: serde_json::Value,
    jsonb_col: serde_json::Value,
    blob_col: Vec<u8>,
    date_col: Option<chrono::DateTime<chrono::Utc>>,
    datetime_col: Option<chrono::DateTime<chrono::Utc>>,
    ts_col: Option<chrono::DateTime<chrono::Utc>>,
    numeric_col: Option<f64>,
    decimal_col: Option<f64>,
    duration_col: Option<oxide_pgtypes::Interval>,
    interval_col: Option<oxide_pgtypes::Interval>,
});

fn squash(ty: &str) -> String {
    ty.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Column-backed `(field, type)` pairs of an emitted model file.
fn emitted_columns(src: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut skip = false;
    for line in src.lines().map(str::trim) {
        if line == "#[sqlx(skip)]" {
            skip = true;
            continue;
        }
        let Some(decl) = line.strip_prefix("pub ").and_then(|l| l.strip_suffix(',')) else {
            continue;
        };
        if let Some((name, ty)) = decl.split_once(": ") {
            if !std::mem::take(&mut skip) {
                fields.push((name.to_string(), squash(ty)));
            }
        }
    }
    fields
}

async fn create_database(path: &Path) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create SQLite database");
    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool
}

fn write_config(dir: &Path, db_path: &Path, out_path: &Path) -> GenConfig {
    let toml = format!(
        r#"
out_path = {out:?}
dialect = "sqlite"
database_url = {url:?}
clean_up = true
generate_db_init = true
include_auto_migrate = true

[[extra_fields.all_types]]
property_name = "Children"
property_type = "models.Child"
fk_property_name = "AllTypesID"
ref_property_name = "ID"
has_many = true
pointer = false
"#,
        out = out_path.display().to_string(),
        url = format!("sqlite://{}", db_path.display()),
    );
    let config_path = dir.join("modelgen.toml");
    std::fs::write(&config_path, toml).unwrap();
    GenConfig::load(&config_path).unwrap()
}

fn sample_row() -> AllTypeRow {
    AllTypeRow {
        id: 1,
        bool_col: Some(true),
        bool2_col: Some(false),
        tiny1: Some(false),
        tiny_col: Some(-5),
        tiny4_col: Some(100),
        small_col: Some(-300),
        int2_col: Some(300),
        medium_col: Some(70_000),
        int_col: Some(42),
        int8_col: Some(-42),
        big_col: Some(9_000_000_000),
        ubig_col: Some(7),
        real_col: Some(1.5),
        double_col: Some(2.25),
        float_col: Some(0.5),
        text_col: Some("hello".into()),
        varchar_col: Some("varchar".into()),
        char_col: Some("char".into()),
        clob_col: Some("clob".into()),
        uuid_col: uuid::Uuid::new_v4(),
        json_col: serde_json::json!({"k": "v", "n": [1, 2]}),
        jsonb_col: serde_json::json!([true, null]),
        blob_col: vec![0, 1, 2, 255],
        date_col: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
        datetime_col: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        ts_col: Some(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()),
        numeric_col: Some(12.25),
        decimal_col: Some(99.5),
        duration_col: Some(Interval::from_secs(5400)),
        interval_col: Some(Interval::from_nanos(1_500_000)),
    }
}

/// A value for every column that differs from [`sample_row`].
fn changed_row(id: i64) -> AllTypeRow {
    AllTypeRow {
        id,
        bool_col: Some(false),
        bool2_col: None,
        tiny1: Some(true),
        tiny_col: Some(i8::MAX),
        tiny4_col: None,
        small_col: Some(i16::MIN),
        int2_col: None,
        medium_col: Some(-1),
        int_col: None,
        int8_col: Some(i64::MAX),
        big_col: Some(i64::MIN),
        ubig_col: None,
        real_col: Some(-0.125),
        double_col: None,
        float_col: Some(-2.5),
        text_col: None,
        varchar_col: Some(String::new()),
        char_col: Some("x".into()),
        clob_col: None,
        uuid_col: uuid::Uuid::new_v4(),
        json_col: serde_json::json!("scalar"),
        jsonb_col: serde_json::json!({"nested": {"a": 1}}),
        blob_col: vec![9],
        date_col: None,
        datetime_col: Some(Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()),
        ts_col: None,
        numeric_col: None,
        // Whole numbers would be stored as INTEGER under NUMERIC affinity.
        decimal_col: Some(0.75),
        duration_col: Some(Interval::from_secs(2 * 86_400 + 3661)),
        interval_col: None,
    }
}

/// Column names of `all_types` other than the primary key.
fn data_columns() -> Vec<&'static str> {
    AllTypeRow::FIELDS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| *name != "id")
        .collect()
}

/// Binds every non-key column, in [`AllTypeRow::FIELDS`] order.
fn bind_data<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    row: &'q AllTypeRow,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    // SQLite integers are signed; sqlx only reads `u64`.
    let ubig = row
        .ubig_col
        .map(|v| i64::try_from(v).expect("UNSIGNED BIG INT value out of range"));
    query
        .bind(row.bool_col)
        .bind(row.bool2_col)
        .bind(row.tiny1)
        .bind(row.tiny_col)
        .bind(row.tiny4_col)
        .bind(row.small_col)
        .bind(row.int2_col)
        .bind(row.medium_col)
        .bind(row.int_col)
        .bind(row.int8_col)
        .bind(row.big_col)
        .bind(ubig)
        .bind(row.real_col)
        .bind(row.double_col)
        .bind(row.float_col)
        .bind(&row.text_col)
        .bind(&row.varchar_col)
        .bind(&row.char_col)
        .bind(&row.clob_col)
        .bind(row.uuid_col)
        .bind(&row.json_col)
        .bind(&row.jsonb_col)
        .bind(&row.blob_col)
        .bind(row.date_col)
        .bind(row.datetime_col)
        .bind(row.ts_col)
        .bind(row.numeric_col)
        .bind(row.decimal_col)
        .bind(row.duration_col)
        .bind(row.interval_col)
}

async fn insert(pool: &SqlitePool, row: &AllTypeRow) {
    let columns = data_columns();
    let sql = format!(
        "INSERT INTO all_types (id, {}) VALUES (?, {})",
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    bind_data(sqlx::query(&sql).bind(row.id), row)
        .execute(pool)
        .await
        .unwrap();
}

async fn update(pool: &SqlitePool, row: &AllTypeRow) {
    let assignments: Vec<_> = data_columns()
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect();
    let sql = format!(
        "UPDATE all_types SET {} WHERE id = ?",
        assignments.join(", ")
    );
    let result = bind_data(sqlx::query(&sql), row)
        .bind(row.id)
        .execute(pool)
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
}

async fn fetch(pool: &SqlitePool, id: i64) -> AllTypeRow {
    sqlx::query_as("SELECT * FROM all_types WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn generate_and_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let out_path = dir.path().join("generated");
    let pool = create_database(&db_path).await;

    // A file left over from an earlier run must be cleaned up.
    std::fs::create_dir_all(out_path.join("models")).unwrap();
    std::fs::write(out_path.join("models/stale.gen.rs"), "// stale").unwrap();
    std::fs::write(out_path.join("models/handwritten.rs"), "// keep").unwrap();

    let config = write_config(dir.path(), &db_path, &out_path);
    let emitter = RustModelWriter::from_config(&config);
    let models = GenerationPipeline::new(&config)
        .run(&emitter)
        .await
        .expect("generation failed");

    // Models, ordered by table name.
    let names: Vec<_> = models.iter().map(|m| m.struct_name.as_str()).collect();
    assert_eq!(names, ["AllType", "Child"]);

    let all_types = &models[0];
    assert_eq!(all_types.fields.len(), AllTypeRow::FIELDS.len() + 1);
    for (column, expected) in AllTypeRow::FIELDS {
        let field = all_types
            .field_by_column(column)
            .unwrap_or_else(|| panic!("missing field for {column}"));
        assert_eq!(squash(&field.type_name), squash(expected), "{column}");
    }

    let children = all_types.field("children").expect("relation field");
    assert_eq!(children.type_name, "Vec<Child>");
    assert_eq!(children.json_tag(), Some("children"));
    let relation = children.relation.as_ref().unwrap();
    assert_eq!(relation.kind, RelationKind::HasMany);
    assert_eq!(relation.target_type, "models.Child");

    let child = &models[1];
    assert_eq!(child.field("all_types_id").unwrap().type_name, "i64");
    assert_eq!(child.field("name").unwrap().type_name, "Option<String>");
    assert_eq!(child.field("all_types_id").unwrap().json_tag(), Some("allTypesId"));

    // Emitted files.
    let models_dir = out_path.join("models");
    assert!(!models_dir.join("stale.gen.rs").exists());
    assert!(models_dir.join("handwritten.rs").exists());

    let all_types_src = std::fs::read_to_string(models_dir.join("all_types.gen.rs")).unwrap();
    assert!(all_types_src.contains("pub struct AllType {"));
    assert!(all_types_src.contains("pub children: Vec<Child>,"));

    // The emitted struct has exactly the mirror's column fields, in order.
    let mirror: Vec<_> = AllTypeRow::FIELDS
        .iter()
        .map(|(name, ty)| ((*name).to_string(), squash(ty)))
        .collect();
    assert_eq!(emitted_columns(&all_types_src), mirror);

    let mod_src = std::fs::read_to_string(models_dir.join("mod.gen.rs")).unwrap();
    assert!(mod_src.contains("pub use all_types::AllType;"));
    assert!(mod_src.contains("pub use child::Child;"));

    let db_src = std::fs::read_to_string(out_path.join("db.gen.rs")).unwrap();
    assert!(db_src.contains("pub async fn connect("));
    assert!(db_src.contains("CREATE TABLE IF NOT EXISTS all_types"));
    assert!(db_src.contains("CREATE TABLE IF NOT EXISTS child"));

    // Create, read back, update every column and read again through the
    // resolved types.
    let row = sample_row();
    insert(&pool, &row).await;
    assert_eq!(fetch(&pool, 1).await, row);

    let changed = changed_row(row.id);
    update(&pool, &changed).await;
    let updated = fetch(&pool, 1).await;
    assert_eq!(updated, changed);
    assert_eq!(
        updated.duration_col.map(|d| d.to_string()).as_deref(),
        Some("51h1m1s")
    );

    update(&pool, &row).await;
    assert_eq!(fetch(&pool, 1).await, row);
}

#[tokio::test]
async fn dry_run_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let out_path = dir.path().join("generated");
    let _pool = create_database(&db_path).await;

    std::fs::create_dir_all(out_path.join("models")).unwrap();
    std::fs::write(out_path.join("models/stale.gen.rs"), "// stale").unwrap();

    let config = write_config(dir.path(), &db_path, &out_path);
    let models = GenerationPipeline::new(&config)
        .dry_run(true)
        .run(&RustModelWriter::from_config(&config))
        .await
        .unwrap();

    assert_eq!(models.len(), 2);
    assert!(out_path.join("models/stale.gen.rs").exists());
    assert!(!out_path.join("models/all_types.gen.rs").exists());
}

#[tokio::test]
async fn unsupported_column_type_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let out_path = dir.path().join("generated");
    let pool = create_database(&db_path).await;
    sqlx::query("CREATE TABLE places (id INTEGER PRIMARY KEY, shape GEOMETRY)")
        .execute(&pool)
        .await
        .unwrap();

    let config = write_config(dir.path(), &db_path, &out_path);
    let err = GenerationPipeline::new(&config)
        .run(&RustModelWriter::from_config(&config))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenError::UnsupportedDeclaredType { ref declared_type, .. } if declared_type == "GEOMETRY"
    ));
    assert!(!out_path.join("models/all_types.gen.rs").exists());
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing").join("nope.db");
    let out_path = dir.path().join("generated");

    let config = write_config(dir.path(), &missing, &out_path);
    let err = GenerationPipeline::new(&config)
        .run(&RustModelWriter::from_config(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::Connection(_)));
}
