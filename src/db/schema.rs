/// Current on-disk schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

/// Ordered migration steps. Entry `n` upgrades a database from version `n`
/// to version `n + 1`.
pub const MIGRATIONS: &[&str] = &[
    // v0 -> v1: history table as first shipped
    r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    imagePath TEXT NOT NULL,
    result TEXT NOT NULL
);
"#,
    // v1 -> v2: snake_case column names
    r#"
ALTER TABLE history RENAME COLUMN imagePath TO image_location;
ALTER TABLE history RENAME COLUMN result TO result_label;
"#,
];
