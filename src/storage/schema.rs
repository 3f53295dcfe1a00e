//! Database schema definitions

/// SQL to create the page table
pub const CREATE_PAGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS page (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    directory TEXT NOT NULL DEFAULT '/',
    name TEXT NOT NULL,
    date TEXT NOT NULL,
    draft INTEGER NOT NULL DEFAULT 1,
    content TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the document table
pub const CREATE_DOCUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS document (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    directory TEXT NOT NULL DEFAULT '/',
    name TEXT NOT NULL,
    content TEXT NOT NULL
)
"#;

/// SQL to create indexes; `(directory, name)` is the record key
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS page_directory_name ON page(directory, name)",
    "CREATE UNIQUE INDEX IF NOT EXISTS document_directory_name ON document(directory, name)",
];

/// Dropping a table drops its indexes with it
pub const DROP_TABLES: &[&str] = &["DROP TABLE IF EXISTS page", "DROP TABLE IF EXISTS document"];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_PAGE_TABLE, CREATE_DOCUMENT_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
