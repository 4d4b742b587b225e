pub const CONTENT_SCHEMA_VERSION: i64 = 1;

pub const CONTENT_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
  resource_id TEXT PRIMARY KEY,
  namespace TEXT NOT NULL,
  body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS resources_by_namespace ON resources (namespace, resource_id);
"#;
