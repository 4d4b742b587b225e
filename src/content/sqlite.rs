use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::content::repository::{
    ContentError, ContentResource, ResourceBody, ResourceId, ResourceKind, ResourceRepository,
};
use crate::content::schema::{CONTENT_DB_SCHEMA, CONTENT_SCHEMA_VERSION};

/// Resource repository backed by a SQLite file. Bodies are stored as JSON.
pub struct SqliteResourceRepository {
    conn: Connection,
}

impl SqliteResourceRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, ContentError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ContentError> {
        conn.execute_batch(CONTENT_DB_SCHEMA)?;
        ensure_content_meta(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn count(&self) -> Result<i64, ContentError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get::<_, i64>(0))?;
        Ok(count)
    }
}

impl ResourceRepository for SqliteResourceRepository {
    fn load(&self, id: &ResourceId) -> Result<ContentResource, ContentError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM resources WHERE resource_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        let Some(body) = body else {
            return Err(ContentError::NotFound(id.clone()));
        };
        let body: ResourceBody = serde_json::from_str(&body).map_err(|source| ContentError::Body {
            id: id.clone(),
            source,
        })?;
        Ok(ContentResource {
            id: id.clone(),
            body,
        })
    }

    fn save(&mut self, resource: &ContentResource) -> Result<(), ContentError> {
        let body = serde_json::to_string(&resource.body).map_err(|source| ContentError::Body {
            id: resource.id.clone(),
            source,
        })?;
        self.conn.execute(
            "INSERT INTO resources (resource_id, namespace, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(resource_id) DO UPDATE SET namespace = excluded.namespace, body = excluded.body",
            params![resource.id.0, resource.kind().namespace(), body],
        )?;
        Ok(())
    }

    fn list_ids(&self, kind: ResourceKind) -> Result<Vec<ResourceId>, ContentError> {
        let mut stmt = self
            .conn
            .prepare("SELECT resource_id FROM resources WHERE namespace = ?1 ORDER BY resource_id")?;
        let rows = stmt.query_map(params![kind.namespace()], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(ResourceId(row?));
        }
        Ok(out)
    }

    fn remove(&mut self, id: &ResourceId) -> Result<bool, ContentError> {
        let changed = self
            .conn
            .execute("DELETE FROM resources WHERE resource_id = ?1", params![id.0])?;
        Ok(changed > 0)
    }
}

fn ensure_content_meta(conn: &Connection) -> Result<(), ContentError> {
    let version = conn
        .query_row(
            "SELECT schema_version FROM content_meta WHERE id = 1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        None => {
            conn.execute(
                "INSERT INTO content_meta (id, schema_version) VALUES (1, ?1)",
                params![CONTENT_SCHEMA_VERSION],
            )?;
            Ok(())
        }
        Some(found) if found == CONTENT_SCHEMA_VERSION => Ok(()),
        Some(found) => Err(ContentError::SchemaMismatch {
            found,
            expected: CONTENT_SCHEMA_VERSION,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::repository::{ItemDef, SpeciesDef};
    use crate::components::creature::BehaviorKind;

    fn dagger() -> ContentResource {
        ContentResource {
            id: ResourceId::new("base", "dagger"),
            body: ResourceBody::Item(ItemDef {
                name: "Dagger".to_string(),
                weight: 2,
            }),
        }
    }

    #[test]
    fn save_load_list_remove() {
        let mut repo = SqliteResourceRepository::open_in_memory().unwrap();
        repo.save(&dagger()).unwrap();
        repo.save(&ContentResource {
            id: ResourceId::new("base", "rat"),
            body: ResourceBody::Species(SpeciesDef {
                name: "Rat".to_string(),
                health: 5,
                action_points: 100,
                skills: Default::default(),
                behavior: BehaviorKind::Wander,
                hostile: true,
            }),
        })
        .unwrap();

        assert_eq!(repo.load(&ResourceId::new("base", "dagger")).unwrap(), dagger());
        assert_eq!(
            repo.list_ids(ResourceKind::Item).unwrap(),
            vec![ResourceId::new("base", "dagger")]
        );
        assert_eq!(repo.list_ids(ResourceKind::Species).unwrap().len(), 1);

        assert!(repo.remove(&ResourceId::new("base", "dagger")).unwrap());
        assert!(!repo.remove(&ResourceId::new("base", "dagger")).unwrap());
        assert!(matches!(
            repo.load(&ResourceId::new("base", "dagger")),
            Err(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn save_overwrites_existing_id() {
        let mut repo = SqliteResourceRepository::open_in_memory().unwrap();
        repo.save(&dagger()).unwrap();
        let mut heavier = dagger();
        heavier.body = ResourceBody::Item(ItemDef {
            name: "Dagger".to_string(),
            weight: 9,
        });
        repo.save(&heavier).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.load(&heavier.id).unwrap(), heavier);
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CONTENT_DB_SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO content_meta (id, schema_version) VALUES (1, 99)",
            [],
        )
        .unwrap();
        assert!(matches!(
            SqliteResourceRepository::init(conn),
            Err(ContentError::SchemaMismatch { found: 99, .. })
        ));
    }
}
