use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::components::world::{EntityUid, MapUid};
use crate::core::serialization::{read_json, write_json, EntityRecord};
use crate::persistence::modules::ModuleTable;
use crate::world::map::MapRecord;

const ENTITY_DIR: &str = "entities";
const MAP_DIR: &str = "maps";
const MODULES_FILE: &str = "modules.json";
const SESSION_FILE: &str = "session.json";

/// On-disk layout of the working state (temp root) and of named save games.
///
/// ```text
/// <temp_root>/entities/<uid>.json
/// <temp_root>/maps/<uid>.json
/// <temp_root>/modules.json
/// <temp_root>/session.json
/// <save_root>/<name>/...        same layout, copied on save
/// ```
#[derive(Debug, Clone)]
pub struct SaveFiles {
    temp_root: PathBuf,
    save_root: PathBuf,
}

impl SaveFiles {
    pub fn new(temp_root: impl Into<PathBuf>, save_root: impl Into<PathBuf>) -> io::Result<Self> {
        let files = Self {
            temp_root: temp_root.into(),
            save_root: save_root.into(),
        };
        fs::create_dir_all(files.temp_root.join(ENTITY_DIR))?;
        fs::create_dir_all(files.temp_root.join(MAP_DIR))?;
        fs::create_dir_all(&files.save_root)?;
        Ok(files)
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }

    pub fn entity_path(&self, uid: EntityUid) -> PathBuf {
        self.temp_root.join(ENTITY_DIR).join(format!("{}.json", uid))
    }

    pub fn map_path(&self, uid: MapUid) -> PathBuf {
        self.temp_root.join(MAP_DIR).join(format!("{}.json", uid))
    }

    pub fn modules_path(&self) -> PathBuf {
        self.temp_root.join(MODULES_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.temp_root.join(SESSION_FILE)
    }

    pub fn entity_exists(&self, uid: EntityUid) -> bool {
        self.entity_path(uid).is_file()
    }

    pub fn map_exists(&self, uid: MapUid) -> bool {
        self.map_path(uid).is_file()
    }

    pub fn write_entity(&self, record: &EntityRecord) -> io::Result<()> {
        write_json(record, self.entity_path(record.uid))
    }

    pub fn read_entity(&self, uid: EntityUid) -> io::Result<EntityRecord> {
        read_json(self.entity_path(uid))
    }

    /// Returns whether a file was deleted.
    pub fn delete_entity(&self, uid: EntityUid) -> io::Result<bool> {
        match fs::remove_file(self.entity_path(uid)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn write_map(&self, record: &MapRecord) -> io::Result<()> {
        write_json(record, self.map_path(record.uid))
    }

    pub fn read_map(&self, uid: MapUid) -> io::Result<MapRecord> {
        read_json(self.map_path(uid))
    }

    pub fn write_modules(&self, table: &ModuleTable) -> io::Result<()> {
        write_json(table, self.modules_path())
    }

    pub fn read_modules(&self) -> io::Result<Option<ModuleTable>> {
        let path = self.modules_path();
        if !path.is_file() {
            return Ok(None);
        }
        read_json(path).map(Some)
    }

    pub fn write_session<T: Serialize>(&self, session: &T) -> io::Result<()> {
        write_json(session, self.session_path())
    }

    pub fn read_session<T: DeserializeOwned>(&self) -> io::Result<Option<T>> {
        let path = self.session_path();
        if !path.is_file() {
            return Ok(None);
        }
        read_json(path).map(Some)
    }

    /// Copy the temp root into `<save_root>/<name>`, replacing an older save
    /// of the same name.
    pub fn save_snapshot(&self, name: &str) -> io::Result<PathBuf> {
        let target = self.save_dir(name)?;
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        copy_dir(&self.temp_root, &target)?;
        Ok(target)
    }

    /// Replace the temp root with the contents of a named save.
    pub fn restore_snapshot(&self, name: &str) -> io::Result<()> {
        let source = self.save_dir(name)?;
        if !source.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no save named {}", name),
            ));
        }
        if self.temp_root.exists() {
            fs::remove_dir_all(&self.temp_root)?;
        }
        copy_dir(&source, &self.temp_root)?;
        fs::create_dir_all(self.temp_root.join(ENTITY_DIR))?;
        fs::create_dir_all(self.temp_root.join(MAP_DIR))
    }

    pub fn list_saves(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.save_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn save_dir(&self, name: &str) -> io::Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid save name {:?}", name),
            ));
        }
        Ok(self.save_root.join(name))
    }
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(dir: &tempfile::TempDir) -> SaveFiles {
        SaveFiles::new(dir.path().join("tmp"), dir.path().join("saves")).unwrap()
    }

    #[test]
    fn entity_files_write_read_delete() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files(&dir);
        let record = EntityRecord {
            uid: EntityUid(77),
            components: Vec::new(),
        };
        files.write_entity(&record).unwrap();
        assert!(files.entity_exists(EntityUid(77)));
        assert_eq!(files.read_entity(EntityUid(77)).unwrap(), record);
        assert!(files.delete_entity(EntityUid(77)).unwrap());
        assert!(!files.delete_entity(EntityUid(77)).unwrap());
    }

    #[test]
    fn snapshot_and_restore() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files(&dir);
        let record = EntityRecord {
            uid: EntityUid(1),
            components: Vec::new(),
        };
        files.write_entity(&record).unwrap();
        files.save_snapshot("slot_1").unwrap();

        files.delete_entity(EntityUid(1)).unwrap();
        files
            .write_entity(&EntityRecord {
                uid: EntityUid(2),
                components: Vec::new(),
            })
            .unwrap();

        files.restore_snapshot("slot_1").unwrap();
        assert!(files.entity_exists(EntityUid(1)));
        assert!(!files.entity_exists(EntityUid(2)));
        assert_eq!(files.list_saves().unwrap(), vec!["slot_1".to_string()]);
    }

    #[test]
    fn save_names_cannot_escape_the_save_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files(&dir);
        assert!(files.save_snapshot("../oops").is_err());
        assert!(files.restore_snapshot("missing").is_err());
    }
}
