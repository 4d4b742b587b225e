use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::world::ModuleUid;

pub const RUNTIME_MODULE: &str = "runtime";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("no free module uid left for {0}")]
    Exhausted(String),

    #[error("module uid {0} is not registered")]
    Unknown(ModuleUid),

    #[error("module {0} has used up its local id space")]
    LocalIdsExhausted(ModuleUid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub uid: ModuleUid,
    pub next_local: u64,
}

/// Persisted form: modules in load order with their assigned uids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTable {
    pub modules: Vec<ModuleEntry>,
}

/// Bidirectional module-name <-> uid map plus each module's local id counter.
///
/// Uid 0 belongs to the runtime. Content modules get the lowest free uid in
/// load order, or keep a recorded uid unless another module already holds it.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    by_name: HashMap<String, ModuleUid>,
    by_uid: BTreeMap<ModuleUid, String>,
    order: Vec<ModuleUid>,
    next_local: HashMap<ModuleUid, u64>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_uid: BTreeMap::new(),
            order: Vec::new(),
            next_local: HashMap::new(),
        };
        registry.bind(RUNTIME_MODULE, ModuleUid::RUNTIME);
        // Local 0 of the runtime is the player.
        registry.next_local.insert(ModuleUid::RUNTIME, 1);
        registry
    }

    /// Register a module with no recorded uid.
    pub fn register(&mut self, name: &str) -> Result<ModuleUid, ModuleError> {
        self.register_with(name, None)
    }

    /// Register a module, preferring `desired` when it is free. Registering a
    /// name twice returns the uid it already has.
    pub fn register_with(
        &mut self,
        name: &str,
        desired: Option<ModuleUid>,
    ) -> Result<ModuleUid, ModuleError> {
        if let Some(uid) = self.by_name.get(name) {
            return Ok(*uid);
        }

        let uid = match desired {
            Some(uid) if uid != ModuleUid::RUNTIME && !self.by_uid.contains_key(&uid) => uid,
            _ => self
                .lowest_free()
                .ok_or_else(|| ModuleError::Exhausted(name.to_string()))?,
        };
        self.bind(name, uid);
        Ok(uid)
    }

    /// Rebuild from a saved table, keeping recorded uids where possible, then
    /// register any module from `load_order` the save did not know about.
    pub fn restore(table: &ModuleTable, load_order: &[String]) -> Result<Self, ModuleError> {
        let mut registry = Self::new();
        for entry in &table.modules {
            let uid = if entry.name == RUNTIME_MODULE {
                ModuleUid::RUNTIME
            } else {
                registry.register_with(&entry.name, Some(entry.uid))?
            };
            let counter = registry.next_local.entry(uid).or_insert(0);
            *counter = (*counter).max(entry.next_local);
        }
        for name in load_order {
            registry.register(name)?;
        }
        Ok(registry)
    }

    pub fn to_table(&self) -> ModuleTable {
        ModuleTable {
            modules: self
                .order
                .iter()
                .map(|uid| ModuleEntry {
                    name: self.by_uid[uid].clone(),
                    uid: *uid,
                    next_local: self.next_local.get(uid).copied().unwrap_or(0),
                })
                .collect(),
        }
    }

    pub fn uid_of(&self, name: &str) -> Option<ModuleUid> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, uid: ModuleUid) -> Option<&str> {
        self.by_uid.get(&uid).map(String::as_str)
    }

    /// Module names in registration order, runtime first.
    pub fn names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|uid| self.by_uid.get(uid).map(String::as_str))
            .collect()
    }

    /// Hand out the module's next local id. Never repeats a value.
    pub fn allocate_local(&mut self, uid: ModuleUid) -> Result<u64, ModuleError> {
        let Some(counter) = self.next_local.get_mut(&uid) else {
            return Err(ModuleError::Unknown(uid));
        };
        let local = *counter;
        *counter = counter
            .checked_add(1)
            .ok_or(ModuleError::LocalIdsExhausted(uid))?;
        Ok(local)
    }

    /// Make sure the counter is past an id that already exists.
    pub fn reserve_local(&mut self, uid: ModuleUid, local: u64) {
        if let Some(counter) = self.next_local.get_mut(&uid) {
            if *counter <= local {
                *counter = local.saturating_add(1);
            }
        }
    }

    fn lowest_free(&self) -> Option<ModuleUid> {
        (1..=u16::MAX)
            .map(ModuleUid)
            .find(|uid| !self.by_uid.contains_key(uid))
    }

    fn bind(&mut self, name: &str, uid: ModuleUid) {
        self.by_name.insert(name.to_string(), uid);
        self.by_uid.insert(uid, name.to_string());
        self.order.push(uid);
        self.next_local.entry(uid).or_insert(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fresh_load_order_assigns_one_to_n() {
        let mut registry = ModuleRegistry::new();
        for (i, name) in ["base", "caves", "extra"].iter().enumerate() {
            assert_eq!(registry.register(name).unwrap(), ModuleUid(i as u16 + 1));
        }
        assert_eq!(registry.uid_of("runtime"), Some(ModuleUid::RUNTIME));
        assert_eq!(registry.name_of(ModuleUid(2)), Some("caves"));
    }

    #[test]
    fn recorded_uids_are_reproduced() {
        let table = ModuleTable {
            modules: vec![
                ModuleEntry { name: "runtime".into(), uid: ModuleUid(0), next_local: 9 },
                ModuleEntry { name: "caves".into(), uid: ModuleUid(5), next_local: 3 },
                ModuleEntry { name: "base".into(), uid: ModuleUid(2), next_local: 40 },
            ],
        };
        let registry = ModuleRegistry::restore(&table, &names(&["base", "caves"])).unwrap();
        assert_eq!(registry.uid_of("caves"), Some(ModuleUid(5)));
        assert_eq!(registry.uid_of("base"), Some(ModuleUid(2)));
        assert_eq!(registry.to_table(), table);
    }

    #[test]
    fn collision_rehomes_to_lowest_free_uid() {
        let table = ModuleTable {
            modules: vec![
                ModuleEntry { name: "base".into(), uid: ModuleUid(1), next_local: 0 },
                ModuleEntry { name: "caves".into(), uid: ModuleUid(1), next_local: 0 },
            ],
        };
        let registry = ModuleRegistry::restore(&table, &[]).unwrap();
        assert_eq!(registry.uid_of("base"), Some(ModuleUid(1)));
        assert_eq!(registry.uid_of("caves"), Some(ModuleUid(2)));
    }

    #[test]
    fn new_modules_after_restore_take_free_uids() {
        let table = ModuleTable {
            modules: vec![ModuleEntry { name: "base".into(), uid: ModuleUid(1), next_local: 0 }],
        };
        let registry = ModuleRegistry::restore(&table, &names(&["base", "caves"])).unwrap();
        assert_eq!(registry.uid_of("caves"), Some(ModuleUid(2)));
        assert_eq!(registry.names(), vec!["runtime", "base", "caves"]);
    }

    #[test]
    fn local_ids_never_repeat() {
        let mut registry = ModuleRegistry::new();
        let base = registry.register("base").unwrap();
        assert_eq!(registry.allocate_local(base).unwrap(), 0);
        assert_eq!(registry.allocate_local(base).unwrap(), 1);
        registry.reserve_local(base, 10);
        assert_eq!(registry.allocate_local(base).unwrap(), 11);
        assert_eq!(registry.allocate_local(ModuleUid::RUNTIME).unwrap(), 1);
        assert!(matches!(
            registry.allocate_local(ModuleUid(77)),
            Err(ModuleError::Unknown(_))
        ));
    }
}
