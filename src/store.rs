// ~/RandomBackground/src/store.rs

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde_json::{Map, Value};

use crate::{
    error::{StoreError, StoreResult},
    warn, DEBUG_NAME,
};

/// Namespaced key-value persistence supplied by the host.
pub trait SettingsStore {
    fn load(&self, namespace: &str, key: &str) -> Option<Value>;
    fn save(&mut self, namespace: &str, key: &str, value: &Value) -> StoreResult<()>;
}

/* =========================
   FILE STORE
   ========================= */

/// One pretty-printed `<namespace>.config.json` object per namespace.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.config.json"))
    }

    fn read_namespace(&self, path: &Path) -> StoreResult<Map<String, Value>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(path.display().to_string())),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self, namespace: &str, key: &str) -> Option<Value> {
        let path = self.namespace_path(namespace);
        match self.read_namespace(&path) {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                warn!("[{}][STORE] {e}", DEBUG_NAME);
                None
            }
        }
    }

    fn save(&mut self, namespace: &str, key: &str, value: &Value) -> StoreResult<()> {
        let path = self.namespace_path(namespace);
        // An unreadable file is replaced rather than blocking every future save.
        let mut map = self.read_namespace(&path).unwrap_or_default();
        map.insert(key.to_string(), value.clone());

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(&Value::Object(map)).map_err(|source| {
            StoreError::Json {
                path: path.clone(),
                source,
            }
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

/* =========================
   MEMORY STORE
   ========================= */

/// Shared in-memory store; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Rc<RefCell<HashMap<(String, String), Value>>>,
    saves: Rc<RefCell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, namespace: &str, key: &str) -> Option<Value> {
        self.data
            .borrow()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    fn save(&mut self, namespace: &str, key: &str, value: &Value) -> StoreResult<()> {
        self.data
            .borrow_mut()
            .insert((namespace.to_string(), key.to_string()), value.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
