// ~/RandomBackground/src/data_loaders/yaml.rs

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
    time::SystemTime,
};

use serde_yaml::Value;

use crate::{warn, DEBUG_NAME};

/* =========================
   CONFIG CACHE
========================= */

const CACHE_LIMIT: usize = 32;

// Parsed documents keyed by path, valid while the file's mtime is unchanged
static YAML_CACHE: LazyLock<RwLock<HashMap<PathBuf, (Value, SystemTime)>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// YAML loader with a per-file cache invalidated by modification time.
/// Missing or unparsable files yield `None`.
pub fn load_yaml(path: &Path) -> Option<Value> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();

    if let Some(modified) = modified {
        if let Ok(cache) = YAML_CACHE.read() {
            if let Some((v, t)) = cache.get(path) {
                if *t == modified {
                    return Some(v.clone());
                }
            }
        }
    }

    let txt = fs::read_to_string(path).ok()?;
    let v: Value = match serde_yaml::from_str(&txt) {
        Ok(v) => v,
        Err(e) => {
            warn!("[{}][CONFIG] Failed to parse {}: {e}", DEBUG_NAME, path.display());
            return None;
        }
    };

    if let (Some(modified), Ok(mut cache)) = (modified, YAML_CACHE.write()) {
        if cache.len() >= CACHE_LIMIT && !cache.contains_key(path) {
            if let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, (_, t))| *t)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest);
            }
        }
        cache.insert(path.to_path_buf(), (v.clone(), modified));
    }

    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_reloads_after_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        assert!(load_yaml(&path).is_none());

        fs::write(&path, "background:\n  alpha: 0.5\n").unwrap();
        let first = load_yaml(&path).unwrap();
        assert_eq!(first["background"]["alpha"].as_f64(), Some(0.5));

        fs::write(&path, "background:\n  alpha: 0.75\n").unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(later).unwrap();

        let second = load_yaml(&path).unwrap();
        assert_eq!(second["background"]["alpha"].as_f64(), Some(0.75));
    }

    #[test]
    fn invalid_yaml_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "background: [unclosed").unwrap();
        assert!(load_yaml(&path).is_none());
    }
}
