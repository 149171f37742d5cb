// dashboard/src/persist.rs

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Bump when you change the document layout.
const PREFS_VERSION: u32 = 1;

pub const KEY_SYMBOL: &str = "selected_symbol";
pub const KEY_THEME: &str = "theme";
pub const KEY_AUTO_REFRESH: &str = "auto_refresh";
pub const KEY_REFRESH_INTERVAL: &str = "refresh_interval_ms";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PrefsDoc {
    version: u32,
    values: Map<String, Value>,
}

struct Inner {
    /// `None` when no config directory could be found; everything stays in memory.
    path: Option<PathBuf>,
    doc: Mutex<PrefsDoc>,
    last_saved_json: Mutex<String>,
}

/// Key/value preferences kept in a JSON file under the platform config dir.
///
/// Reads never fail: a missing file means defaults, a corrupt one is archived
/// next to itself and replaced by defaults. Write failures are logged and the
/// value is still kept for the rest of the session.
#[derive(Clone)]
pub struct Persistence {
    inner: Arc<Inner>,
}

impl Persistence {
    pub fn new() -> Self {
        match default_prefs_path() {
            Ok(path) => Self::at(path),
            Err(err) => {
                tracing::warn!("no config directory ({err:#}); preferences will not survive restart");
                Self::in_memory()
            }
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = load_doc(&path);
        Self::build(Some(path), doc)
    }

    pub fn in_memory() -> Self {
        Self::build(None, PrefsDoc::default())
    }

    fn build(path: Option<PathBuf>, doc: PrefsDoc) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                doc: Mutex::new(doc),
                last_saved_json: Mutex::new(String::new()),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn load_preference(&self, key: &str) -> Option<Value> {
        let doc = self.inner.doc.lock().ok()?;
        doc.values.get(key).cloned()
    }

    /// Typed read; a value of the wrong shape counts as absent.
    pub fn load_as<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let value = self.load_preference(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!(key, "ignoring stored preference: {err}");
                None
            }
        }
    }

    pub fn save_preference(&self, key: &str, value: Value) {
        let snapshot = {
            let Ok(mut doc) = self.inner.doc.lock() else {
                return;
            };
            doc.version = PREFS_VERSION;
            doc.values.insert(key.to_string(), value);
            doc.clone()
        };
        if let Err(err) = self.save_now(&snapshot) {
            tracing::warn!(key, "failed to persist preference: {err:#}");
        }
    }

    /// Writes `doc` unless it matches what was last written successfully.
    fn save_now(&self, doc: &PrefsDoc) -> Result<()> {
        let Some(path) = self.inner.path.as_deref() else {
            return Ok(());
        };

        let parent = path.parent().context("prefs path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create config dir {:?}", parent))?;

        let json = serde_json::to_string_pretty(doc)?;

        let mut last = self
            .inner
            .last_saved_json
            .lock()
            .map_err(|_| anyhow::anyhow!("prefs lock poisoned"))?;
        if *last == json {
            return Ok(());
        }

        if path.exists() {
            let _ = fs::copy(path, path.with_extension("json.bak"));
        }
        atomic_write(path, json.as_bytes())?;
        // Only a write that landed counts; a failed one is retried next time.
        *last = json;
        Ok(())
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new()
    }
}

fn default_prefs_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "stockdash", "stockdash")
        .context("ProjectDirs::from returned None")?;
    Ok(proj.config_dir().join("preferences.json"))
}

fn load_doc(path: &Path) -> PrefsDoc {
    if !path.exists() {
        return PrefsDoc::default();
    }
    match read_json::<PrefsDoc>(path) {
        Ok(mut doc) => {
            // simple migration hook
            if doc.version == 0 {
                doc.version = PREFS_VERSION;
            }
            doc
        }
        Err(err) => {
            archive_corrupt(path, &err);
            PrefsDoc::default()
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
    let value = serde_json::from_slice::<T>(&bytes).with_context(|| "parse json")?;
    Ok(value)
}

fn archive_corrupt(path: &Path, err: &anyhow::Error) {
    let ts = chrono::Utc::now().timestamp();
    let archived = path.with_extension(format!("corrupt.{ts}.json"));
    let _ = fs::rename(path, &archived);
    tracing::warn!("preferences corrupt; archived to {:?}. error: {err:?}", archived);
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().context("no parent dir for prefs path")?;
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
        f.write_all(bytes).with_context(|| "write tmp")?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn saved_values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let prefs = Persistence::at(&path);
        prefs.save_preference(KEY_THEME, json!("dark"));
        prefs.save_preference(KEY_SYMBOL, json!("MSFT"));

        let reloaded = Persistence::at(&path);
        assert_eq!(reloaded.load_preference(KEY_THEME), Some(json!("dark")));
        assert_eq!(reloaded.load_as::<String>(KEY_SYMBOL).as_deref(), Some("MSFT"));
        assert_eq!(reloaded.load_preference(KEY_AUTO_REFRESH), None);
    }

    #[test]
    fn corrupt_file_degrades_to_defaults_and_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, b"{ this is not json").unwrap();

        let prefs = Persistence::at(&path);
        assert_eq!(prefs.load_preference(KEY_THEME), None);
        assert!(!path.exists());
        let archived = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().contains("corrupt"));
        assert!(archived);

        prefs.save_preference(KEY_THEME, json!("light"));
        assert_eq!(Persistence::at(&path).load_preference(KEY_THEME), Some(json!("light")));
    }

    #[test]
    fn wrong_shape_reads_as_absent() {
        let prefs = Persistence::in_memory();
        prefs.save_preference(KEY_AUTO_REFRESH, json!("yes please"));
        assert_eq!(prefs.load_as::<bool>(KEY_AUTO_REFRESH), None);
        assert!(prefs.path().is_none());
    }

    #[test]
    fn failed_write_is_retried_with_same_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        // A directory squatting on the temp file name makes the write fail.
        let blocker = dir.path().join(".preferences.json.tmp");
        fs::create_dir(&blocker).unwrap();

        let prefs = Persistence::at(&path);
        prefs.save_preference(KEY_THEME, json!("dark"));
        assert!(!path.exists());

        fs::remove_dir(&blocker).unwrap();
        prefs.save_preference(KEY_THEME, json!("dark"));
        let doc: PrefsDoc = read_json(&path).unwrap();
        assert_eq!(doc.values.get(KEY_THEME), Some(&json!("dark")));
    }

    #[test]
    fn previous_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let prefs = Persistence::at(&path);
        prefs.save_preference(KEY_THEME, json!("dark"));
        prefs.save_preference(KEY_THEME, json!("light"));
        let backup: PrefsDoc = read_json(&path.with_extension("json.bak")).unwrap();
        assert_eq!(backup.values.get(KEY_THEME), Some(&json!("dark")));
    }
}
