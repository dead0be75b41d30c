use crate::{PrefsError, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Host preference store.
pub trait Preferences {
    /// Declare a preference and the value it reads as until first written
    fn add_preference(&mut self, key: &str, default: &str);

    fn get_value(&self, key: &str) -> Option<String>;

    fn set_value(&mut self, key: &str, value: &str) -> Result<()>;

    /// Pick up values written by other handles since the last read
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read `key`, hand the value to `f` and store what it returns, as one
    /// step. `Ok(None)` from `f` leaves the value as it is. Returns the value
    /// afterwards.
    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(&str) -> Result<Option<String>>,
    ) -> Result<String> {
        let current = self.get_value(key).unwrap_or_default();
        match f(&current)? {
            Some(next) => {
                self.set_value(key, &next)?;
                Ok(next)
            }
            None => Ok(current),
        }
    }
}

/// Preferences kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    defaults: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an already persisted value
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut prefs = Self::default();
        prefs.values.insert(key.to_string(), value.to_string());
        prefs
    }
}

impl Preferences for MemoryPreferences {
    fn add_preference(&mut self, key: &str, default: &str) {
        self.defaults.insert(key.to_string(), default.to_string());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences persisted as a JSON object of strings.
///
/// Writes merge into whatever is on disk at the time, under an exclusive lock
/// on a sibling `.lock` file, and land through a temp file + rename.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    defaults: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = read_values(&path)?;
        log::debug!(
            "Opened preferences {} ({} values)",
            path.display(),
            values.len()
        );
        Ok(Self {
            path,
            defaults: BTreeMap::new(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Run `op` on the values currently on disk while holding the exclusive
    /// file lock; when it returns `true` the values are written back. The
    /// cache is refreshed either way.
    fn locked_update<T>(
        &mut self,
        op: impl FnOnce(&mut BTreeMap<String, String>) -> Result<(bool, T)>,
    ) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|err| {
                PrefsError::LockError(format!("open {}: {err}", lock_path.display()))
            })?;
        lock.lock_exclusive().map_err(|err| {
            PrefsError::LockError(format!("acquire {}: {err}", lock_path.display()))
        })?;

        let outcome = (|| -> Result<(BTreeMap<String, String>, T)> {
            let mut values = read_values(&self.path)?;
            let (dirty, result) = op(&mut values)?;
            if dirty {
                let bytes = serde_json::to_vec_pretty(&values)?;
                let tmp = self.path.with_extension("json.tmp");
                fs::write(&tmp, bytes)?;
                fs::rename(&tmp, &self.path)?;
            }
            Ok((values, result))
        })();
        let _ = FileExt::unlock(&lock);

        let (values, result) = outcome?;
        self.values = values;
        Ok(result)
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let bytes = fs::read(path)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    let serde_json::Value::Object(map) = value else {
        return Err(PrefsError::InvalidPreferences(format!(
            "{} is not a JSON object",
            path.display()
        )));
    };

    let mut values = BTreeMap::new();
    for (key, value) in map {
        match value {
            serde_json::Value::String(s) => {
                values.insert(key, s);
            }
            other => log::warn!(
                "Skipping non-string preference {key} in {}: {other}",
                path.display()
            ),
        }
    }
    Ok(values)
}

impl Preferences for FilePreferences {
    fn add_preference(&mut self, key: &str, default: &str) {
        self.defaults.insert(key.to_string(), default.to_string());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.locked_update(|values| {
            values.insert(key.to_string(), value.to_string());
            Ok((true, ()))
        })
    }

    fn reload(&mut self) -> Result<()> {
        self.values = read_values(&self.path)?;
        Ok(())
    }

    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(&str) -> Result<Option<String>>,
    ) -> Result<String> {
        let default = self.defaults.get(key).cloned().unwrap_or_default();
        self.locked_update(|values| {
            let current = values.get(key).cloned().unwrap_or(default);
            match f(&current)? {
                Some(next) => {
                    values.insert(key.to_string(), next.clone());
                    Ok((true, next))
                }
                None => Ok((false, current)),
            }
        })
    }
}
