use pretty_assertions::assert_eq;
use startopt_prefs::{decode_ids, Blacklist, FilePreferences, Preferences, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::tempdir;

const KEY: &str = "start_optimiser/id_blacklist";

fn open(path: &Path) -> Blacklist {
    Blacklist::load(Box::new(FilePreferences::open(path).unwrap()), KEY)
}

#[test]
fn legacy_value_is_rewritten_as_json() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");
    fs::write(
        &path,
        r#"{"start_optimiser/id_blacklist": "um2;generic_abs;", "general/language": "en_US"}"#,
    )
    .unwrap();

    let blacklist = open(&path);
    assert_eq!(blacklist.len(), 2);
    blacklist.extend(["with;semicolon"]).unwrap();

    let prefs = FilePreferences::open(&path).unwrap();
    let stored = prefs.get_value(KEY).unwrap();
    assert!(stored.starts_with('['));
    let expected: BTreeSet<String> = ["um2", "generic_abs", "with;semicolon"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(decode_ids(&stored), expected);
    assert_eq!(prefs.get_value("general/language").as_deref(), Some("en_US"));
}

#[test]
fn reset_persists_empty_string() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");

    let blacklist = open(&path);
    blacklist.extend(["a", "b"]).unwrap();
    blacklist.reset().unwrap();

    let prefs = FilePreferences::open(&path).unwrap();
    assert_eq!(prefs.get_value(KEY).as_deref(), Some(""));
    assert!(open(&path).is_empty());
}

#[test]
fn mutations_merge_with_other_writers() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");

    let first = open(&path);
    let second = open(&path);
    first.extend(["from_first"]).unwrap();
    second.extend(["from_second"]).unwrap();

    let reloaded = open(&path);
    assert!(reloaded.contains("from_first"));
    assert!(reloaded.contains("from_second"));
}

/// File preferences where another writer gets in right before each update,
/// after this handle has already cached its view.
struct InterleavedPreferences {
    inner: FilePreferences,
    other_writer: Option<Box<dyn FnOnce() + Send>>,
}

impl Preferences for InterleavedPreferences {
    fn add_preference(&mut self, key: &str, default: &str) {
        self.inner.add_preference(key, default);
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.inner.get_value(key)
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.set_value(key, value)
    }

    fn reload(&mut self) -> Result<()> {
        self.inner.reload()
    }

    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(&str) -> Result<Option<String>>,
    ) -> Result<String> {
        if let Some(write) = self.other_writer.take() {
            write();
        }
        self.inner.update(key, f)
    }
}

fn interleaved(path: &Path, write: impl FnOnce(&Path) + Send + 'static) -> Blacklist {
    let other_path: PathBuf = path.to_path_buf();
    let prefs = InterleavedPreferences {
        inner: FilePreferences::open(path).unwrap(),
        other_writer: Some(Box::new(move || write(&other_path))),
    };
    Blacklist::load(Box::new(prefs), KEY)
}

#[test]
fn extend_keeps_writes_made_after_load() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");

    let first = interleaved(&path, |path| {
        open(path).extend(["from_other_process"]).unwrap();
    });
    let change = first.extend(["from_first"]).unwrap();
    assert_eq!(change.added, 1);
    assert_eq!(change.total, 2);
    assert!(first.contains("from_other_process"));

    let persisted = open(&path).ids();
    let expected: BTreeSet<String> = ["from_first", "from_other_process"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(persisted, expected);
}

#[test]
fn remove_keeps_writes_made_after_load() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");
    open(&path).extend(["a"]).unwrap();

    let first = interleaved(&path, |path| {
        open(path).extend(["b"]).unwrap();
    });
    assert!(first.remove("a").unwrap());

    let persisted = open(&path).ids();
    assert_eq!(persisted, BTreeSet::from(["b".to_string()]));
}

#[test]
fn concurrent_handles_lose_no_ids() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("preferences.json");

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            thread::spawn(move || {
                let blacklist = open(&path);
                for n in 0..10 {
                    blacklist.extend([format!("w{worker}_{n}")]).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(open(&path).len(), 40);
}
