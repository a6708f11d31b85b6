//! Named snapshot blobs backed by JSON files
//!
//! Each name maps to `<dir>/<name>.json`. A write replaces the file through
//! a temp file, fsync and rename, so readers see the old value or the new
//! one and never a torn mix. Two names are two independent files; there is
//! no atomicity across them.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::errors::{ViewError, ViewResult};

/// Extension of view blob files
pub const VIEW_FILE_EXTENSION: &str = "json";

/// Durable named-blob get/put.
pub trait ViewStore {
    /// Returns the value stored under `name`, or `T::default()` if nothing
    /// has been stored yet. Absence is never an error.
    fn read_or_default<T>(&self, name: &str) -> ViewResult<T>
    where
        T: DeserializeOwned + Default;

    /// Replaces the value stored under `name`. Durable once this returns.
    fn write<T>(&self, value: &T, name: &str) -> ViewResult<()>
    where
        T: Serialize;
}

/// `ViewStore` over a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileViewStore {
    dir: PathBuf,
}

impl FileViewStore {
    /// Opens a view directory, creating it if missing.
    pub fn open(dir: &Path) -> ViewResult<Self> {
        fs::create_dir_all(dir).map_err(|e| ViewError::io(&dir.display().to_string(), e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the view directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that backs `name`.
    pub fn path_for(&self, name: &str) -> ViewResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, VIEW_FILE_EXTENSION)))
    }
}

impl ViewStore for FileViewStore {
    fn read_or_default<T>(&self, name: &str) -> ViewResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_for(name)?;
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(ViewError::io(name, e)),
        };

        serde_json::from_slice(&content).map_err(|source| ViewError::Parse {
            name: name.to_string(),
            source,
        })
    }

    fn write<T>(&self, value: &T, name: &str) -> ViewResult<()>
    where
        T: Serialize,
    {
        let path = self.path_for(name)?;
        let content = serde_json::to_vec_pretty(value).map_err(|source| ViewError::Serialize {
            name: name.to_string(),
            source,
        })?;

        let temp_path = self.dir.join(format!("{}.{}.tmp", name, Uuid::new_v4()));
        let result = write_atomic(&temp_path, &path, &content);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.map_err(|e| ViewError::io(name, e))
    }
}

fn write_atomic(temp_path: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

/// Names are used as file stems, so they must stay inside the directory.
fn validate_name(name: &str) -> ViewResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ViewError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counts {
        by_key: BTreeMap<String, u64>,
    }

    #[test]
    fn test_missing_view_reads_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        let counts: Counts = store.read_or_default("Counts").unwrap();
        assert_eq!(counts, Counts::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        let mut counts = Counts::default();
        counts.by_key.insert("rust".to_string(), 3);
        store.write(&counts, "Counts").unwrap();

        let loaded: Counts = store.read_or_default("Counts").unwrap();
        assert_eq!(loaded, counts);
    }

    #[test]
    fn test_write_replaces_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        store.write(&1u64, "n").unwrap();
        store.write(&2u64, "n").unwrap();
        assert_eq!(store.read_or_default::<u64>("n").unwrap(), 2);

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["n.json".to_string()]);
    }

    #[test]
    fn test_dotted_names_are_distinct_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        store.write(&1u64, "Tags").unwrap();
        store.write(&2u64, "Tags.info").unwrap();
        assert_eq!(store.read_or_default::<u64>("Tags").unwrap(), 1);
        assert_eq!(store.read_or_default::<u64>("Tags.info").unwrap(), 2);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        for name in ["", ".", "..", "../escape", "a/b", "a\\b"] {
            assert!(matches!(
                store.write(&0u64, name),
                Err(ViewError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileViewStore::open(temp_dir.path()).unwrap();

        store.write(&"text", "v").unwrap();
        let err = store.read_or_default::<u64>("v").unwrap_err();
        assert!(matches!(err, ViewError::Parse { .. }));
        assert_eq!(err.name(), "v");
    }
}
