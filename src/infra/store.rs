//! Atomic canonical-JSON document persistence.
//!
//! Each engine owns a single JSON document that is rewritten in full on every
//! mutation. Writes go to a temp file in the same directory, are fsynced, and
//! renamed into place so a crash mid-write never leaves a partial document.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::crypto::canonical_json;

use super::error::Result;

/// Persist `value` to `path` as canonical JSON, atomically.
pub fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = canonical_json(&serde_json::to_value(value)?);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;

    Ok(())
}

/// Load a document from `path`.
///
/// Missing, empty or corrupted files yield `None` (with a warning for
/// corruption) so an engine can start fresh rather than refuse to boot.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read document; starting empty");
            return None;
        }
    };

    if contents.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "corrupted document; starting empty");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn round_trips_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("b".to_string(), 2u64);
        doc.insert("a".to_string(), 1u64);

        save_document(&path, &doc).unwrap();
        let loaded: BTreeMap<String, u64> = load_document(&path).unwrap();
        assert_eq!(loaded, doc);

        // Stored form is canonical: sorted keys, compact separators.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Vec<u64>> = load_document(&dir.path().join("absent.json"));
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupted_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{not json").unwrap();

        let loaded: Option<Vec<u64>> = load_document(&path);
        assert!(loaded.is_none());
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        save_document(&path, &vec![1u64, 2, 3]).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["doc.json".to_string()]);
    }
}
