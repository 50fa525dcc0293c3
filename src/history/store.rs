//! History file persistence.
//!
//! Every save writes the full history to a sibling `<name>.tmp` file, syncs
//! it and renames it over the live file, so a crash mid-write leaves the
//! previous history in place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{History, HistoryError};
use crate::config::MissingStatus;
use crate::jenkins::StatusSnapshot;

/// The on-disk history file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the history, or `None` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<History>, HistoryError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => History::parse(&text).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HistoryError::Io {
                action: "read",
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Read the history; a missing file is an error.
    pub fn read(&self) -> Result<History, HistoryError> {
        self.load()?.ok_or_else(|| HistoryError::NotFound {
            path: self.path.clone(),
        })
    }

    /// Replace the file contents with `history`.
    pub fn save(&self, history: &History) -> Result<(), HistoryError> {
        write_atomic(&self.path, history.to_csv().as_bytes()).map_err(|e| HistoryError::Io {
            action: e.action,
            path: e.path,
            source: e.source,
        })?;
        debug!(path = %self.path.display(), rows = history.rows().len(), "history saved");
        Ok(())
    }

    /// Load, advance by one cycle and save. Returns the saved history.
    pub fn update(
        &self,
        tracked: &[String],
        snapshot: &StatusSnapshot,
        missing: MissingStatus,
        max_samples: usize,
    ) -> Result<History, HistoryError> {
        let previous = self.load()?;
        if previous.is_none() {
            debug!(path = %self.path.display(), "no history file yet, seeding from tracked jobs");
        }
        let history = History::advance(previous, tracked, snapshot, missing, max_samples);
        self.save(&history)?;
        Ok(history)
    }
}

/// Sibling temp path: `dir/file.csv` -> `dir/file.csv.tmp`.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("buildhistory"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Failed step of [`write_atomic`] and the path it failed on.
#[derive(Debug)]
pub(crate) struct WriteFailure {
    pub action: &'static str,
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl WriteFailure {
    fn new(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Write `contents` to `path` through a synced temp file and a rename.
/// Missing parent directories are created.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteFailure> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WriteFailure::new("create directory", parent, e))?;
    }

    let tmp_path = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp_path);
        return Err(WriteFailure::new("write", tmp_path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(WriteFailure::new("rename", tmp_path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
        assert!(matches!(store.read(), Err(HistoryError::NotFound { .. })));
    }

    #[test]
    fn test_update_seeds_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_status_history.csv");
        let store = HistoryStore::new(&path);

        let snap: StatusSnapshot = [("A", "blue")].into_iter().collect();
        store.update(&tracked(), &snap, MissingStatus::Skip, 3).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A,blue\nB\n");

        let snap: StatusSnapshot = [("A", "red"), ("B", "red")].into_iter().collect();
        let history = store.update(&tracked(), &snap, MissingStatus::Skip, 3).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A,blue,red\nB,red\n");
        assert_eq!(store.read().unwrap(), history);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let store = HistoryStore::new(&path);
        store.save(&History::seed(&tracked())).unwrap();

        assert!(path.is_file());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("boards").join("history.csv");
        HistoryStore::new(&path)
            .save(&History::seed(&tracked()))
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A\nB\n");
    }

    #[test]
    fn test_malformed_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "A,blue\n\n").unwrap();

        let store = HistoryStore::new(&path);
        let snap: StatusSnapshot = [("A", "red")].into_iter().collect();
        let err = tokio_test::assert_err!(store.update(&tracked(), &snap, MissingStatus::Skip, 3));
        assert!(matches!(err, HistoryError::MalformedRow { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "A,blue\n\n");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = HistoryStore::new(&path)
            .save(&History::seed(&tracked()))
            .unwrap_err();
        assert!(matches!(err, HistoryError::Io { action: "rename", .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.join("keep").is_file());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path(Path::new("/var/lib/board/history.csv")),
            PathBuf::from("/var/lib/board/history.csv.tmp")
        );
        assert_eq!(temp_path(Path::new("h.csv")), PathBuf::from("h.csv.tmp"));
    }
}
