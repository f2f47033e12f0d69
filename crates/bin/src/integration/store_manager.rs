//! Location of the default SQLite corpus store.

use riskalpha::data::{DataError, SqliteCorpus};
use std::path::{Path, PathBuf};

/// Platform data directory for riskalpha.
///
/// - Linux: `~/.local/share/riskalpha/`
/// - macOS: `~/Library/Application Support/riskalpha/`
/// - Windows: `%APPDATA%\riskalpha\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("riskalpha")
}

/// Default corpus database path.
pub(crate) fn default_db_path() -> PathBuf {
    default_data_dir().join("corpus.db")
}

/// The given path, or the default one.
pub(crate) fn resolve_db_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(default_db_path, Path::to_path_buf)
}

/// Open (or create) a store, creating its directory if needed.
pub(crate) fn open_store(path: &Path) -> Result<SqliteCorpus, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCorpus::new(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_under_data_dir() {
        let path = default_db_path();
        assert!(path.ends_with("riskalpha/corpus.db"));
        assert_eq!(resolve_db_path(None), path);
        assert_eq!(
            resolve_db_path(Some(Path::new("x/y.db"))),
            PathBuf::from("x/y.db")
        );
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("corpus.db");
        let store = open_store(&path).unwrap();
        assert_eq!(store.stats().unwrap().documents, 0);
        assert!(path.exists());
    }
}
