//! Text-resource store
//!
//! Story text lives in a loose tree under `resources/` and is looked up by
//! logical name only; the engine never cares where in the tree a text sits.
//! At boot a packed archive (`resources.pak`, a serialized map of relative
//! path to content) replaces the loose tree if present, and on orderly exit
//! the tree is packed back up and removed.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Found-texts subtree shown by `list` and `open`
const FOUND_TEXTS: &str = "user/found_texts";

/// Screensaver frame directory and file prefix
const EYE_DIR: &str = "program/screensaver/eye";
const EYE_FRAME_PREFIX: &str = "eye_frame";

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("could not find resource '{0}'")]
    NotFound(String),

    #[error("resource tree unavailable: {0}")]
    Io(#[from] io::Error),

    #[error("resource archive is corrupt: {0}")]
    BadArchive(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

/// Store rooted at the directory holding `resources/` and `resources.pak`
pub struct ResourceStore {
    base: PathBuf,
}

impl ResourceStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn tree(&self) -> PathBuf {
        self.base.join("resources")
    }

    fn found_dir(&self) -> PathBuf {
        self.tree().join(FOUND_TEXTS)
    }

    fn pak_path(&self) -> PathBuf {
        self.base.join("resources.pak")
    }

    /// Fetch the stored text named `name`, searching the whole tree
    pub fn fetch(&self, name: &str) -> Result<String> {
        let path = find_by_name(&self.tree(), name)?
            .ok_or_else(|| ResourceError::NotFound(name.to_string()))?;
        Ok(fs::read_to_string(path)?)
    }

    /// Read a file by path relative to the found-texts subtree
    pub fn read_found(&self, relative: &str) -> Result<String> {
        let path = self.found_dir().join(relative);
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ResourceError::NotFound(relative.to_string()),
            _ => ResourceError::Io(err),
        })
    }

    /// Directory and file names under a found-texts directory, sorted
    pub fn list_found(&self, dir: &str) -> Result<(Vec<String>, Vec<String>)> {
        let target = if dir.is_empty() {
            self.found_dir()
        } else {
            self.found_dir().join(dir)
        };

        let entries = fs::read_dir(&target).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ResourceError::NotFound(dir.to_string()),
            _ => ResourceError::Io(err),
        })?;

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();
        Ok((dirs, files))
    }

    /// The screensaver's eye frames, in file-name order
    pub fn screensaver_frames(&self) -> Result<Vec<String>> {
        let dir = self.tree().join(EYE_DIR);
        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => ResourceError::NotFound(EYE_DIR.to_string()),
                _ => ResourceError::Io(err),
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(EYE_FRAME_PREFIX))
            .collect();
        names.sort();

        if names.is_empty() {
            return Err(ResourceError::NotFound(EYE_FRAME_PREFIX.to_string()));
        }

        names
            .iter()
            .map(|name| -> Result<String> { Ok(fs::read_to_string(dir.join(name))?) })
            .collect()
    }

    /// Replace the loose tree with the archive's contents, if an archive
    /// exists. The archive is removed afterwards.
    pub fn unpack_if_present(&self) -> Result<()> {
        let pak = self.pak_path();
        if !pak.exists() {
            return Ok(());
        }

        let bundle: BTreeMap<String, String> = serde_json::from_str(&fs::read_to_string(&pak)?)?;

        let tree = self.tree();
        if tree.exists() {
            fs::remove_dir_all(&tree)?;
        }
        for (relative, content) in &bundle {
            if relative.split('/').any(|part| part.is_empty() || part == "..") {
                continue;
            }
            let path = tree.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        fs::remove_file(&pak)?;
        info!(entries = bundle.len(), "resource archive unpacked");
        Ok(())
    }

    /// Pack the loose tree back into the archive and remove it.
    /// A disabled pack or a missing tree is a no-op.
    pub fn pack_if_enabled(&self, enabled: bool) -> Result<()> {
        let tree = self.tree();
        if !enabled || !tree.exists() {
            return Ok(());
        }

        let mut bundle = BTreeMap::new();
        collect_tree(&tree, &tree, &mut bundle)?;
        fs::write(self.pak_path(), serde_json::to_string(&bundle)?)?;
        fs::remove_dir_all(&tree)?;
        info!(entries = bundle.len(), "resource archive packed");
        Ok(())
    }
}

/// Depth-first search for a file with the given name
fn find_by_name(dir: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_by_name(&path, name)? {
                return Ok(Some(found));
            }
        } else if entry.file_name().to_string_lossy() == name {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Collect every file under `dir` into the bundle, keyed by `/`-joined path
/// relative to `root`
fn collect_tree(root: &Path, dir: &Path, bundle: &mut BTreeMap<String, String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_tree(root, &path, bundle)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|part| part.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            bundle.insert(relative, fs::read_to_string(&path)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, ResourceStore) {
        let dir = TempDir::new().unwrap();
        let base = dir.path().to_path_buf();
        fs::create_dir_all(base.join("resources/program/text/deeply/nested")).unwrap();
        fs::create_dir_all(base.join("resources/user/found_texts/archive")).unwrap();
        fs::write(
            base.join("resources/program/text/deeply/nested/boot.txt"),
            "SYSTEM READY",
        )
        .unwrap();
        fs::write(
            base.join("resources/user/found_texts/journal_1.txt"),
            "day one",
        )
        .unwrap();
        fs::write(
            base.join("resources/user/found_texts/archive/memo.txt"),
            "memo",
        )
        .unwrap();
        (dir, ResourceStore::new(base))
    }

    #[test]
    fn test_fetch_finds_nested_resource() {
        let (_dir, store) = seeded_store();
        assert_eq!(store.fetch("boot.txt").unwrap(), "SYSTEM READY");
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let (_dir, store) = seeded_store();
        match store.fetch("absent.txt") {
            Err(ResourceError::NotFound(name)) => assert_eq!(name, "absent.txt"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_found_splits_dirs_and_files() {
        let (_dir, store) = seeded_store();
        let (dirs, files) = store.list_found("").unwrap();
        assert_eq!(dirs, vec!["archive"]);
        assert_eq!(files, vec!["journal_1.txt"]);

        let (sub_dirs, sub_files) = store.list_found("archive").unwrap();
        assert!(sub_dirs.is_empty());
        assert_eq!(sub_files, vec!["memo.txt"]);

        assert!(matches!(
            store.list_found("no_such_dir"),
            Err(ResourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let (dir, store) = seeded_store();

        store.pack_if_enabled(true).unwrap();
        assert!(dir.path().join("resources.pak").exists());
        assert!(!dir.path().join("resources").exists());

        store.unpack_if_present().unwrap();
        assert!(!dir.path().join("resources.pak").exists());
        assert_eq!(store.fetch("boot.txt").unwrap(), "SYSTEM READY");
        assert_eq!(store.read_found("archive/memo.txt").unwrap(), "memo");
    }

    #[test]
    fn test_pack_disabled_leaves_tree() {
        let (dir, store) = seeded_store();
        store.pack_if_enabled(false).unwrap();
        assert!(dir.path().join("resources").exists());
        assert!(!dir.path().join("resources.pak").exists());
    }
}
