// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-principal sandboxed file storage.
//!
//! Files live at `<root>/<namespace>/<file name>`. Only [`FileName`] values
//! reach the filesystem, so a caller cannot address anything outside its own
//! namespace directory.
//!
//! Writes go to a uniquely named temp file in the namespace directory and are
//! then renamed over the target: a reader sees either the old or the new
//! content, never a partial write. Concurrent writers to the same file are
//! last-writer-wins.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use uuid::Uuid;

use super::{FileName, StoragePaths};
use crate::auth::Principal;

/// Error type for sandbox storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// File does not exist
    NotFound(String),
    /// Storage not initialized
    NotInitialized,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::NotFound(name) => write!(f, "Not found: {name}"),
            StorageError::NotInitialized => write!(f, "Storage not initialized"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Map an I/O error on `name`, turning "no such file" into `NotFound`.
fn on_file(name: &FileName) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(name.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Sandboxed file storage rooted at [`StoragePaths::root`].
#[derive(Debug, Clone)]
pub struct SandboxStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl SandboxStorage {
    /// Create a new SandboxStorage instance.
    ///
    /// Does NOT create the root directory. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Check if storage is initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create the root directory. Safe to call multiple times.
    pub fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.root())?;
        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete check of the root directory.
    pub fn health_check(&self) -> StorageResult<()> {
        self.ensure_initialized()?;

        let check_file = self.paths.root().join(format!(".health_check-{}", Uuid::new_v4()));
        let data = b"health_check_data";

        fs::write(&check_file, data)?;
        let read_back = fs::read(&check_file);
        fs::remove_file(&check_file)?;

        if read_back? != data {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "health check data mismatch",
            )));
        }
        Ok(())
    }

    /// Write `data` to a principal's file, replacing any existing content.
    ///
    /// Creates the namespace directory if needed.
    pub fn write_file(
        &self,
        principal: &Principal,
        name: &FileName,
        data: &[u8],
    ) -> StorageResult<()> {
        self.ensure_initialized()?;

        let dir = self.paths.namespace_dir(principal);
        fs::create_dir_all(&dir)?;

        let target = self.paths.file(principal, name);
        let temp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = write_then_rename(&temp, &target, data) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Read a principal's file.
    pub fn read_file(&self, principal: &Principal, name: &FileName) -> StorageResult<Vec<u8>> {
        self.ensure_initialized()?;

        let mut file = File::open(self.paths.file(principal, name)).map_err(on_file(name))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Delete a principal's file.
    pub fn delete_file(&self, principal: &Principal, name: &FileName) -> StorageResult<()> {
        self.ensure_initialized()?;
        fs::remove_file(self.paths.file(principal, name)).map_err(on_file(name))
    }

    /// Check if a principal's file exists.
    pub fn exists(&self, principal: &Principal, name: &FileName) -> bool {
        self.paths.file(principal, name).is_file()
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }
}

fn write_then_rename(temp: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp)?;
        file.write_all(data)?;
        file.flush()?;
    }
    fs::rename(temp, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PrincipalRegistry;
    use tempfile::TempDir;

    fn test_storage() -> (SandboxStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = SandboxStorage::new(StoragePaths::new(temp_dir.path()));
        storage.initialize().expect("Failed to initialize test storage");
        (storage, temp_dir)
    }

    fn principal(name: &str, password: &str) -> Principal {
        PrincipalRegistry::with_defaults()
            .authenticate(name, password)
            .unwrap()
    }

    fn name(value: &str) -> FileName {
        FileName::parse(value).unwrap()
    }

    #[test]
    fn initialize_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("files");
        let mut storage = SandboxStorage::new(StoragePaths::new(&root));

        assert!(!storage.is_initialized());
        storage.initialize().unwrap();
        assert!(storage.is_initialized());
        assert!(root.is_dir());
    }

    #[test]
    fn write_creates_namespace_and_reads_back() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");
        let data = b"raw bytes:\x00\x01\x02\nand text";

        storage.write_file(&user1, &name("a.bin"), data).unwrap();

        assert!(storage.paths().namespace_dir(&user1).is_dir());
        assert_eq!(storage.read_file(&user1, &name("a.bin")).unwrap(), data);
    }

    #[test]
    fn write_overwrites_existing_content() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");

        storage.write_file(&user1, &name("f"), b"a much longer first version").unwrap();
        storage.write_file(&user1, &name("f"), b"short").unwrap();

        assert_eq!(storage.read_file(&user1, &name("f")).unwrap(), b"short");
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");

        storage.write_file(&user1, &name("f"), b"data").unwrap();

        let entries: Vec<_> = fs::read_dir(storage.paths().namespace_dir(&user1))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("f")]);
    }

    #[test]
    fn namespaces_are_isolated() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");
        let user2 = principal("user2", "password2");

        storage.write_file(&user1, &name("shared.txt"), b"mine").unwrap();

        assert!(matches!(
            storage.read_file(&user2, &name("shared.txt")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn read_and_delete_missing_file_are_not_found() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");

        assert!(matches!(
            storage.read_file(&user1, &name("missing")),
            Err(StorageError::NotFound(ref n)) if n == "missing"
        ));
        assert!(matches!(
            storage.delete_file(&user1, &name("missing")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_file() {
        let (storage, _dir) = test_storage();
        let user1 = principal("user1", "password1");

        storage.write_file(&user1, &name("gone"), b"x").unwrap();
        assert!(storage.exists(&user1, &name("gone")));

        storage.delete_file(&user1, &name("gone")).unwrap();
        assert!(!storage.exists(&user1, &name("gone")));
    }

    #[test]
    fn health_check_works() {
        let (storage, _dir) = test_storage();
        storage.health_check().expect("Health check should pass");
    }

    #[test]
    fn uninitialized_storage_returns_error() {
        let storage = SandboxStorage::new(StoragePaths::new("/tmp/never-init"));
        let user1 = principal("user1", "password1");

        let result = storage.read_file(&user1, &name("any"));
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }
}
