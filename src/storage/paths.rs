// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the sandbox layout.
//!
//! Every path below the root is built from [`FileName`] segments, which are
//! validated to be exactly one normal path component. Joining them cannot
//! climb out of a namespace directory.

use std::path::{Component, Path, PathBuf};

use crate::auth::Principal;

/// Default sandbox root, relative to the working directory.
pub const DATA_ROOT: &str = "./files";

/// Longest accepted file name, in bytes (common filesystem limit).
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Rejected file name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file name {name:?}: {reason}")]
pub struct InvalidFileName {
    pub name: String,
    pub reason: &'static str,
}

/// A file name restricted to a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Validate `name` as a single path segment.
    ///
    /// # Errors
    /// Rejects empty names, names longer than [`MAX_FILE_NAME_LEN`] bytes,
    /// `.` and `..`, and names containing `/`, `\` or NUL.
    pub fn parse(name: &str) -> Result<FileName, InvalidFileName> {
        let reject = |reason| {
            Err(InvalidFileName {
                name: name.to_owned(),
                reason,
            })
        };

        if name.is_empty() {
            return reject("empty");
        }
        if name.len() > MAX_FILE_NAME_LEN {
            return reject("too long");
        }
        if name == "." || name == ".." {
            return reject("reserved name");
        }
        if name.contains(['/', '\\']) {
            return reject("contains a path separator");
        }
        if name.contains('\0') {
            return reject("contains NUL");
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(FileName(name.to_owned())),
            _ => reject("not a single path segment"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage path utilities for the sandbox.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory holding every namespace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a principal's files.
    pub fn namespace_dir(&self, principal: &Principal) -> PathBuf {
        self.root.join(principal.namespace())
    }

    /// Path to one of a principal's files.
    pub fn file(&self, principal: &Principal, name: &FileName) -> PathBuf {
        self.namespace_dir(principal).join(name.as_str())
    }
}
