// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utility functions for paperdex

use std::path::{Path, PathBuf};

/// The name of the data directory
pub const DATA_DIR: &str = ".paperdex";

/// File name of the embedding database inside [`DATA_DIR`]
pub const DB_FILE: &str = "embeddings.sqlite";

/// Database path for `start`.
///
/// Walks up from `start` and reuses the first ancestor's `.paperdex`
/// directory, so a command run from a subfolder of a project shares that
/// project's store. Without one, the store goes under `start` itself.
pub fn get_db_path(start: impl AsRef<Path>) -> PathBuf {
    let start = start.as_ref();
    let canonical = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    canonical
        .ancestors()
        .map(|dir| dir.join(DATA_DIR))
        .find(|data_dir| data_dir.is_dir())
        .unwrap_or_else(|| start.join(DATA_DIR))
        .join(DB_FILE)
}
