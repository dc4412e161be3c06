// SPDX-License-Identifier: MIT

//! Request-scoped scratch files for uploaded videos.
//!
//! Every in-flight analysis gets a unique upload path derived from a
//! freshly generated id, so concurrent uploads of the same exercise
//! type never collide. The file is removed when the guard drops,
//! whether analysis succeeded or failed.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Owned scratch path for one uploaded video; removes the file on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Allocate a unique path under `upload_dir`. The directory is
    /// created if missing; the file itself is written by the caller.
    pub fn allocate(upload_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(upload_dir)?;
        let path = upload_dir.join(format!("{}.mp4", Uuid::new_v4()));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}
