//! Per-conversion scratch directories.
//!
//! A [`Workspace`] owns a uniquely named directory under the temp root. The
//! directory and everything in it is removed when the workspace is dropped,
//! which covers early returns, panics and cancelled request futures.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::formats::FormatId;

/// Directory name prefix for workspaces.
pub const WORKSPACE_PREFIX: &str = "imgshift-";

/// Scoped temporary directory for one conversion.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        tracing::trace!(workspace = %dir.path().display(), "Workspace created");
        Ok(Self { dir })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the upload as `input.<ext>` and return its path.
    pub async fn stage_input(&self, format: FormatId, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.file(&format!("input.{}", format.extension()));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::trace!(workspace = %path.display(), "Workspace removed");
        Ok(())
    }
}
