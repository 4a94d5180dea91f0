//! Workspace management for download and upscale pipelines.
//!
//! Provides a temporary directory for intermediate files (downloaded halves,
//! video-only encodes) and the promotion of a finished artifact to its final
//! location. Intermediates vanish when the workspace is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use vg_core::{Error, Result};

/// Temporary working directory for one pipeline run.
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new workspace backed by a fresh temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()
            .map_err(|e| Error::Internal(format!("failed to create workspace: {e}")))?;
        Ok(Self { temp_dir })
    }

    /// The workspace directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Build a path for an intermediate file with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move a finished artifact out of the workspace to `dest`.
    ///
    /// If `dest` already exists it is backed up first and restored when the
    /// move fails. A plain rename is attempted first; when that fails (the
    /// temp dir is usually on a different filesystem) the file is copied and
    /// the source removed.
    pub fn promote(&self, artifact: &Path, dest: &Path) -> Result<PathBuf> {
        if !artifact.exists() {
            return Err(Error::Internal(format!(
                "artifact does not exist: {}",
                artifact.display()
            )));
        }

        if dest.exists() {
            let backup = dest.with_extension("bak");
            std::fs::rename(dest, &backup)?;

            if let Err(e) = move_file(artifact, dest) {
                // Restore the backup so the caller is no worse off.
                let _ = std::fs::rename(&backup, dest);
                return Err(e);
            }

            let _ = std::fs::remove_file(&backup);
        } else {
            move_file(artifact, dest)?;
        }

        Ok(dest.to_path_buf())
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(src: &Path, dest: &Path) -> Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(src, dest)?;
            std::fs::remove_file(src)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_lives_under_workspace() {
        let ws = Workspace::new().unwrap();
        let f = ws.temp_file("video_part.mp4");
        assert!(f.starts_with(ws.path()));
        assert_eq!(f.file_name().unwrap(), "video_part.mp4");
    }

    #[test]
    fn promote_moves_artifact() {
        let ws = Workspace::new().unwrap();
        let artifact = ws.temp_file("out.mp4");
        std::fs::write(&artifact, b"data").unwrap();

        let dest_dir = TempDir::new().unwrap();
        let dest = dest_dir.path().join("final.mp4");
        let promoted = ws.promote(&artifact, &dest).unwrap();

        assert_eq!(promoted, dest);
        assert!(!artifact.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"data");
    }

    #[test]
    fn promote_replaces_existing_dest() {
        let ws = Workspace::new().unwrap();
        let artifact = ws.temp_file("out.mp4");
        std::fs::write(&artifact, b"new").unwrap();

        let dest_dir = TempDir::new().unwrap();
        let dest = dest_dir.path().join("final.mp4");
        std::fs::write(&dest, b"old").unwrap();

        ws.promote(&artifact, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
        assert!(!dest.with_extension("bak").exists());
    }

    #[test]
    fn promote_missing_artifact_fails() {
        let ws = Workspace::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let result = ws.promote(
            &ws.temp_file("missing.mp4"),
            &dest_dir.path().join("final.mp4"),
        );
        assert!(result.is_err());
    }
}
