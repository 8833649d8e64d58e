//! Scoped scratch-file guard
//!
//! One scratch file is created per tile/thumbnail IFD iteration to hold the
//! re-encoded level before it is read back and spliced or emitted wholesale.
//! The guard removes it on every exit path, including error unwinding.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

/// Owns a scratch file path and deletes it on drop
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Allocates a scratch file path under `dir` with a name unique to `label`
    /// and the given index. The file itself is created empty; callers write
    /// to it by path (the re-encoder opens it by name).
    pub fn new(dir: &Path, label: &str, index: usize) -> std::io::Result<Self> {
        let path = dir.join(format!(".redact-scratch-{}-{}-{}", label, index, std::process::id()));
        fs::File::create(&path)?;
        Ok(ScratchFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or_default()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("failed to remove scratch file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let dir = std::env::temp_dir();
        let path;
        {
            let scratch = ScratchFile::new(&dir, "test", 0).unwrap();
            path = scratch.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn scratch_file_survives_already_removed() {
        let dir = std::env::temp_dir();
        let scratch = ScratchFile::new(&dir, "test-gone", 1).unwrap();
        let path = scratch.path().to_path_buf();
        fs::remove_file(&path).unwrap();
        drop(scratch);
    }
}
