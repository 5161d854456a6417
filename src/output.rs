//! Numbered output files
//!
//! Generated media lands in one flat directory (`Output/` by default). File names carry
//! the number of entries already present, e.g. `new_image3.jpg`, `video4.mp4`,
//! `out5.wav`, so successive saves never overwrite each other.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Output directory handle. Creation is lazy and idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if missing.
    pub fn ensure(&self) -> Result<&Path> {
        if !self.root.is_dir() {
            std::fs::create_dir_all(&self.root)?;
            debug!(path = %self.root.display(), "Created output directory");
        }
        Ok(&self.root)
    }

    /// Number of regular files currently in the directory.
    pub fn file_count(&self) -> Result<usize> {
        self.ensure()?;
        let mut count = 0;
        for entry in std::fs::read_dir(&self.root)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Next free path `{prefix}{n}.{extension}`.
    ///
    /// `n` starts at the current file count and skips names that already exist.
    pub fn next_path(&self, prefix: &str, extension: &str) -> Result<PathBuf> {
        let mut n = self.file_count()?;
        loop {
            let candidate = self.root.join(format!("{prefix}{n}.{extension}"));
            if !candidate.exists() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Write `bytes` to the next free `{prefix}{n}.{extension}` and return the path.
    pub fn write_next(&self, prefix: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.next_path(prefix, extension)?;
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Saved output file");
        Ok(path)
    }
}

impl Default for OutputDir {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_OUTPUT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::new(tmp.path().join("a").join("Output"));
        out.ensure().unwrap();
        out.ensure().unwrap();
        assert!(out.path().is_dir());
    }

    #[test]
    fn numbering_follows_file_count() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::new(tmp.path());
        let first = out.write_next("new_image", "jpg", b"1").unwrap();
        let second = out.write_next("new_image", "jpg", b"2").unwrap();
        let audio = out.next_path("out", "wav").unwrap();

        assert_eq!(first.file_name().unwrap(), "new_image0.jpg");
        assert_eq!(second.file_name().unwrap(), "new_image1.jpg");
        assert_eq!(audio.file_name().unwrap(), "out2.wav");
    }

    #[test]
    fn existing_names_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::new(tmp.path());
        std::fs::write(tmp.path().join("video1.mp4"), b"x").unwrap();
        // one file present, so numbering starts at 1, which is taken
        let path = out.next_path("video", "mp4").unwrap();
        assert_eq!(path.file_name().unwrap(), "video2.mp4");
    }

    #[test]
    fn subdirectories_are_not_counted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        let out = OutputDir::new(tmp.path());
        assert_eq!(out.file_count().unwrap(), 0);
    }
}
