//! On-disk slot for the last analysed drawing
//!
//! A single file, overwritten on every successful analysis. Two sessions
//! sharing one slot would overwrite each other; give each session its own path.

use std::path::{Path, PathBuf};

use crate::Result;

/// Single mutable file holding the most recently analysed PNG
#[derive(Debug, Clone)]
pub struct ArtifactSlot {
    path: PathBuf,
}

impl ArtifactSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot, creating parent directories as needed
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub async fn store(&self, png: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, png).await?;
        tracing::debug!(path = %self.path.display(), bytes = png.len(), "artifact stored");
        Ok(())
    }

    /// Current slot contents, or `None` if nothing was stored yet
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub async fn load(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ArtifactSlot::new(dir.path().join("nested").join("sketch.png"));

        assert_eq!(slot.load().await.unwrap(), None);

        slot.store(b"first").await.unwrap();
        slot.store(b"second").await.unwrap();
        assert_eq!(slot.load().await.unwrap().as_deref(), Some(&b"second"[..]));
    }
}
