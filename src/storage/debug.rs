use anyhow::{Result, Context};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the output dir that holds page dumps
pub const DEBUG_DIR: &str = "debug";

/// Relative path of the markup dump for a 1-based input index
pub fn artifact_path(index: usize) -> String {
    format!("{}/page_{}.html", DEBUG_DIR, index)
}

/// Persists captured page markup for post-hoc inspection
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store the markup captured for the input at `index`
    async fn save_markup(&self, index: usize, markup: &str) -> Result<PathBuf>;
}

/// Writes dumps as `page_<index>.html` files
pub struct FilesystemArtifactStore {
    dir: PathBuf,
}

impl FilesystemArtifactStore {
    /// Create the store, making the directory if needed
    pub fn create(output_dir: &Path) -> Result<Self> {
        let dir = output_dir.join(DEBUG_DIR);
        std::fs::create_dir_all(&dir)
            .context(format!("Failed to create debug directory: {}", dir.display()))?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn save_markup(&self, index: usize, markup: &str) -> Result<PathBuf> {
        let path = self.dir.join(format!("page_{}.html", index));

        tokio::fs::write(&path, markup).await
            .context(format!("Failed to write debug artifact: {}", path.display()))?;

        debug!("Saved page markup to: {}", path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_markup_written_by_index() {
        let output = std::env::temp_dir().join(format!("profile-scraper-debug-{}", std::process::id()));
        let store = FilesystemArtifactStore::create(&output).unwrap();

        let path = store.save_markup(7, "<html>first</html>").await.unwrap();
        assert!(path.ends_with(artifact_path(7)));

        // A retry of the same index replaces the earlier dump
        store.save_markup(7, "<html>retry</html>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>retry</html>");

        std::fs::remove_dir_all(&output).unwrap();
    }
}
