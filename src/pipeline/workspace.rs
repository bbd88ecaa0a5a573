use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::errors::PipelineError;

/// A directory owned by one pipeline invocation.
///
/// Every workspace lives at `<base>/<uuid>`, so two invocations never write
/// to the same `.tex` or `.pdf` file.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the directory cannot be created.
    pub async fn create(base_dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let root = base_dir.as_ref().join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            PipelineError::Config(format!(
                "Failed to create work directory {}: {e}",
                root.display()
            ))
        })?;
        debug!(path = %root.display(), "Created workspace");
        Ok(Self { root })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Deletes the workspace and everything in it.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the directory cannot be removed.
    pub async fn remove(self) -> Result<(), PipelineError> {
        tokio::fs::remove_dir_all(&self.root).await.map_err(|e| {
            PipelineError::Config(format!(
                "Failed to remove work directory {}: {e}",
                self.root.display()
            ))
        })
    }
}
