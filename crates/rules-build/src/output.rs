/// Staged, all-or-nothing writing of generated documents.
///
/// Every document is first written to a temporary file in its destination
/// directory. Nothing is renamed into place until all of them are staged, so a
/// failed build never leaves a mix of fresh and stale outputs behind.
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::AppError;

#[derive(Default)]
pub struct StagedOutputs {
    staged: Vec<(PathBuf, NamedTempFile)>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` to a temporary file next to `path`.
    pub fn stage(&mut self, path: &Path, content: &str) -> Result<(), AppError> {
        let dir = path
            .parent()
            .ok_or_else(|| AppError::Config(format!("output path has no parent: {}", path.display())))?;
        std::fs::create_dir_all(dir).map_err(|e| AppError::output(dir, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| AppError::output(path, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| AppError::output(path, e))?;
        temp.flush().map_err(|e| AppError::output(path, e))?;

        debug!(path = %path.display(), bytes = content.len(), "staged output");
        self.staged.push((path.to_path_buf(), temp));
        Ok(())
    }

    /// Rename every staged file into place, returning the final paths.
    ///
    /// Dropping `StagedOutputs` without committing deletes the temporary files.
    pub fn commit(self) -> Result<Vec<PathBuf>, AppError> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (path, temp) in self.staged {
            temp.persist(&path)
                .map_err(|e| AppError::output(&path, e.error))?;
            written.push(path);
        }
        Ok(written)
    }
}
