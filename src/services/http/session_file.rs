use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

/// Keeps the session cookie between invocations of the CLI.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read session file: {}", self.path.display()))?;
        let contents = contents.trim();
        Ok((!contents.is_empty()).then(|| contents.to_string()))
    }

    /// Writes `cookies`, or removes the file when there is nothing to keep.
    pub fn save(&self, cookies: Option<&str>) -> Result<()> {
        match cookies {
            Some(cookies) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent).wrap_err_with(|| {
                        format!("Failed to create session directory: {}", parent.display())
                    })?;
                }
                std::fs::write(&self.path, cookies).wrap_err_with(|| {
                    format!("Failed to write session file: {}", self.path.display())
                })
            }
            None if self.path.exists() => std::fs::remove_file(&self.path).wrap_err_with(|| {
                format!("Failed to remove session file: {}", self.path.display())
            }),
            None => Ok(()),
        }
    }
}
