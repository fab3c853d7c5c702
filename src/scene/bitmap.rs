use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{PackError, PackResult};

/// Host-side bitmap extraction.
///
/// The compiler never reads the host library directly; it asks the exporter to write a
/// named bitmap into a scratch file and decodes that file.
pub trait BitmapExporter: Send + Sync {
    /// Write the encoded bitmap called `name` to `dest`.
    fn export(&self, name: &str, dest: &Path) -> PackResult<()>;
}

/// Exporter that resolves bitmap names as paths under a root directory.
#[derive(Clone, Debug)]
pub struct DirectoryExporter {
    root: PathBuf,
}

impl DirectoryExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BitmapExporter for DirectoryExporter {
    fn export(&self, name: &str, dest: &Path) -> PackResult<()> {
        let rel = Path::new(name);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(PackError::validation(format!(
                "bitmap name '{name}' must be a relative path without '..'"
            )));
        }
        let src = self.root.join(rel);
        std::fs::copy(&src, dest)
            .with_context(|| format!("copy bitmap '{}'", src.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/bitmap.rs"]
mod tests;
