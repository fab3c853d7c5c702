use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::assets::decode::decode_image;
use crate::foundation::core::PreparedImage;
use crate::foundation::error::{PackError, PackResult};
use crate::scene::bitmap::BitmapExporter;

/// Scratch file path that is removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve a unique path in the system temp directory. The file itself is created lazily
    /// by whoever writes to it.
    pub fn new(prefix: &str) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "{prefix}_{}_{n}.bin",
            std::process::id()
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(err) = std::fs::remove_file(&self.path)
        {
            tracing::warn!(path = %self.path.display(), %err, "failed to remove scratch file");
        }
    }
}

/// Decoded bitmaps keyed by library name.
///
/// Every distinct name is exported and decoded exactly once; later lookups share the pixels.
pub struct ImageCache {
    exporter: Arc<dyn BitmapExporter>,
    scratch: ScratchFile,
    images: HashMap<String, PreparedImage>,
}

impl ImageCache {
    pub fn new(exporter: Arc<dyn BitmapExporter>) -> Self {
        Self {
            exporter,
            scratch: ScratchFile::new("scpack_bitmap"),
            images: HashMap::new(),
        }
    }

    /// Return the decoded bitmap called `name`, extracting it on first use.
    pub fn get_or_load(&mut self, name: &str) -> PackResult<PreparedImage> {
        if let Some(img) = self.images.get(name) {
            return Ok(img.clone());
        }

        self.exporter.export(name, self.scratch.path())?;
        let bytes = std::fs::read(self.scratch.path())
            .with_context(|| format!("read exported bitmap '{name}'"))?;
        let img = decode_image(&bytes)
            .map_err(|e| PackError::decode(format!("bitmap '{name}': {e:#}")))?;
        tracing::debug!(name, width = img.width, height = img.height, "bitmap cached");
        self.images.insert(name.to_owned(), img.clone());
        Ok(img)
    }

    /// Already decoded bitmap, if any.
    pub fn get(&self, name: &str) -> Option<&PreparedImage> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
