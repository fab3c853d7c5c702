use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::atlas::packer::AtlasConfig;
use crate::foundation::error::{PackError, PackResult};
use crate::package::codec::Compression;
use crate::package::model::PackageFlags;
use crate::package::save::package_path;
use crate::package::texture::{PixelFormat, TextureEncoding, TextureQuality};

/// Export job configuration, read once and never mutated by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Package destination; the extension is always replaced by `.sc`.
    pub output: PathBuf,
    /// Existing package to merge the fresh one into.
    pub merge_with: Option<PathBuf>,

    pub atlas: AtlasConfig,
    pub texture_quality: TextureQuality,
    pub texture_encoding: TextureEncoding,
    pub compression: Compression,

    pub use_external_texture: bool,
    /// Only honored for compressed textures.
    pub use_external_texture_files: bool,
    pub use_low_resolution: bool,
    pub low_resolution_suffix: String,
    pub use_multi_resolution: bool,
    pub multi_resolution_suffix: String,
    pub use_precision_matrix: bool,
    pub save_custom_property: bool,
    /// Older runtimes: text fields are written without kerning.
    pub backward_compatibility: bool,

    /// Build shape groups on a rayon pool.
    pub parallel: bool,
    /// Worker count for `parallel`; `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("out.sc"),
            merge_with: None,
            atlas: AtlasConfig::default(),
            texture_quality: TextureQuality::Highest,
            texture_encoding: TextureEncoding::Raw,
            compression: Compression::Zlib,
            use_external_texture: false,
            use_external_texture_files: false,
            use_low_resolution: false,
            low_resolution_suffix: "_lowres".to_owned(),
            use_multi_resolution: false,
            multi_resolution_suffix: "_highres".to_owned(),
            use_precision_matrix: false,
            save_custom_property: false,
            backward_compatibility: false,
            parallel: false,
            threads: None,
        }
    }
}

/// Texture format decisions derived from the quality tier and encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSettings {
    pub pixel_format: PixelFormat,
    pub encoding: TextureEncoding,
}

/// Serializer inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOptions {
    pub output: PathBuf,
    pub compression: Compression,
}

impl CompileConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_reader(reader: impl std::io::Read) -> PackResult<Self> {
        let cfg: Self = serde_json::from_reader(reader).context("parse config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_path(path: &Path) -> PackResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    pub fn validate(&self) -> PackResult<()> {
        let a = &self.atlas;
        if a.max_width == 0 || a.max_height == 0 {
            return Err(PackError::validation("atlas max size must be non-zero"));
        }
        if !a.scale_factor.is_finite() || a.scale_factor <= 0.0 {
            return Err(PackError::validation("atlas scale factor must be finite and > 0"));
        }
        if self.threads == Some(0) {
            return Err(PackError::validation("'threads' must be >= 1 when set"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(PackError::validation("output path must be set"));
        }
        Ok(())
    }

    pub fn atlas_config(&self) -> AtlasConfig {
        self.atlas
    }

    pub fn texture_settings(&self) -> TextureSettings {
        TextureSettings {
            pixel_format: self.texture_quality.pixel_format(),
            encoding: self.texture_encoding,
        }
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            output: package_path(&self.output),
            compression: self.compression,
        }
    }

    /// Package flags; raw textures force external texture files off.
    pub fn package_flags(&self) -> PackageFlags {
        PackageFlags {
            use_external_texture: self.use_external_texture,
            use_external_texture_files: match self.texture_encoding {
                TextureEncoding::Raw => false,
                TextureEncoding::Compressed => self.use_external_texture_files,
            },
            use_low_resolution: self.use_low_resolution,
            use_multi_resolution: self.use_multi_resolution,
            low_resolution_suffix: self.low_resolution_suffix.clone(),
            multi_resolution_suffix: self.multi_resolution_suffix.clone(),
            use_precision_matrix: self.use_precision_matrix,
            save_custom_property: self.save_custom_property,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
