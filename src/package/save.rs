use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{PackError, PackResult};
use crate::package::codec::{
    Compression, TextureStorage, decode_package, decode_texture_file, encode_package,
    encode_texture_file,
};
use crate::package::model::{Package, Texture};
use crate::package::texture::{TextureEncoding, decode_texture, downscale_half, encode_texture};

/// Extension of package and sidecar files.
pub const PACKAGE_EXTENSION: &str = "sc";

/// Force the package extension onto `path`.
pub fn package_path(path: &Path) -> PathBuf {
    path.with_extension(PACKAGE_EXTENSION)
}

/// Sidecar file names derived from a package path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageLayout {
    pub main: PathBuf,
    /// Full-resolution texture sidecar.
    pub textures: PathBuf,
    /// Half-size texture sidecar.
    pub low_res_textures: PathBuf,
    dir: PathBuf,
    stem: String,
}

impl PackageLayout {
    pub fn new(main: &Path, pkg: &Package) -> Self {
        let main = package_path(main);
        let dir = main.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = main
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let f = &pkg.flags;
        let multi = if f.use_multi_resolution {
            f.multi_resolution_suffix.as_str()
        } else {
            ""
        };
        Self {
            textures: dir.join(format!("{stem}{multi}_tex.{PACKAGE_EXTENSION}")),
            low_res_textures: dir.join(format!(
                "{stem}{}_tex.{PACKAGE_EXTENSION}",
                f.low_resolution_suffix
            )),
            main,
            dir,
            stem,
        }
    }

    /// File name (relative to the package directory) of an external texture.
    pub fn texture_file_name(&self, index: usize) -> String {
        format!("{}_{index}.png", self.stem)
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Decide where each texture of `pkg` is stored.
///
/// Raw textures never go to standalone files, whatever the flags say.
pub fn plan_storage(pkg: &Package, layout: &PackageLayout) -> Vec<TextureStorage> {
    pkg.textures
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if pkg.flags.use_external_texture_files && t.encoding == TextureEncoding::Compressed {
                TextureStorage::File(layout.texture_file_name(i))
            } else if pkg.flags.use_external_texture {
                TextureStorage::Sidecar
            } else {
                TextureStorage::Inline
            }
        })
        .collect()
}

/// Write `pkg` to `path` (extension forced to `.sc`) plus whatever sidecars its flags ask for.
///
/// Every file is encoded first, written next to its destination, and only then renamed into
/// place.
#[tracing::instrument(level = "debug", skip(pkg), fields(textures = pkg.textures.len()))]
pub fn save_package(pkg: &Package, path: &Path, compression: Compression) -> PackResult<PathBuf> {
    let layout = PackageLayout::new(path, pkg);
    let storage = plan_storage(pkg, &layout);
    let mut staged = StagedFiles::default();

    staged.push(layout.main.clone(), encode_package(pkg, &storage, compression)?);

    let sidecar: Vec<Texture> = pkg
        .textures
        .iter()
        .zip(&storage)
        .filter(|(_, s)| **s == TextureStorage::Sidecar)
        .map(|(t, _)| t.clone())
        .collect();
    if !sidecar.is_empty() {
        staged.push(layout.textures.clone(), encode_texture_file(&sidecar, compression)?);
        if pkg.flags.use_low_resolution {
            let low: Vec<Texture> = sidecar
                .iter()
                .map(|t| {
                    let (width, height, rgba8_premul) =
                        downscale_half(t.width, t.height, &t.rgba8_premul);
                    Texture {
                        width,
                        height,
                        rgba8_premul,
                        ..t.clone()
                    }
                })
                .collect();
            staged.push(layout.low_res_textures.clone(), encode_texture_file(&low, compression)?);
        }
    }

    for (t, place) in pkg.textures.iter().zip(&storage) {
        if let TextureStorage::File(name) = place {
            let blob = encode_texture(t.width, t.height, &t.rgba8_premul, t.pixel_format, t.encoding)?;
            staged.push(layout.resolve(name), blob);
        }
    }

    staged.commit()?;
    tracing::debug!(path = %layout.main.display(), "package saved");
    Ok(layout.main)
}

/// Read a package written by [`save_package`], pulling texture pixels from sidecars and
/// external files.
#[tracing::instrument(level = "debug")]
pub fn load_package(path: &Path) -> PackResult<Package> {
    let bytes = std::fs::read(path)
        .map_err(|e| PackError::serialization(format!("read '{}': {e}", path.display())))?;
    let (mut pkg, storage) = decode_package(&bytes)?;
    let layout = PackageLayout::new(path, &pkg);

    let mut sidecar: Option<std::vec::IntoIter<Texture>> = None;
    for (t, place) in pkg.textures.iter_mut().zip(&storage) {
        match place {
            TextureStorage::Inline => {}
            TextureStorage::Sidecar => {
                if sidecar.is_none() {
                    let bytes = std::fs::read(&layout.textures).map_err(|e| {
                        PackError::serialization(format!(
                            "read texture sidecar '{}': {e}",
                            layout.textures.display()
                        ))
                    })?;
                    sidecar = Some(decode_texture_file(&bytes)?.into_iter());
                }
                let loaded = sidecar
                    .as_mut()
                    .and_then(|it| it.next())
                    .ok_or_else(|| PackError::decode("texture sidecar has fewer textures than the package"))?;
                if (loaded.width, loaded.height) != (t.width, t.height) {
                    return Err(PackError::decode("texture sidecar does not match package records"));
                }
                t.rgba8_premul = loaded.rgba8_premul;
            }
            TextureStorage::File(name) => {
                let file = layout.resolve(name);
                let blob = std::fs::read(&file).map_err(|e| {
                    PackError::serialization(format!("read texture file '{}': {e}", file.display()))
                })?;
                t.rgba8_premul = decode_texture(t.width, t.height, &blob, t.pixel_format, t.encoding)?;
            }
        }
    }
    Ok(pkg)
}

/// Files encoded in memory and written together.
#[derive(Default)]
struct StagedFiles {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl StagedFiles {
    fn push(&mut self, path: PathBuf, bytes: Vec<u8>) {
        self.files.push((path, bytes));
    }

    fn commit(self) -> PackResult<()> {
        let mut temps: Vec<(PathBuf, &Path)> = Vec::with_capacity(self.files.len());
        let result = (|| -> anyhow::Result<()> {
            for (path, bytes) in &self.files {
                let mut name = path.file_name().unwrap_or_default().to_os_string();
                name.push(".tmp");
                let tmp = path.with_file_name(name);
                std::fs::write(&tmp, bytes)
                    .with_context(|| format!("write '{}'", tmp.display()))?;
                temps.push((tmp, path.as_path()));
            }
            for (tmp, path) in &temps {
                std::fs::rename(tmp, path)
                    .with_context(|| format!("rename into '{}'", path.display()))?;
            }
            Ok(())
        })();

        if let Err(err) = result {
            for (tmp, _) in &temps {
                let _ = std::fs::remove_file(tmp);
            }
            return Err(PackError::serialization(format!("{err:#}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/package/save.rs"]
mod tests;
