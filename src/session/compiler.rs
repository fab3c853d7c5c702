use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::cache::ImageCache;
use crate::atlas::emit::emit_shapes;
use crate::atlas::item::FlatItems;
use crate::atlas::packer::{PackFailure, pack_atlas};
use crate::foundation::error::{PackError, PackResult};
use crate::graphic::builder::{BitmapTable, build_group, referenced_bitmaps};
use crate::graphic::hash::{GroupDigest, digest_group};
use crate::graphic::item::GraphicGroup;
use crate::package::merge::merge_packages;
use crate::package::model::{
    ExportName, FrameElement, MatrixBank, Modifier, MovieClip, MovieClipChild, MovieClipFrame,
    NO_TRANSFORM, Package, Shape, TextField, Texture,
};
use crate::package::save::{load_package, save_package};
use crate::scene::bitmap::BitmapExporter;
use crate::scene::model::{
    ColorTransform, ModifierSymbol, MovieClipSymbol, Scene, ShapeSymbol, SymbolDesc,
    TextFieldSymbol,
};
use crate::session::config::CompileConfig;

/// What happened to a shape symbol handed to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeOutcome {
    /// New content; its items join the atlas.
    Added,
    /// Same content as the shape `of`; draw commands are shared.
    Reused { of: u16 },
    /// No drawable content, but the symbol is required: an empty movie clip stands in.
    Placeholder,
    /// No drawable content; nothing is written.
    Dropped,
}

/// Summary of a finished export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileReport {
    pub output: PathBuf,
    pub shapes: usize,
    pub reused_shapes: usize,
    pub atlas_items: usize,
    pub textures: usize,
}

struct PendingShape {
    id: u16,
    group: usize,
}

/// Deduplicating builder for the matrix bank shared by movie clips.
#[derive(Default)]
struct BankBuilder {
    done: Vec<MatrixBank>,
    current: MatrixBank,
    matrices: HashMap<[u64; 6], u16>,
    colors: HashMap<[u32; 8], u16>,
}

impl BankBuilder {
    /// Largest index usable before [`NO_TRANSFORM`].
    const CAPACITY: usize = NO_TRANSFORM as usize;

    /// Make room for `matrices` and `colors` new entries, opening a new bank if needed.
    fn reserve(&mut self, matrices: usize, colors: usize) -> PackResult<u16> {
        if matrices > Self::CAPACITY || colors > Self::CAPACITY {
            return Err(PackError::validation(
                "movie clip needs more transforms than one matrix bank can hold",
            ));
        }
        if self.current.matrices.len() + matrices > Self::CAPACITY
            || self.current.color_transforms.len() + colors > Self::CAPACITY
        {
            self.done.push(std::mem::take(&mut self.current));
            self.matrices.clear();
            self.colors.clear();
        }
        u16::try_from(self.done.len()).map_err(|_| PackError::validation("matrix bank count exceeds u16"))
    }

    fn matrix(&mut self, coeffs: [f64; 6]) -> u16 {
        let key = coeffs.map(f64::to_bits);
        *self.matrices.entry(key).or_insert_with(|| {
            self.current.matrices.push(coeffs);
            (self.current.matrices.len() - 1) as u16
        })
    }

    fn color(&mut self, c: ColorTransform) -> u16 {
        let key = [
            c.r_mul.to_bits(),
            c.g_mul.to_bits(),
            c.b_mul.to_bits(),
            c.a_mul.to_bits(),
            c.r_add as u32,
            c.g_add as u32,
            c.b_add as u32,
            c.a_add as u32,
        ];
        *self.colors.entry(key).or_insert_with(|| {
            self.current.color_transforms.push(c);
            (self.current.color_transforms.len() - 1) as u16
        })
    }

    /// Close the open bank. `needed` keeps an empty bank 0 for clips without transforms.
    fn finish(mut self, needed: bool) -> Vec<MatrixBank> {
        let current = std::mem::take(&mut self.current);
        let filled = !current.matrices.is_empty() || !current.color_transforms.is_empty();
        if filled || (needed && self.done.is_empty()) {
            self.done.push(current);
        }
        self.done
    }
}

/// One export job: owns configuration, the bitmap cache and the package under construction.
pub struct CompileSession {
    config: CompileConfig,
    images: ImageCache,
    package: Package,
    groups: Vec<GraphicGroup>,
    digests: HashMap<GroupDigest, Vec<usize>>,
    shapes: Vec<PendingShape>,
    reused: usize,
    banks: BankBuilder,
}

impl CompileSession {
    /// Start a job. A configured merge target must already exist.
    pub fn new(config: CompileConfig, exporter: Arc<dyn BitmapExporter>) -> PackResult<Self> {
        config.validate()?;
        if let Some(path) = &config.merge_with
            && !path.is_file()
        {
            return Err(PackError::precondition(format!(
                "merge target '{}' does not exist",
                path.display()
            )));
        }
        Ok(Self {
            config,
            images: ImageCache::new(exporter),
            package: Package::default(),
            groups: Vec::new(),
            digests: HashMap::new(),
            shapes: Vec::new(),
            reused: 0,
            banks: BankBuilder::default(),
        })
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Add every symbol of `scene` in order.
    ///
    /// Bitmaps are extracted up front on this thread; shape groups are then built on a rayon
    /// pool when the configuration asks for it.
    #[tracing::instrument(level = "debug", skip_all, fields(symbols = scene.symbols.len()))]
    pub fn add_scene(&mut self, scene: &Scene) -> PackResult<()> {
        scene.validate()?;
        let shapes: Vec<&ShapeSymbol> = scene
            .symbols
            .iter()
            .filter_map(|s| match s {
                SymbolDesc::Shape(shape) => Some(shape),
                _ => None,
            })
            .collect();
        let table = self.extract_bitmaps(shapes.iter().copied())?;

        let built: Vec<GraphicGroup> = if self.config.parallel {
            let pool = build_thread_pool(self.config.threads)?;
            pool.install(|| {
                shapes
                    .par_iter()
                    .map(|s| build_group(s, &table))
                    .collect::<PackResult<Vec<_>>>()
            })?
        } else {
            shapes
                .iter()
                .map(|s| build_group(s, &table))
                .collect::<PackResult<Vec<_>>>()?
        };

        let mut built = built.into_iter();
        for symbol in &scene.symbols {
            match symbol {
                SymbolDesc::Shape(shape) => {
                    let group = built
                        .next()
                        .ok_or_else(|| PackError::validation("shape group count mismatch"))?;
                    self.add_shape_group(shape, group);
                }
                SymbolDesc::MovieClip(clip) => self.add_movieclip(clip)?,
                SymbolDesc::TextField(tf) => self.add_text_field(tf)?,
                SymbolDesc::Modifier(m) => self.add_modifier(m),
            }
        }
        Ok(())
    }

    /// Build and register one shape symbol.
    pub fn add_shape(&mut self, symbol: &ShapeSymbol) -> PackResult<ShapeOutcome> {
        let table = self.extract_bitmaps(std::iter::once(symbol))?;
        let group = build_group(symbol, &table)?;
        Ok(self.add_shape_group(symbol, group))
    }

    fn extract_bitmaps<'a>(
        &mut self,
        symbols: impl Iterator<Item = &'a ShapeSymbol>,
    ) -> PackResult<BitmapTable> {
        let mut table = BitmapTable::new();
        for symbol in symbols {
            for name in referenced_bitmaps(symbol) {
                if !table.contains_key(name) {
                    table.insert(name.to_owned(), self.images.get_or_load(name)?);
                }
            }
        }
        Ok(table)
    }

    fn add_shape_group(&mut self, symbol: &ShapeSymbol, group: GraphicGroup) -> ShapeOutcome {
        if group.is_empty() {
            if symbol.required {
                self.package.movieclips.push(MovieClip::empty(symbol.id));
                return ShapeOutcome::Placeholder;
            }
            tracing::debug!(id = symbol.id, name = %symbol.name, "empty shape dropped");
            return ShapeOutcome::Dropped;
        }

        let digest = digest_group(&group);
        let candidates = self.digests.entry(digest).or_default();
        if let Some(&existing) = candidates
            .iter()
            .find(|&&i| self.groups[i].same_content(&group))
        {
            self.shapes.push(PendingShape {
                id: symbol.id,
                group: existing,
            });
            self.reused += 1;
            return ShapeOutcome::Reused {
                of: self.groups[existing].symbol_id,
            };
        }

        candidates.push(self.groups.len());
        self.shapes.push(PendingShape {
            id: symbol.id,
            group: self.groups.len(),
        });
        self.groups.push(group);
        ShapeOutcome::Added
    }

    /// Register a timeline; its transforms go to the shared matrix bank.
    pub fn add_movieclip(&mut self, clip: &MovieClipSymbol) -> PackResult<()> {
        let elements = clip.frames.iter().flat_map(|f| &f.elements);
        let matrices = elements.clone().filter(|e| e.matrix.is_some()).count();
        let colors = elements.filter(|e| e.color.is_some()).count();
        let bank_index = self.banks.reserve(matrices, colors)?;

        let mut frames = Vec::with_capacity(clip.frames.len());
        for frame in &clip.frames {
            let mut out = MovieClipFrame {
                label: frame.label.clone(),
                elements: Vec::with_capacity(frame.elements.len()),
            };
            for e in &frame.elements {
                if usize::from(e.child) >= clip.children.len() {
                    return Err(PackError::validation(format!(
                        "movie clip '{}' frame references child {} of {}",
                        clip.name,
                        e.child,
                        clip.children.len()
                    )));
                }
                out.elements.push(FrameElement {
                    child_index: e.child,
                    matrix_index: e.matrix.map_or(NO_TRANSFORM, |m| self.banks.matrix(m.as_coeffs())),
                    color_index: e.color.map_or(NO_TRANSFORM, |c| self.banks.color(c)),
                });
            }
            frames.push(out);
        }

        self.package.movieclips.push(MovieClip {
            id: clip.id,
            fps: clip.fps,
            bank_index,
            children: clip
                .children
                .iter()
                .map(|c| MovieClipChild {
                    id: c.id,
                    blend: c.blend,
                    name: c.name.clone(),
                })
                .collect(),
            frames,
            scaling_grid: clip
                .scaling_grid
                .map(|g| [g.x0 as f32, g.y0 as f32, g.x1 as f32, g.y1 as f32]),
        });
        if let Some(name) = &clip.export_name {
            self.package.exports.push(ExportName {
                id: clip.id,
                name: name.clone(),
            });
        }
        Ok(())
    }

    /// Register a text field. Backward-compatible output never enables kerning.
    pub fn add_text_field(&mut self, tf: &TextFieldSymbol) -> PackResult<()> {
        let edge = |v: f64| -> PackResult<i16> {
            let v = v.floor();
            if v < f64::from(i16::MIN) || v > f64::from(i16::MAX) || !v.is_finite() {
                return Err(PackError::validation(format!(
                    "text field {} bound {v} does not fit i16",
                    tf.id
                )));
            }
            Ok(v as i16)
        };
        self.package.textfields.push(TextField {
            id: tf.id,
            text: tf.text.clone(),
            font_name: tf.font_name.clone(),
            font_color: tf.font_color.to_u32(),
            font_size: tf.font_size,
            align: tf.align,
            bounds: [
                edge(tf.bounds.x0)?,
                edge(tf.bounds.y0)?,
                edge(tf.bounds.x1)?,
                edge(tf.bounds.y1)?,
            ],
            bold: tf.bold,
            italic: tf.italic,
            outline: tf.outline.map(|c| c.to_u32()),
            multiline: tf.multiline,
            device_font: tf.device_font,
            auto_kern: tf.auto_kern && !self.config.backward_compatibility,
        });
        Ok(())
    }

    pub fn add_modifier(&mut self, m: &ModifierSymbol) {
        self.package.modifiers.push(Modifier {
            id: m.id,
            kind: m.kind,
        });
    }

    /// Pack, emit and merge, returning the package that would be saved.
    ///
    /// `progress` receives `(done, total)` atlas item counts.
    #[tracing::instrument(level = "debug", skip_all, fields(groups = self.groups.len()))]
    pub fn build_package(
        mut self,
        progress: &mut dyn FnMut(usize, usize),
    ) -> PackResult<(Package, CompileReport)> {
        let flat = FlatItems::from_groups(&self.groups);
        let total = flat.len();
        let packed = pack_atlas(&flat.items, &self.config.atlas_config(), &mut |done| {
            progress(done, total)
        })
        .map_err(|f| self.packaging_error(&flat, f))?;

        let settings = self.config.texture_settings();
        let texture_count = packed.textures.len();
        let emitted = emit_shapes(&self.groups, &packed, 0)?;
        for pending in &self.shapes {
            self.package.shapes.push(Shape {
                id: pending.id,
                commands: emitted[pending.group].commands.clone(),
            });
        }
        self.package.textures = packed
            .textures
            .into_iter()
            .map(|t| Texture {
                width: t.width,
                height: t.height,
                pixel_format: settings.pixel_format,
                encoding: settings.encoding,
                rgba8_premul: t.rgba8_premul,
            })
            .collect();
        let needs_bank = !self.package.movieclips.is_empty();
        self.package.matrix_banks = std::mem::take(&mut self.banks).finish(needs_bank);
        self.package.flags = self.config.package_flags();
        tracing::debug!(
            shapes = self.package.shapes.len(),
            textures = texture_count,
            "fresh package assembled"
        );

        let package = match &self.config.merge_with {
            Some(path) => {
                let existing = load_package(path)?;
                merge_packages(existing, self.package, settings.pixel_format, settings.encoding)?
            }
            None => self.package,
        };

        let report = CompileReport {
            output: self.config.save_options().output,
            shapes: self.shapes.len(),
            reused_shapes: self.reused,
            atlas_items: total,
            textures: texture_count,
        };
        Ok((package, report))
    }

    /// Run the remaining stages and write the package.
    pub fn finalize(self, progress: &mut dyn FnMut(usize, usize)) -> PackResult<CompileReport> {
        let save = self.config.save_options();
        let (package, mut report) = self.build_package(progress)?;
        report.output = save_package(&package, &save.output, save.compression)?;
        tracing::info!(
            output = %report.output.display(),
            shapes = report.shapes,
            textures = report.textures,
            "package written"
        );
        Ok(report)
    }

    fn packaging_error(&self, flat: &FlatItems, failure: PackFailure) -> PackError {
        let symbol = failure
            .index
            .and_then(|i| flat.owner_of(i))
            .and_then(|g| self.groups.get(g))
            .map(|g| g.name.clone());
        PackError::packaging(failure.reason, symbol)
    }
}

/// Compile `scene` with `config` and write the package.
pub fn compile_scene(
    scene: &Scene,
    config: CompileConfig,
    exporter: Arc<dyn BitmapExporter>,
    progress: &mut dyn FnMut(usize, usize),
) -> PackResult<CompileReport> {
    let mut session = CompileSession::new(config, exporter)?;
    session.add_scene(scene)?;
    session.finalize(progress)
}

fn build_thread_pool(threads: Option<usize>) -> PackResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PackError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PackError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/compiler.rs"]
mod tests;
