use serde::{Deserialize, Serialize};

use crate::package::texture::{PixelFormat, TextureEncoding};
use crate::scene::model::{ColorTransform, ModifierKind, TextAlign};

/// Marker for "no matrix" / "no color transform" in frame elements.
pub const NO_TRANSFORM: u16 = u16::MAX;

/// Textured vertex of a draw command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

/// Triangle fan over one texture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub texture_index: u16,
    pub vertices: Vec<Vertex>,
}

/// Static shape: an ordered list of draw commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: u16,
    pub commands: Vec<DrawCommand>,
}

/// Child reference of a movie clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieClipChild {
    pub id: u16,
    pub blend: u8,
    pub name: Option<String>,
}

/// Child placement in a frame; matrix/color indices point into the clip's bank.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameElement {
    pub child_index: u16,
    pub matrix_index: u16,
    pub color_index: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieClipFrame {
    pub label: Option<String>,
    pub elements: Vec<FrameElement>,
}

/// Timeline record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieClip {
    pub id: u16,
    pub fps: u8,
    pub bank_index: u16,
    pub children: Vec<MovieClipChild>,
    pub frames: Vec<MovieClipFrame>,
    /// 9-slice grid as `[x0, y0, x1, y1]`.
    pub scaling_grid: Option<[f32; 4]>,
}

impl MovieClip {
    /// Placeholder clip with no children and no frames.
    pub fn empty(id: u16) -> Self {
        Self {
            id,
            fps: 24,
            bank_index: 0,
            children: Vec::new(),
            frames: Vec::new(),
            scaling_grid: None,
        }
    }
}

/// Mask modifier record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: u16,
    pub kind: ModifierKind,
}

/// Text field record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    pub id: u16,
    pub text: String,
    pub font_name: String,
    /// `0xRRGGBBAA`.
    pub font_color: u32,
    pub font_size: u16,
    pub align: TextAlign,
    /// `[left, top, right, bottom]`.
    pub bounds: [i16; 4],
    pub bold: bool,
    pub italic: bool,
    /// `0xRRGGBBAA` outline color.
    pub outline: Option<u32>,
    pub multiline: bool,
    pub device_font: bool,
    pub auto_kern: bool,
}

/// Shared pool of matrices and color transforms referenced by movie clip frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixBank {
    /// `[a, b, c, d, tx, ty]`.
    pub matrices: Vec<[f64; 6]>,
    pub color_transforms: Vec<ColorTransform>,
}

/// Atlas page.
///
/// Pixels are kept as premultiplied RGBA8 in memory; `pixel_format` and `encoding` only decide
/// how they are written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub encoding: TextureEncoding,
    #[serde(skip)]
    pub rgba8_premul: Vec<u8>,
}

/// Runtime-visible name of a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportName {
    pub id: u16,
    pub name: String,
}

/// Package-wide flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFlags {
    pub use_external_texture: bool,
    pub use_external_texture_files: bool,
    pub use_low_resolution: bool,
    pub use_multi_resolution: bool,
    pub low_resolution_suffix: String,
    pub multi_resolution_suffix: String,
    pub use_precision_matrix: bool,
    pub save_custom_property: bool,
}

/// Compiled asset package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub movieclips: Vec<MovieClip>,
    pub modifiers: Vec<Modifier>,
    pub textfields: Vec<TextField>,
    pub shapes: Vec<Shape>,
    pub textures: Vec<Texture>,
    pub matrix_banks: Vec<MatrixBank>,
    pub exports: Vec<ExportName>,
    pub flags: PackageFlags,
}

impl Package {
    /// Every record id, in record-kind order.
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.movieclips
            .iter()
            .map(|m| m.id)
            .chain(self.modifiers.iter().map(|m| m.id))
            .chain(self.textfields.iter().map(|t| t.id))
            .chain(self.shapes.iter().map(|s| s.id))
    }

    pub fn max_id(&self) -> Option<u16> {
        self.ids().max()
    }

    pub fn record_count(&self) -> usize {
        self.movieclips.len() + self.modifiers.len() + self.textfields.len() + self.shapes.len()
    }

    pub fn shape(&self, id: u16) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/package/model.rs"]
mod tests;
