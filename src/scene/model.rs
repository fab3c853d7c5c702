use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{PackError, PackResult};

/// One segment of a filled contour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    /// Straight line.
    Line {
        /// Segment start.
        from: Point,
        /// Segment end.
        to: Point,
    },
    /// Quadratic Bezier curve.
    Quad {
        /// Segment start.
        from: Point,
        /// Control point.
        ctrl: Point,
        /// Segment end.
        to: Point,
    },
    /// Cubic Bezier curve.
    Cubic {
        /// Segment start.
        from: Point,
        /// First control point.
        ctrl1: Point,
        /// Second control point.
        ctrl2: Point,
        /// Segment end.
        to: Point,
    },
}

impl PathSegment {
    /// Start point of the segment.
    pub fn start(&self) -> Point {
        match self {
            Self::Line { from, .. } | Self::Quad { from, .. } | Self::Cubic { from, .. } => *from,
        }
    }

    /// End point of the segment.
    pub fn end(&self) -> Point {
        match self {
            Self::Line { to, .. } | Self::Quad { to, .. } | Self::Cubic { to, .. } => *to,
        }
    }

    /// Return `true` for straight segments.
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Line { .. })
    }
}

/// Closed ring of segments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    /// Ordered segments; the last segment ends where the first begins.
    pub segments: Vec<PathSegment>,
}

impl Contour {
    /// Build a linear ring through `points` (closing edge implied).
    pub fn polygon(points: &[Point]) -> Self {
        let n = points.len();
        let segments = (0..n)
            .map(|i| PathSegment::Line {
                from: points[i],
                to: points[(i + 1) % n],
            })
            .collect();
        Self { segments }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Return `true` when the ring has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return `true` when every segment is a straight line.
    pub fn is_linear(&self) -> bool {
        self.segments.iter().all(PathSegment::is_linear)
    }

    /// Ring vertices: the start point of every segment.
    ///
    /// Control points are ignored, so this is only a faithful outline for linear rings.
    pub fn vertices(&self) -> Vec<Point> {
        self.segments.iter().map(PathSegment::start).collect()
    }

    /// Convert into a closed Bezier path with every point mapped through `map`.
    pub fn to_bez_path(&self, map: impl Fn(Point) -> Point) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.segments.first() else {
            return path;
        };
        path.move_to(map(first.start()));
        for seg in &self.segments {
            match *seg {
                PathSegment::Line { to, .. } => path.line_to(map(to)),
                PathSegment::Quad { ctrl, to, .. } => path.quad_to(map(ctrl), map(to)),
                PathSegment::Cubic {
                    ctrl1, ctrl2, to, ..
                } => path.curve_to(map(ctrl1), map(ctrl2), map(to)),
            }
        }
        path.close_path();
        path
    }
}

/// Fill descriptor of a region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fill {
    /// Uniform color.
    Solid {
        /// Straight-alpha fill color.
        color: Rgba8,
    },
    /// Any fill the pipeline does not understand yet (gradients, bitmap fills).
    Unsupported {
        /// Host-side name of the fill type, kept for diagnostics.
        #[serde(default)]
        name: String,
    },
}

impl Fill {
    /// Solid color when this is a solid fill.
    pub fn solid_color(&self) -> Option<Rgba8> {
        match self {
            Self::Solid { color } => Some(*color),
            Self::Unsupported { .. } => None,
        }
    }
}

/// Filled area: an outer contour, optional holes, and a fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilledRegion {
    /// Outer ring.
    pub contour: Contour,
    /// Rings cut out of the outer ring.
    #[serde(default)]
    pub holes: Vec<Contour>,
    /// Fill paint.
    pub fill: Fill,
}

impl FilledRegion {
    /// Solid region without holes.
    pub fn solid(contour: Contour, color: Rgba8) -> Self {
        Self {
            contour,
            holes: Vec::new(),
            fill: Fill::Solid { color },
        }
    }

    /// Bounding box over all rings (control points included), after mapping with `map`.
    pub fn bounds(&self, map: impl Fn(Point) -> Point + Copy) -> Option<Rect> {
        let mut out: Option<Rect> = None;
        let mut add = |p: Point| {
            let p = map(p);
            out = Some(match out {
                None => Rect::from_points(p, p),
                Some(r) => r.union_pt(p),
            });
        };
        for ring in std::iter::once(&self.contour).chain(self.holes.iter()) {
            for seg in &ring.segments {
                match *seg {
                    PathSegment::Line { from, to } => {
                        add(from);
                        add(to);
                    }
                    PathSegment::Quad { from, ctrl, to } => {
                        add(from);
                        add(ctrl);
                        add(to);
                    }
                    PathSegment::Cubic {
                        from,
                        ctrl1,
                        ctrl2,
                        to,
                    } => {
                        add(from);
                        add(ctrl1);
                        add(ctrl2);
                        add(to);
                    }
                }
            }
        }
        out
    }
}

/// Vector shape element: fill regions and pre-expanded stroke regions sharing one transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilledElement {
    /// Fill regions in draw order.
    #[serde(default)]
    pub fills: Vec<FilledRegion>,
    /// Stroke outlines, already expanded into filled regions by the host.
    #[serde(default)]
    pub strokes: Vec<FilledRegion>,
    /// Element-to-symbol transform.
    #[serde(default)]
    pub transform: Affine,
}

/// Bitmap placed inside a shape symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BitmapElement {
    /// Library name of the bitmap; also the cache key for extraction.
    pub name: String,
    /// Element-to-symbol transform.
    #[serde(default)]
    pub transform: Affine,
}

/// 9-slice container: vector children scaled through a guide grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slice9Element {
    /// Inner guide rectangle in element space.
    pub guides: Rect,
    /// Vector children (bitmaps and nested symbols are ignored).
    #[serde(default)]
    pub elements: Vec<FilledElement>,
    /// Element-to-symbol transform.
    #[serde(default)]
    pub transform: Affine,
}

/// Drawable element of a shape symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeElement {
    /// Bitmap instance.
    Bitmap(BitmapElement),
    /// Vector fills and strokes.
    Filled(FilledElement),
    /// 9-slice scaled vector group.
    Sliced(Slice9Element),
}

/// Static graphic symbol compiled into a single package shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeSymbol {
    /// Package-local id.
    pub id: u16,
    /// Library name, used in diagnostics.
    pub name: String,
    /// Emit a placeholder record even when no element produced geometry.
    #[serde(default)]
    pub required: bool,
    /// Elements in draw order.
    #[serde(default)]
    pub elements: Vec<ShapeElement>,
}

/// Multiplicative and additive color adjustment of a frame element.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorTransform {
    /// Red multiplier.
    pub r_mul: f32,
    /// Green multiplier.
    pub g_mul: f32,
    /// Blue multiplier.
    pub b_mul: f32,
    /// Alpha multiplier.
    pub a_mul: f32,
    /// Red offset.
    pub r_add: i16,
    /// Green offset.
    pub g_add: i16,
    /// Blue offset.
    pub b_add: i16,
    /// Alpha offset.
    pub a_add: i16,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self {
            r_mul: 1.0,
            g_mul: 1.0,
            b_mul: 1.0,
            a_mul: 1.0,
            r_add: 0,
            g_add: 0,
            b_add: 0,
            a_add: 0,
        }
    }
}

/// Child symbol referenced by a movie clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildDesc {
    /// Referenced symbol id.
    pub id: u16,
    /// Blend mode index understood by the runtime.
    #[serde(default)]
    pub blend: u8,
    /// Instance name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One placed child in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameElementDesc {
    /// Index into the movie clip's `children`.
    pub child: u16,
    /// Instance transform; `None` means identity.
    #[serde(default)]
    pub matrix: Option<Affine>,
    /// Instance color transform; `None` means identity.
    #[serde(default)]
    pub color: Option<ColorTransform>,
}

/// One timeline frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDesc {
    /// Frame label.
    #[serde(default)]
    pub label: Option<String>,
    /// Placed children, bottom to top.
    #[serde(default)]
    pub elements: Vec<FrameElementDesc>,
}

/// Timeline symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieClipSymbol {
    /// Package-local id.
    pub id: u16,
    /// Library name.
    pub name: String,
    /// Playback rate.
    #[serde(default = "default_fps")]
    pub fps: u8,
    /// Child symbols.
    #[serde(default)]
    pub children: Vec<ChildDesc>,
    /// Timeline frames.
    #[serde(default)]
    pub frames: Vec<FrameDesc>,
    /// Export name under which the runtime can instantiate this clip.
    #[serde(default)]
    pub export_name: Option<String>,
    /// 9-slice scaling grid.
    #[serde(default)]
    pub scaling_grid: Option<Rect>,
}

fn default_fps() -> u8 {
    24
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Right aligned.
    Right,
    /// Centered.
    Center,
    /// Justified.
    Justify,
}

/// Classic text field extracted by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextFieldSymbol {
    /// Package-local id.
    pub id: u16,
    /// Text content.
    #[serde(default)]
    pub text: String,
    /// Font family name.
    pub font_name: String,
    /// Text color.
    pub font_color: Rgba8,
    /// Font size in points.
    pub font_size: u16,
    /// Paragraph alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Field bounds in symbol space.
    pub bounds: Rect,
    /// Bold face.
    #[serde(default)]
    pub bold: bool,
    /// Italic face.
    #[serde(default)]
    pub italic: bool,
    /// Glow outline color when outlined.
    #[serde(default)]
    pub outline: Option<Rgba8>,
    /// Multi-line field.
    #[serde(default)]
    pub multiline: bool,
    /// Render with device fonts instead of embedded outlines.
    #[serde(default)]
    pub device_font: bool,
    /// Kerning enabled.
    #[serde(default)]
    pub auto_kern: bool,
}

/// Mask role of a layer boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Following children form the mask.
    Mask,
    /// Following children are masked.
    Masked,
    /// End of masked children.
    Unmasked,
}

/// Mask modifier record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierSymbol {
    /// Package-local id.
    pub id: u16,
    /// Modifier role.
    pub kind: ModifierKind,
}

/// Any symbol the host can hand to the compiler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "symbol", rename_all = "snake_case")]
pub enum SymbolDesc {
    /// Static graphic.
    Shape(ShapeSymbol),
    /// Timeline.
    MovieClip(MovieClipSymbol),
    /// Text field.
    TextField(TextFieldSymbol),
    /// Mask modifier.
    Modifier(ModifierSymbol),
}

impl SymbolDesc {
    /// Package-local id of the symbol.
    pub fn id(&self) -> u16 {
        match self {
            Self::Shape(s) => s.id,
            Self::MovieClip(s) => s.id,
            Self::TextField(s) => s.id,
            Self::Modifier(s) => s.id,
        }
    }
}

/// Flattened scene handed over by the host, symbols in export order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Symbols in export order.
    #[serde(default)]
    pub symbols: Vec<SymbolDesc>,
}

impl Scene {
    /// Parse and validate a JSON scene document.
    pub fn from_json_reader(reader: impl std::io::Read) -> PackResult<Self> {
        let scene: Self = serde_json::from_reader(reader)
            .map_err(|e| PackError::validation(format!("parse scene json: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_json_path(path: &std::path::Path) -> PackResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            PackError::validation(format!("open scene json '{}': {e}", path.display()))
        })?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    /// Reject scenes whose symbol ids collide.
    pub fn validate(&self) -> PackResult<()> {
        let mut seen = std::collections::HashSet::new();
        for s in &self.symbols {
            if !seen.insert(s.id()) {
                return Err(PackError::validation(format!(
                    "duplicate symbol id {} in scene",
                    s.id()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
