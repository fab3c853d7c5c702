use crate::foundation::core::{Affine, Point, PreparedImage, Rect, Rgba8};

/// Bitmap drawn as one textured quad.
#[derive(Clone, Debug, PartialEq)]
pub struct BitmapItem {
    pub image: PreparedImage,
    /// Maps bitmap pixel coordinates into symbol space.
    pub transform: Affine,
}

/// Solid-color polygons sharing one swatch.
#[derive(Clone, Debug, PartialEq)]
pub struct FilledItem {
    /// Direct contours or triangles (4 points, last repeated), in element space.
    pub polygons: Vec<Vec<Point>>,
    pub color: Rgba8,
    pub transform: Affine,
}

/// Bitmap with 9-slice guides.
#[derive(Clone, Debug, PartialEq)]
pub struct SlicedItem {
    pub image: PreparedImage,
    /// Inner guide rectangle in bitmap pixel coordinates.
    pub guides: Rect,
    /// Maps bitmap pixel coordinates into symbol space.
    pub transform: Affine,
}

/// One drawable produced from a shape element.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicItem {
    Bitmap(BitmapItem),
    Filled(FilledItem),
    Sliced(SlicedItem),
}

impl GraphicItem {
    pub fn transform(&self) -> Affine {
        match self {
            Self::Bitmap(b) => b.transform,
            Self::Filled(f) => f.transform,
            Self::Sliced(s) => s.transform,
        }
    }

    /// Image backing the item, if it is a bitmap or sliced bitmap.
    pub fn image(&self) -> Option<&PreparedImage> {
        match self {
            Self::Bitmap(b) => Some(&b.image),
            Self::Sliced(s) => Some(&s.image),
            Self::Filled(_) => None,
        }
    }
}

/// Ordered drawables of one shape symbol; order is draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphicGroup {
    pub symbol_id: u16,
    pub name: String,
    pub items: Vec<GraphicItem>,
}

impl GraphicGroup {
    pub fn new(symbol_id: u16, name: impl Into<String>) -> Self {
        Self {
            symbol_id,
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Compare drawable content only; ids and names are ignored.
    pub fn same_content(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
