use crate::foundation::core::{Point, PreparedImage, Rgba8};
use crate::graphic::item::{GraphicGroup, GraphicItem};

/// Packing request derived from one graphic item.
#[derive(Clone, Debug, PartialEq)]
pub enum AtlasItem {
    /// Bitmap pixels, tagged when the bitmap is 9-sliced.
    Image { image: PreparedImage, sliced: bool },
    /// 1x1 swatch of a solid fill; the polygons are kept for validation.
    Swatch {
        color: Rgba8,
        polygons: Vec<Vec<Point>>,
    },
}

impl AtlasItem {
    /// Build the request for `item`.
    pub fn from_graphic(item: &GraphicItem) -> Self {
        match item {
            GraphicItem::Bitmap(b) => Self::Image {
                image: b.image.clone(),
                sliced: false,
            },
            GraphicItem::Sliced(s) => Self::Image {
                image: s.image.clone(),
                sliced: true,
            },
            GraphicItem::Filled(f) => Self::Swatch {
                color: f.color,
                polygons: f.polygons.clone(),
            },
        }
    }

    pub fn is_sliced(&self) -> bool {
        matches!(self, Self::Image { sliced: true, .. })
    }
}

/// All groups flattened into one request list, with the owning group of every entry.
#[derive(Clone, Debug, Default)]
pub struct FlatItems {
    pub items: Vec<AtlasItem>,
    /// `owners[i]` is the index of the group that produced `items[i]`.
    pub owners: Vec<usize>,
}

impl FlatItems {
    /// Flatten `groups` in order; items keep their order inside each group.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a GraphicGroup>) -> Self {
        let mut out = Self::default();
        for (gi, group) in groups.into_iter().enumerate() {
            for item in &group.items {
                out.items.push(AtlasItem::from_graphic(item));
                out.owners.push(gi);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Group index owning the flat item `index`.
    pub fn owner_of(&self, index: usize) -> Option<usize> {
        self.owners.get(index).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/item.rs"]
mod tests;
