use std::collections::HashMap;

use crate::foundation::core::{Affine, Point, PreparedImage};
use crate::foundation::error::{PackError, PackResult};
use crate::geometry::classify::{RegionStrategy, classify_region};
use crate::geometry::triangulate::{triangle_polygon, triangulate};
use crate::graphic::item::{BitmapItem, FilledItem, GraphicGroup, GraphicItem, SlicedItem};
use crate::raster::composite::{SLICE9_RESOLUTION, guides_in_canvas, rasterize_slice9};
use crate::raster::region::{RasterSprite, rasterize_region};
use crate::scene::model::{
    BitmapElement, FilledElement, FilledRegion, ShapeElement, ShapeSymbol, Slice9Element,
};

/// Resolution used for curved regions outside 9-slice containers.
pub const REGION_RESOLUTION: f64 = 1.0;

/// Decoded bitmaps addressed by library name, extracted ahead of group building.
pub type BitmapTable = HashMap<String, PreparedImage>;

/// Turn every element of `symbol` into graphic items, in element order.
#[tracing::instrument(level = "debug", skip_all, fields(id = symbol.id, name = %symbol.name))]
pub fn build_group(symbol: &ShapeSymbol, bitmaps: &BitmapTable) -> PackResult<GraphicGroup> {
    let mut group = GraphicGroup::new(symbol.id, symbol.name.clone());
    for element in &symbol.elements {
        match element {
            ShapeElement::Bitmap(b) => add_bitmap(&mut group, b, bitmaps)?,
            ShapeElement::Filled(f) => add_filled_element(&mut group, f)?,
            ShapeElement::Sliced(s) => add_sliced_element(&mut group, s)?,
        }
    }
    tracing::debug!(items = group.len(), "group built");
    Ok(group)
}

/// Bitmap names referenced by `symbol`, in first-use order.
pub fn referenced_bitmaps(symbol: &ShapeSymbol) -> impl Iterator<Item = &str> {
    symbol.elements.iter().filter_map(|e| match e {
        ShapeElement::Bitmap(b) => Some(b.name.as_str()),
        _ => None,
    })
}

pub fn add_bitmap(
    group: &mut GraphicGroup,
    element: &BitmapElement,
    bitmaps: &BitmapTable,
) -> PackResult<()> {
    let image = bitmaps.get(&element.name).cloned().ok_or_else(|| {
        PackError::validation(format!(
            "bitmap '{}' used by '{}' was not extracted",
            element.name, group.name
        ))
    })?;
    group.items.push(GraphicItem::Bitmap(BitmapItem {
        image,
        transform: element.transform,
    }));
    Ok(())
}

/// Classify fills, then strokes, and append one item per drawable region.
pub fn add_filled_element(group: &mut GraphicGroup, element: &FilledElement) -> PackResult<()> {
    for region in element.fills.iter().chain(element.strokes.iter()) {
        if let Some(item) = region_item(region, element.transform, &group.name)? {
            group.items.push(item);
        }
    }
    Ok(())
}

pub fn add_sliced_element(group: &mut GraphicGroup, element: &Slice9Element) -> PackResult<()> {
    let Some(sprite) = rasterize_slice9(element, SLICE9_RESOLUTION)? else {
        return Ok(());
    };
    group.items.push(GraphicItem::Sliced(SlicedItem {
        guides: guides_in_canvas(element.guides, SLICE9_RESOLUTION, sprite.offset),
        transform: element.transform * sprite_to_element(&sprite, SLICE9_RESOLUTION),
        image: sprite.image,
    }));
    Ok(())
}

fn region_item(
    region: &FilledRegion,
    transform: Affine,
    owner: &str,
) -> PackResult<Option<GraphicItem>> {
    let strategy = classify_region(region);
    let Some(color) = region.fill.solid_color() else {
        return Ok(None);
    };

    match strategy {
        RegionStrategy::Skip => Ok(None),
        RegionStrategy::Direct => Ok(Some(GraphicItem::Filled(FilledItem {
            polygons: vec![region.contour.vertices()],
            color,
            transform,
        }))),
        RegionStrategy::Triangulate => {
            let holes: Vec<Vec<Point>> = region.holes.iter().map(|h| h.vertices()).collect();
            match triangulate(&region.contour.vertices(), &holes) {
                Ok(tris) if !tris.is_empty() => Ok(Some(GraphicItem::Filled(FilledItem {
                    polygons: tris.iter().map(triangle_polygon).collect(),
                    color,
                    transform,
                }))),
                Ok(_) => {
                    tracing::warn!(symbol = owner, "triangulation produced no triangles, rasterizing");
                    rasterized(region, transform).map(Some)
                }
                Err(err) => {
                    tracing::warn!(symbol = owner, %err, "triangulation failed, rasterizing");
                    rasterized(region, transform).map(Some)
                }
            }
        }
        RegionStrategy::Rasterize => rasterized(region, transform).map(Some),
    }
}

fn rasterized(region: &FilledRegion, transform: Affine) -> PackResult<GraphicItem> {
    let sprite = rasterize_region(region, REGION_RESOLUTION)?;
    Ok(GraphicItem::Bitmap(BitmapItem {
        transform: transform * sprite_to_element(&sprite, REGION_RESOLUTION),
        image: sprite.image,
    }))
}

/// Canvas pixel `p` sits at `(p + offset) / resolution` in element space.
fn sprite_to_element(sprite: &RasterSprite, resolution: f64) -> Affine {
    Affine::scale(1.0 / resolution) * Affine::translate(sprite.offset.to_vec2())
}

#[cfg(test)]
#[path = "../../tests/unit/graphic/builder.rs"]
mod tests;
