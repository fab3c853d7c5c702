use crate::foundation::core::{Affine, Point, PreparedImage, Rect};
use crate::foundation::error::PackResult;
use crate::foundation::math::mul_div255_ceil_u8;
use crate::geometry::classify::{RegionStrategy, classify_region};
use crate::raster::region::{RasterSprite, rasterize_region_with};
use crate::scene::model::Slice9Element;

/// Supersampling factor for 9-slice bitmaps.
pub const SLICE9_RESOLUTION: f64 = 2.0;

/// Source-over blend of premultiplied pixels, `dst = src + dst * (255 - src.a) / 255` rounded up.
pub fn over_rgba8_premul(dst: &mut [u8; 4], src: [u8; 4]) {
    let inv = 255 - u16::from(src[3]);
    for i in 0..4 {
        dst[i] = src[i].saturating_add(mul_div255_ceil_u8(u16::from(dst[i]), inv));
    }
}

/// Composite `src` onto `dst` with its top-left corner at (`x`, `y`) in `dst` pixels.
///
/// Pixels falling outside `dst` are dropped.
pub fn composite_over(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    src: &PreparedImage,
    x: i64,
    y: i64,
) {
    for sy in 0..i64::from(src.height) {
        let dy = y + sy;
        if dy < 0 || dy >= i64::from(dst_height) {
            continue;
        }
        for sx in 0..i64::from(src.width) {
            let dx = x + sx;
            if dx < 0 || dx >= i64::from(dst_width) {
                continue;
            }
            let si = ((sy * i64::from(src.width) + sx) * 4) as usize;
            let di = ((dy * i64::from(dst_width) + dx) * 4) as usize;
            let s = [
                src.rgba8_premul[si],
                src.rgba8_premul[si + 1],
                src.rgba8_premul[si + 2],
                src.rgba8_premul[si + 3],
            ];
            let mut d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            over_rgba8_premul(&mut d, s);
            dst[di..di + 4].copy_from_slice(&d);
        }
    }
}

/// Render every drawable region of a 9-slice container onto one shared canvas.
///
/// Each child is mapped by its own transform and by `resolution`; nothing is returned when
/// no child region is drawable.
#[tracing::instrument(level = "debug", skip(element), fields(children = element.elements.len()))]
pub fn rasterize_slice9(element: &Slice9Element, resolution: f64) -> PackResult<Option<RasterSprite>> {
    let mut sprites: Vec<RasterSprite> = Vec::new();
    for child in &element.elements {
        let placement = Affine::scale(resolution) * child.transform;
        for region in child.fills.iter().chain(child.strokes.iter()) {
            if classify_region(region) == RegionStrategy::Skip {
                continue;
            }
            sprites.push(rasterize_region_with(region, placement)?);
        }
    }

    let Some(bounds) = sprites
        .iter()
        .map(RasterSprite::rect)
        .reduce(|a, b| a.union(b))
    else {
        return Ok(None);
    };

    let width = (bounds.width() as u32).max(1);
    let height = (bounds.height() as u32).max(1);
    let mut canvas = vec![0u8; width as usize * height as usize * 4];
    for sprite in &sprites {
        composite_over(
            &mut canvas,
            width,
            height,
            &sprite.image,
            (sprite.offset.x - bounds.x0) as i64,
            (sprite.offset.y - bounds.y0) as i64,
        );
    }

    Ok(Some(RasterSprite {
        image: PreparedImage::new(width, height, canvas),
        offset: Point::new(bounds.x0, bounds.y0),
    }))
}

/// Map 9-slice guides from element space into the pixel space of a canvas rendered at
/// `resolution` whose origin sits at `offset`.
pub fn guides_in_canvas(guides: Rect, resolution: f64, offset: Point) -> Rect {
    Rect::new(
        guides.x0 * resolution - offset.x,
        guides.y0 * resolution - offset.y,
        guides.x1 * resolution - offset.x,
        guides.y1 * resolution - offset.y,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/raster/composite.rs"]
mod tests;
