use crate::foundation::core::{Affine, BezPath, Point, PreparedImage, Rect, Rgba8};
use crate::foundation::error::{PackError, PackResult};
use crate::foundation::math::round_rect;
use crate::scene::model::{Fill, FilledRegion};

/// Rasterized region: premultiplied pixels plus the canvas origin in raster space.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterSprite {
    pub image: PreparedImage,
    /// Top-left corner of the canvas in the scaled coordinate space.
    pub offset: Point,
}

impl RasterSprite {
    /// Canvas rectangle in raster space.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.offset.x,
            self.offset.y,
            self.offset.x + f64::from(self.image.width),
            self.offset.y + f64::from(self.image.height),
        )
    }
}

/// Render `region` at `resolution` times its native size.
pub fn rasterize_region(region: &FilledRegion, resolution: f64) -> PackResult<RasterSprite> {
    rasterize_region_with(region, Affine::scale(resolution))
}

/// Render `region` after mapping its geometry through `placement`.
///
/// The canvas covers the rounded bounding box of every ring (control points included) and is
/// never smaller than 1x1. Holes clear coverage already painted by the contour.
#[tracing::instrument(level = "trace", skip(region))]
pub fn rasterize_region_with(region: &FilledRegion, placement: Affine) -> PackResult<RasterSprite> {
    let color = match &region.fill {
        Fill::Solid { color } => *color,
        Fill::Unsupported { name } => {
            return Err(PackError::validation(format!(
                "cannot rasterize unsupported fill '{name}'"
            )));
        }
    };
    let bounds = region
        .bounds(|p| placement * p)
        .ok_or_else(|| PackError::validation("cannot rasterize an empty region"))?;
    if !(bounds.x0.is_finite() && bounds.y0.is_finite() && bounds.x1.is_finite() && bounds.y1.is_finite())
    {
        return Err(PackError::validation("region bounds are not finite"));
    }

    let rounded = round_rect(bounds);
    let (width, height) = canvas_size(rounded)?;
    let to_canvas = Affine::translate((-rounded.x0, -rounded.y0)) * placement;

    let contour = region.contour.to_bez_path(|p| p);
    let mut pixels = fill_coverage(&contour, to_canvas, color, width, height);

    if !region.holes.is_empty() {
        let mut hole_paths = BezPath::new();
        for hole in &region.holes {
            for &el in hole.to_bez_path(|p| p).elements() {
                hole_paths.push(el);
            }
        }
        let opaque = Rgba8::new(255, 255, 255, 255);
        let mask = fill_coverage(&hole_paths, to_canvas, opaque, width, height);
        clear_under_mask(&mut pixels, &mask);
    }

    Ok(RasterSprite {
        image: PreparedImage::new(u32::from(width), u32::from(height), pixels),
        offset: Point::new(rounded.x0, rounded.y0),
    })
}

fn canvas_size(rounded: Rect) -> PackResult<(u16, u16)> {
    let w = (rounded.x1 - rounded.x0).max(1.0);
    let h = (rounded.y1 - rounded.y0).max(1.0);
    if w > f64::from(u16::MAX) || h > f64::from(u16::MAX) {
        return Err(PackError::validation(format!(
            "raster canvas {w}x{h} exceeds {}x{}",
            u16::MAX,
            u16::MAX
        )));
    }
    Ok((w as u16, h as u16))
}

/// `dst *= 1 - mask.a`, per channel, rounded to nearest.
pub(crate) fn clear_under_mask(dst: &mut [u8], mask: &[u8]) {
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let keep = 255 - u16::from(m[3]);
        for c in d.iter_mut() {
            *c = ((u16::from(*c) * keep + 127) / 255) as u8;
        }
    }
}

fn fill_coverage(
    path: &BezPath,
    transform: Affine,
    color: Rgba8,
    width: u16,
    height: u16,
) -> Vec<u8> {
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data_as_u8_slice().to_vec()
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/raster/region.rs"]
mod tests;
