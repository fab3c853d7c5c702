use crate::atlas::packer::{AtlasTexture, PackedAtlas, Placement};
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{PackError, PackResult};
use crate::graphic::item::{GraphicGroup, GraphicItem};
use crate::package::model::{DrawCommand, Shape, Vertex};

/// Build one shape per group from the packed atlas.
///
/// Placements are consumed in flattening order, so `packed` must come from the same groups in
/// the same order. `texture_base` is added to every texture index.
pub fn emit_shapes(
    groups: &[GraphicGroup],
    packed: &PackedAtlas,
    texture_base: usize,
) -> PackResult<Vec<Shape>> {
    let mut next = 0usize;
    let mut shapes = Vec::with_capacity(groups.len());
    for group in groups {
        let mut shape = Shape {
            id: group.symbol_id,
            commands: Vec::new(),
        };
        for item in &group.items {
            let placement = packed.placements.get(next).ok_or_else(|| {
                PackError::validation(format!("no atlas placement for item {next}"))
            })?;
            let texture = packed.textures.get(placement.texture).ok_or_else(|| {
                PackError::validation(format!("placement refers to missing texture {}", placement.texture))
            })?;
            let texture_index = u16::try_from(texture_base + placement.texture)
                .map_err(|_| PackError::validation("texture index exceeds u16"))?;
            emit_item(&mut shape, item, placement, texture, texture_index);
            next += 1;
        }
        shapes.push(shape);
    }
    if next != packed.placements.len() {
        return Err(PackError::validation(format!(
            "{} placements for {next} items",
            packed.placements.len()
        )));
    }
    Ok(shapes)
}

fn emit_item(
    shape: &mut Shape,
    item: &GraphicItem,
    placement: &Placement,
    texture: &AtlasTexture,
    texture_index: u16,
) {
    let vertex = |transform: Affine, p: Point| {
        let [a, b, c, d, tx, ty] = transform.as_coeffs();
        let uv = placement.uv.apply(p);
        Vertex {
            x: (a * p.x + c * p.y + tx) as f32,
            y: (b * p.x + d * p.y + ty) as f32,
            u: (uv.x / f64::from(texture.width)) as f32,
            v: (uv.y / f64::from(texture.height)) as f32,
        }
    };
    let quad = |transform: Affine, r: Rect| DrawCommand {
        texture_index,
        vertices: [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
        .into_iter()
        .map(|p| vertex(transform, p))
        .collect(),
    };

    match item {
        GraphicItem::Bitmap(b) => {
            let r = Rect::new(0.0, 0.0, f64::from(b.image.width), f64::from(b.image.height));
            shape.commands.push(quad(b.transform, r));
        }
        GraphicItem::Filled(f) => {
            for poly in &f.polygons {
                shape.commands.push(DrawCommand {
                    texture_index,
                    vertices: poly.iter().map(|&p| vertex(f.transform, p)).collect(),
                });
            }
        }
        GraphicItem::Sliced(s) => {
            let (w, h) = (f64::from(s.image.width), f64::from(s.image.height));
            for cell in slice9_cells(w, h, s.guides) {
                shape.commands.push(quad(s.transform, cell));
            }
        }
    }
}

/// Non-empty cells of the 3x3 grid the guides cut out of a `w` x `h` bitmap, row-major.
pub fn slice9_cells(w: f64, h: f64, guides: Rect) -> Vec<Rect> {
    let clamp = |v: f64, max: f64| v.clamp(0.0, max);
    let (gx0, gx1) = (clamp(guides.x0.min(guides.x1), w), clamp(guides.x0.max(guides.x1), w));
    let (gy0, gy1) = (clamp(guides.y0.min(guides.y1), h), clamp(guides.y0.max(guides.y1), h));
    let xs = [0.0, gx0, gx1, w];
    let ys = [0.0, gy0, gy1, h];

    let mut cells = Vec::with_capacity(9);
    for row in ys.windows(2) {
        for col in xs.windows(2) {
            if col[1] > col[0] && row[1] > row[0] {
                cells.push(Rect::new(col[0], row[0], col[1], row[1]));
            }
        }
    }
    cells
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/emit.rs"]
mod tests;
