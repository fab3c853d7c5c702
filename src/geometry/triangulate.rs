use crate::foundation::core::Point;
use crate::foundation::error::{PackError, PackResult};

/// Triangle in region-local coordinates.
pub type Triangle = [Point; 3];

/// Drop consecutive duplicates and a closing vertex that repeats the first one.
pub(crate) fn normalize_ring(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Split a linear contour minus its holes into triangles.
///
/// Rings are flattened contour-first, so indices into the flat vertex list follow the same
/// order the rings were given in. Holes reduced below three distinct vertices are dropped;
/// a contour reduced below three vertices is an error.
pub fn triangulate(contour: &[Point], holes: &[Vec<Point>]) -> PackResult<Vec<Triangle>> {
    let outer = normalize_ring(contour);
    if outer.len() < 3 {
        return Err(PackError::validation(format!(
            "contour has {} distinct vertices, need at least 3",
            outer.len()
        )));
    }

    let mut vertices: Vec<Point> = outer;
    let mut hole_starts: Vec<usize> = Vec::with_capacity(holes.len());
    for hole in holes {
        let ring = normalize_ring(hole);
        if ring.len() < 3 {
            continue;
        }
        hole_starts.push(vertices.len());
        vertices.extend(ring);
    }

    if vertices.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(PackError::validation("contour has non-finite coordinates"));
    }

    let flat: Vec<f64> = vertices.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, &hole_starts, 2)
        .map_err(|e| PackError::validation(format!("triangulation failed: {e:?}")))?;

    Ok(indices
        .chunks_exact(3)
        .map(|t| [vertices[t[0]], vertices[t[1]], vertices[t[2]]])
        .collect())
}

/// Expand a triangle into the 4-point polygon form used by fill items (last vertex repeated).
pub fn triangle_polygon(t: &Triangle) -> Vec<Point> {
    vec![t[0], t[1], t[2], t[2]]
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/triangulate.rs"]
mod tests;
