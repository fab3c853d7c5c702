use crate::scene::model::{Fill, FilledRegion};

/// Largest linear contour that is emitted as-is without triangulation.
pub const DIRECT_CONTOUR_MAX_SEGMENTS: usize = 4;

/// How a filled region reaches the package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionStrategy {
    /// Contributes nothing (transparent or unsupported fill).
    Skip,
    /// Linear polygon emitted directly as one command.
    Direct,
    /// Linear polygon (possibly with holes) split into triangles.
    Triangulate,
    /// Anything with curves, rendered into a bitmap.
    Rasterize,
}

/// Pick the single strategy used for `region`.
pub fn classify_region(region: &FilledRegion) -> RegionStrategy {
    let color = match &region.fill {
        Fill::Solid { color } => *color,
        Fill::Unsupported { .. } => return RegionStrategy::Skip,
    };
    if color.is_transparent() || region.contour.is_empty() {
        return RegionStrategy::Skip;
    }

    let curved = !region.contour.is_linear() || region.holes.iter().any(|h| !h.is_linear());
    if curved {
        return RegionStrategy::Rasterize;
    }

    if region.holes.is_empty() && region.contour.len() <= DIRECT_CONTOUR_MAX_SEGMENTS {
        RegionStrategy::Direct
    } else {
        RegionStrategy::Triangulate
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/classify.rs"]
mod tests;
