use crate::foundation::core::Rect;

/// Round to the nearest integer, ties away from zero (2.5 -> 3, -2.5 -> -3).
pub fn round_half_away_from_zero(v: f64) -> f64 {
    let base = v.trunc();
    let frac = (v - base).abs();
    if frac >= 0.5 {
        if v >= 0.0 { base + 1.0 } else { base - 1.0 }
    } else {
        base
    }
}

/// Round every rectangle edge independently with [`round_half_away_from_zero`].
pub fn round_rect(rect: Rect) -> Rect {
    Rect::new(
        round_half_away_from_zero(rect.x0),
        round_half_away_from_zero(rect.y0),
        round_half_away_from_zero(rect.x1),
        round_half_away_from_zero(rect.y1),
    )
}

/// `x * y / 255` rounded up, saturated to `u8`.
pub(crate) fn mul_div255_ceil_u8(x: u16, y: u16) -> u8 {
    let p = u32::from(x) * u32::from(y);
    p.div_ceil(255).min(255) as u8
}

/// Signed shoelace area of a closed ring (positive for counter-clockwise in y-up space).
pub fn ring_area(points: &[kurbo::Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
