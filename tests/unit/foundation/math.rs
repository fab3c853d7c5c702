use super::*;

#[test]
fn rounding_ties_go_away_from_zero() {
    assert_eq!(round_half_away_from_zero(2.5), 3.0);
    assert_eq!(round_half_away_from_zero(-2.5), -3.0);
    assert_eq!(round_half_away_from_zero(2.4), 2.0);
    assert_eq!(round_half_away_from_zero(-2.4), -2.0);
    assert_eq!(round_half_away_from_zero(0.0), 0.0);
    assert_eq!(round_half_away_from_zero(3.5), 4.0);
}

#[test]
fn round_rect_rounds_each_edge() {
    let r = round_rect(Rect::new(-2.5, 0.4, 2.5, 9.6));
    assert_eq!(r, Rect::new(-3.0, 0.0, 3.0, 10.0));
}

#[test]
fn mul_div255_ceil_rounds_up() {
    assert_eq!(mul_div255_ceil_u8(255, 255), 255);
    assert_eq!(mul_div255_ceil_u8(1, 1), 1);
    assert_eq!(mul_div255_ceil_u8(0, 200), 0);
    assert_eq!(mul_div255_ceil_u8(128, 127), 64);
}

#[test]
fn ring_area_of_unit_square() {
    let sq = [
        kurbo::Point::new(0.0, 0.0),
        kurbo::Point::new(1.0, 0.0),
        kurbo::Point::new(1.0, 1.0),
        kurbo::Point::new(0.0, 1.0),
    ];
    assert_eq!(ring_area(&sq), 1.0);
    let rev: Vec<_> = sq.iter().rev().copied().collect();
    assert_eq!(ring_area(&rev), -1.0);
}
