use super::*;
use crate::scene::model::Contour;

fn rect_ring(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
    Contour::polygon(&[
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ])
}

fn px(sprite: &RasterSprite, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * sprite.image.width + x) * 4) as usize;
    let d = &sprite.image.rgba8_premul;
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

#[test]
fn canvas_covers_rounded_bounds() {
    let region = FilledRegion::solid(rect_ring(1.5, 2.0, 11.4, 12.0), Rgba8::new(0, 0, 255, 255));
    let sprite = rasterize_region(&region, 1.0).unwrap();
    assert_eq!(sprite.offset, Point::new(2.0, 2.0));
    assert_eq!((sprite.image.width, sprite.image.height), (9, 10));
    assert!(sprite.image.is_well_formed());
    assert_eq!(px(&sprite, 4, 4), [0, 0, 255, 255]);
}

#[test]
fn resolution_scales_canvas_and_offset() {
    let region = FilledRegion::solid(rect_ring(-2.0, -2.0, 3.0, 3.0), Rgba8::new(255, 0, 0, 255));
    let sprite = rasterize_region(&region, 2.0).unwrap();
    assert_eq!(sprite.offset, Point::new(-4.0, -4.0));
    assert_eq!((sprite.image.width, sprite.image.height), (10, 10));
}

#[test]
fn holes_clear_coverage() {
    let mut region = FilledRegion::solid(rect_ring(0.0, 0.0, 10.0, 10.0), Rgba8::new(0, 255, 0, 255));
    region.holes.push(rect_ring(3.0, 3.0, 7.0, 7.0));
    let sprite = rasterize_region(&region, 1.0).unwrap();
    assert_eq!(px(&sprite, 1, 1), [0, 255, 0, 255]);
    assert_eq!(px(&sprite, 5, 5), [0, 0, 0, 0]);
}

#[test]
fn degenerate_region_still_gets_one_pixel() {
    let region = FilledRegion::solid(
        Contour::polygon(&[Point::new(4.0, 4.0), Point::new(4.2, 4.0), Point::new(4.0, 4.2)]),
        Rgba8::new(9, 9, 9, 255),
    );
    let sprite = rasterize_region(&region, 1.0).unwrap();
    assert_eq!((sprite.image.width, sprite.image.height), (1, 1));
}

#[test]
fn clear_under_mask_scales_all_channels() {
    let mut dst = vec![200, 100, 50, 255];
    clear_under_mask(&mut dst, &[0, 0, 0, 255]);
    assert_eq!(dst, vec![0, 0, 0, 0]);

    let mut half = vec![200, 100, 50, 254];
    clear_under_mask(&mut half, &[0, 0, 0, 0]);
    assert_eq!(half, vec![200, 100, 50, 254]);
}
