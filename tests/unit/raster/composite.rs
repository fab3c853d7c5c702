use super::*;
use crate::foundation::core::Rgba8;
use crate::scene::model::{Contour, FilledElement, FilledRegion};

fn rect_ring(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
    Contour::polygon(&[
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ])
}

#[test]
fn over_rounds_destination_term_up() {
    let mut d = [100, 100, 100, 255];
    over_rgba8_premul(&mut d, [0, 0, 0, 128]);
    // 100 * 127 / 255 = 49.8 -> 50
    assert_eq!(d, [50, 50, 50, 255]);

    let mut opaque = [10, 20, 30, 255];
    over_rgba8_premul(&mut opaque, [1, 2, 3, 255]);
    assert_eq!(opaque, [1, 2, 3, 255]);
}

#[test]
fn composite_clips_to_destination() {
    let mut dst = vec![0u8; 2 * 2 * 4];
    let src = PreparedImage::new(2, 2, vec![255; 16]);
    composite_over(&mut dst, 2, 2, &src, 1, 1);
    assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
    assert_eq!(&dst[12..16], &[255, 255, 255, 255]);
}

#[test]
fn slice9_canvas_spans_all_children_at_double_resolution() {
    let element = Slice9Element {
        guides: Rect::new(2.0, 2.0, 8.0, 8.0),
        elements: vec![
            FilledElement {
                fills: vec![FilledRegion::solid(
                    rect_ring(0.0, 0.0, 5.0, 5.0),
                    Rgba8::new(255, 0, 0, 255),
                )],
                strokes: Vec::new(),
                transform: Affine::IDENTITY,
            },
            FilledElement {
                fills: vec![FilledRegion::solid(
                    rect_ring(0.0, 0.0, 5.0, 5.0),
                    Rgba8::new(0, 0, 255, 255),
                )],
                strokes: Vec::new(),
                transform: Affine::translate((5.0, 5.0)),
            },
        ],
        transform: Affine::IDENTITY,
    };

    let sprite = rasterize_slice9(&element, SLICE9_RESOLUTION).unwrap().unwrap();
    assert_eq!(sprite.offset, Point::new(0.0, 0.0));
    assert_eq!((sprite.image.width, sprite.image.height), (20, 20));
    let at = |x: u32, y: u32| {
        let i = ((y * 20 + x) * 4) as usize;
        sprite.image.rgba8_premul[i..i + 4].to_vec()
    };
    assert_eq!(at(2, 2), vec![255, 0, 0, 255]);
    assert_eq!(at(15, 15), vec![0, 0, 255, 255]);
    assert_eq!(at(15, 2), vec![0, 0, 0, 0]);
}

#[test]
fn slice9_without_drawable_children_is_empty() {
    let element = Slice9Element {
        guides: Rect::new(0.0, 0.0, 1.0, 1.0),
        elements: vec![FilledElement {
            fills: vec![FilledRegion::solid(rect_ring(0.0, 0.0, 5.0, 5.0), Rgba8::new(1, 1, 1, 0))],
            strokes: Vec::new(),
            transform: Affine::IDENTITY,
        }],
        transform: Affine::IDENTITY,
    };
    assert!(rasterize_slice9(&element, SLICE9_RESOLUTION).unwrap().is_none());
}

#[test]
fn guides_follow_resolution_and_offset() {
    let g = guides_in_canvas(Rect::new(2.0, 3.0, 8.0, 9.0), 2.0, Point::new(-2.0, 0.0));
    assert_eq!(g, Rect::new(6.0, 6.0, 18.0, 18.0));
}

#[test]
fn slice9_strokes_are_composited_over_fills() {
    let element = Slice9Element {
        guides: Rect::new(1.0, 1.0, 3.0, 3.0),
        elements: vec![FilledElement {
            fills: vec![FilledRegion::solid(rect_ring(0.0, 0.0, 4.0, 4.0), Rgba8::new(255, 0, 0, 255))],
            strokes: vec![FilledRegion::solid(
                rect_ring(0.0, 0.0, 4.0, 1.0),
                Rgba8::new(0, 255, 0, 255),
            )],
            transform: Affine::IDENTITY,
        }],
        transform: Affine::IDENTITY,
    };
    let sprite = rasterize_slice9(&element, SLICE9_RESOLUTION).unwrap().unwrap();
    assert_eq!((sprite.image.width, sprite.image.height), (8, 8));
    let at = |x: u32, y: u32| {
        let i = ((y * 8 + x) * 4) as usize;
        sprite.image.rgba8_premul[i..i + 4].to_vec()
    };
    assert_eq!(at(3, 0), vec![0, 255, 0, 255]);
    assert_eq!(at(3, 5), vec![255, 0, 0, 255]);
}
