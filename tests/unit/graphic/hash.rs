use super::*;
use crate::foundation::core::{Point, Rgba8};
use crate::graphic::item::{BitmapItem, FilledItem, SlicedItem};

fn fill_group(name: &str, color: Rgba8) -> GraphicGroup {
    let mut g = GraphicGroup::new(1, name);
    g.items.push(GraphicItem::Filled(FilledItem {
        polygons: vec![vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]],
        color,
        transform: Affine::IDENTITY,
    }));
    g
}

#[test]
fn digest_ignores_symbol_identity() {
    let a = fill_group("a", Rgba8::new(1, 2, 3, 255));
    let mut b = fill_group("b", Rgba8::new(1, 2, 3, 255));
    b.symbol_id = 99;
    assert_eq!(digest_group(&a), digest_group(&b));
    assert!(a.same_content(&b));
}

#[test]
fn digest_tracks_color_transform_and_pixels() {
    let base = fill_group("a", Rgba8::new(1, 2, 3, 255));
    let recolored = fill_group("a", Rgba8::new(1, 2, 4, 255));
    assert_ne!(digest_group(&base), digest_group(&recolored));

    let mut moved = base.clone();
    if let GraphicItem::Filled(f) = &mut moved.items[0] {
        f.transform = Affine::translate((1.0, 0.0));
    }
    assert_ne!(digest_group(&base), digest_group(&moved));

    let bitmap = |px: u8| {
        let mut g = GraphicGroup::new(1, "bmp");
        g.items.push(GraphicItem::Bitmap(BitmapItem {
            image: PreparedImage::new(1, 1, vec![px, 0, 0, 255]),
            transform: Affine::IDENTITY,
        }));
        g
    };
    assert_eq!(digest_group(&bitmap(5)), digest_group(&bitmap(5)));
    assert_ne!(digest_group(&bitmap(5)), digest_group(&bitmap(6)));
}

#[test]
fn digest_includes_slice_guides() {
    let sliced = |x0: f64| {
        let mut g = GraphicGroup::new(1, "s");
        g.items.push(GraphicItem::Sliced(SlicedItem {
            image: PreparedImage::new(1, 1, vec![0, 0, 0, 255]),
            guides: Rect::new(x0, 0.0, 1.0, 1.0),
            transform: Affine::IDENTITY,
        }));
        g
    };
    assert_ne!(digest_group(&sliced(0.0)), digest_group(&sliced(0.5)));
}
