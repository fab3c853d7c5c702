use super::*;
use crate::foundation::core::Affine;
use crate::graphic::item::{BitmapItem, FilledItem, SlicedItem};

fn group(id: u16, items: Vec<GraphicItem>) -> GraphicGroup {
    GraphicGroup {
        symbol_id: id,
        name: format!("g{id}"),
        items,
    }
}

fn fill() -> GraphicItem {
    GraphicItem::Filled(FilledItem {
        polygons: vec![vec![Point::ZERO; 3]],
        color: Rgba8::new(1, 2, 3, 4),
        transform: Affine::IDENTITY,
    })
}

fn bitmap() -> GraphicItem {
    GraphicItem::Bitmap(BitmapItem {
        image: PreparedImage::new(1, 1, vec![0; 4]),
        transform: Affine::IDENTITY,
    })
}

#[test]
fn flattening_preserves_order_and_owners() {
    let sliced = GraphicItem::Sliced(SlicedItem {
        image: PreparedImage::new(1, 1, vec![0; 4]),
        guides: crate::foundation::core::Rect::ZERO,
        transform: Affine::IDENTITY,
    });
    let groups = vec![
        group(1, vec![fill(), bitmap()]),
        group(2, vec![]),
        group(3, vec![sliced]),
    ];
    let flat = FlatItems::from_groups(&groups);
    assert_eq!(flat.len(), 3);
    assert_eq!(flat.owners, vec![0, 0, 2]);
    assert!(matches!(flat.items[0], AtlasItem::Swatch { .. }));
    assert!(!flat.items[1].is_sliced());
    assert!(flat.items[2].is_sliced());
    assert_eq!(flat.owner_of(2), Some(2));
    assert_eq!(flat.owner_of(3), None);
}
