use super::*;
use crate::foundation::core::{Rect, Rgba8};
use crate::scene::model::{Contour, PathSegment};

const BLUE: Rgba8 = Rgba8::new(0, 0, 255, 255);

fn ring(points: &[(f64, f64)]) -> Contour {
    let pts: Vec<Point> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
    Contour::polygon(&pts)
}

fn shape(elements: Vec<ShapeElement>) -> ShapeSymbol {
    ShapeSymbol {
        id: 7,
        name: "thing".to_owned(),
        required: false,
        elements,
    }
}

fn filled(fills: Vec<FilledRegion>, transform: Affine) -> ShapeElement {
    ShapeElement::Filled(FilledElement {
        fills,
        strokes: Vec::new(),
        transform,
    })
}

#[test]
fn quad_becomes_direct_fill_with_element_transform() {
    let quad = FilledRegion::solid(ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]), BLUE);
    let t = Affine::translate((10.0, 0.0));
    let group = build_group(&shape(vec![filled(vec![quad], t)]), &BitmapTable::new()).unwrap();

    assert_eq!(group.symbol_id, 7);
    assert_eq!(group.len(), 1);
    let GraphicItem::Filled(item) = &group.items[0] else {
        panic!("expected fill item");
    };
    assert_eq!(item.polygons.len(), 1);
    assert_eq!(item.polygons[0].len(), 4);
    assert_eq!(item.transform, t);
    assert_eq!(item.color, BLUE);
}

#[test]
fn hexagon_is_triangulated_into_four_point_polygons() {
    let hex = FilledRegion::solid(
        ring(&[(0.0, 0.0), (2.0, 0.0), (3.0, 1.0), (2.0, 2.0), (0.0, 2.0), (-1.0, 1.0)]),
        BLUE,
    );
    let group = build_group(&shape(vec![filled(vec![hex], Affine::IDENTITY)]), &BitmapTable::new())
        .unwrap();
    let GraphicItem::Filled(item) = &group.items[0] else {
        panic!("expected fill item");
    };
    assert_eq!(item.polygons.len(), 4);
    assert!(item.polygons.iter().all(|p| p.len() == 4 && p[2] == p[3]));
}

#[test]
fn curved_region_is_rasterized_and_placed_at_its_offset() {
    let mut region = FilledRegion::solid(ring(&[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)]), BLUE);
    region.contour.segments[1] = PathSegment::Quad {
        from: Point::new(6.0, 2.0),
        ctrl: Point::new(8.0, 4.0),
        to: Point::new(6.0, 6.0),
    };
    let group = build_group(&shape(vec![filled(vec![region], Affine::IDENTITY)]), &BitmapTable::new())
        .unwrap();
    let GraphicItem::Bitmap(item) = &group.items[0] else {
        panic!("expected bitmap item");
    };
    assert_eq!((item.image.width, item.image.height), (6, 4));
    assert_eq!(item.transform * Point::ZERO, Point::new(2.0, 2.0));
}

#[test]
fn transparent_regions_produce_nothing() {
    let clear = FilledRegion::solid(ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]), Rgba8::new(0, 0, 0, 0));
    let group = build_group(&shape(vec![filled(vec![clear], Affine::IDENTITY)]), &BitmapTable::new())
        .unwrap();
    assert!(group.is_empty());
}

#[test]
fn bitmaps_come_from_the_table() {
    let mut table = BitmapTable::new();
    table.insert("hero.png".to_owned(), PreparedImage::new(1, 1, vec![9, 9, 9, 255]));
    let el = ShapeElement::Bitmap(BitmapElement {
        name: "hero.png".to_owned(),
        transform: Affine::scale(2.0),
    });
    let group = build_group(&shape(vec![el.clone()]), &table).unwrap();
    assert_eq!(group.items[0].image().unwrap().width, 1);
    assert_eq!(group.items[0].transform(), Affine::scale(2.0));

    let err = build_group(&shape(vec![el]), &BitmapTable::new()).unwrap_err();
    assert!(err.to_string().contains("hero.png"));
}

#[test]
fn sliced_element_maps_canvas_back_at_half_scale() {
    let sliced = ShapeElement::Sliced(Slice9Element {
        guides: Rect::new(2.0, 2.0, 8.0, 8.0),
        elements: vec![FilledElement {
            fills: vec![FilledRegion::solid(
                ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
                BLUE,
            )],
            strokes: Vec::new(),
            transform: Affine::IDENTITY,
        }],
        transform: Affine::translate((100.0, 0.0)),
    });
    let group = build_group(&shape(vec![sliced]), &BitmapTable::new()).unwrap();
    let GraphicItem::Sliced(item) = &group.items[0] else {
        panic!("expected sliced item");
    };
    assert_eq!((item.image.width, item.image.height), (20, 20));
    assert_eq!(item.guides, Rect::new(4.0, 4.0, 16.0, 16.0));
    assert_eq!(item.transform * Point::new(20.0, 20.0), Point::new(110.0, 10.0));
}
