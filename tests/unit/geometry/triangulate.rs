use super::*;
use crate::foundation::math::ring_area;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

fn total_area(tris: &[Triangle]) -> f64 {
    tris.iter().map(|t| ring_area(t).abs()).sum()
}

fn inside(p: Point, r: &[Point]) -> bool {
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for q in r {
        x0 = x0.min(q.x);
        y0 = y0.min(q.y);
        x1 = x1.max(q.x);
        y1 = y1.max(q.y);
    }
    p.x > x0 && p.x < x1 && p.y > y0 && p.y < y1
}

#[test]
fn square_with_hole_covers_only_the_frame() {
    let outer = rect(0.0, 0.0, 10.0, 10.0);
    let hole = rect(3.0, 3.0, 7.0, 7.0);
    let tris = triangulate(&outer, std::slice::from_ref(&hole)).unwrap();

    assert!(!tris.is_empty());
    assert!((total_area(&tris) - (100.0 - 16.0)).abs() < 1e-9);
    for t in &tris {
        let c = Point::new(
            (t[0].x + t[1].x + t[2].x) / 3.0,
            (t[0].y + t[1].y + t[2].y) / 3.0,
        );
        assert!(!inside(c, &hole), "triangle centroid {c:?} inside hole");
    }
}

#[test]
fn concave_polygon_area_is_preserved() {
    let l_shape = vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 1.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 4.0),
        Point::new(0.0, 4.0),
    ];
    let tris = triangulate(&l_shape, &[]).unwrap();
    assert_eq!(tris.len(), 4);
    assert!((total_area(&tris) - 7.0).abs() < 1e-9);
}

#[test]
fn duplicate_vertices_are_merged() {
    let ring = vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(2.0, 2.0),
        Point::new(0.0, 2.0),
        Point::new(0.0, 0.0),
    ];
    assert_eq!(normalize_ring(&ring).len(), 4);
    let tris = triangulate(&ring, &[]).unwrap();
    assert_eq!(tris.len(), 2);
    assert!((total_area(&tris) - 4.0).abs() < 1e-9);
}

#[test]
fn degenerate_rings() {
    let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 0.0)];
    assert!(triangulate(&line, &[]).is_err());

    let outer = rect(0.0, 0.0, 4.0, 4.0);
    let tiny_hole = vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
    let tris = triangulate(&outer, &[tiny_hole]).unwrap();
    assert!((total_area(&tris) - 16.0).abs() < 1e-9);
}

#[test]
fn triangle_polygon_repeats_last_vertex() {
    let t = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
    let poly = triangle_polygon(&t);
    assert_eq!(poly.len(), 4);
    assert_eq!(poly[3], poly[2]);
}
