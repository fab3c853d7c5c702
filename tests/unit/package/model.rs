use super::*;

#[test]
fn ids_cover_every_record_kind() {
    let mut p = Package::default();
    assert_eq!(p.max_id(), None);
    p.movieclips.push(MovieClip::empty(2));
    p.modifiers.push(Modifier {
        id: 9,
        kind: ModifierKind::Mask,
    });
    p.shapes.push(Shape {
        id: 4,
        commands: Vec::new(),
    });
    assert_eq!(p.ids().collect::<Vec<_>>(), vec![2, 9, 4]);
    assert_eq!(p.max_id(), Some(9));
    assert_eq!(p.record_count(), 3);
    assert!(p.shape(4).is_some());
    assert!(p.shape(2).is_none());
}
