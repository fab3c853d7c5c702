use super::*;
use crate::foundation::core::Rgba8;

fn solid_image(w: u32, h: u32, v: u8) -> PreparedImage {
    PreparedImage::new(w, h, vec![v; (w * h * 4) as usize])
}

fn image_item(img: PreparedImage) -> AtlasItem {
    AtlasItem::Image {
        image: img,
        sliced: false,
    }
}

fn swatch(color: Rgba8) -> AtlasItem {
    AtlasItem::Swatch {
        color,
        polygons: vec![vec![Point::ZERO, Point::new(1.0, 0.0), Point::new(0.0, 1.0)]],
    }
}

fn cfg(max: u32) -> AtlasConfig {
    AtlasConfig {
        max_width: max,
        max_height: max,
        scale_factor: 1.0,
        padding: 2,
    }
}

fn overlaps(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
    a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3
}

#[test]
fn slots_do_not_overlap_and_stay_inside_textures() {
    let items: Vec<AtlasItem> = (0..12)
        .map(|i| image_item(solid_image(10 + i, 20 - i, i as u8 + 1)))
        .collect();
    let mut seen = Vec::new();
    let packed = pack_atlas(&items, &cfg(64), &mut |n| seen.push(n)).unwrap();

    assert_eq!(packed.placements.len(), items.len());
    assert_eq!(seen, (1..=items.len()).collect::<Vec<_>>());
    for (i, a) in packed.placements.iter().enumerate() {
        let tex = &packed.textures[a.texture];
        assert!(a.rect.0 + a.rect.2 <= tex.width && a.rect.1 + a.rect.3 <= tex.height);
        for b in &packed.placements[i + 1..] {
            if a.texture == b.texture {
                assert!(!overlaps(a.rect, b.rect), "{a:?} overlaps {b:?}");
            }
        }
    }
}

#[test]
fn identical_images_and_colors_share_a_slot() {
    let img = solid_image(4, 4, 7);
    let copy = PreparedImage::new(4, 4, img.rgba8_premul.to_vec());
    let red = Rgba8::new(255, 0, 0, 255);
    let items = vec![image_item(img), swatch(red), image_item(copy), swatch(red)];
    let packed = pack_atlas(&items, &cfg(64), &mut |_| {}).unwrap();

    assert_eq!(packed.placements[0], packed.placements[2]);
    assert_eq!(packed.placements[1], packed.placements[3]);
    assert_ne!(packed.placements[0].rect, packed.placements[1].rect);
}

#[test]
fn swatch_maps_everything_to_its_center_pixel() {
    let color = Rgba8::new(10, 20, 30, 255);
    let packed = pack_atlas(&[swatch(color)], &cfg(16), &mut |_| {}).unwrap();
    let p = packed.placements[0];
    let UvTransform::Solid { center } = p.uv else {
        panic!("expected solid uv");
    };
    assert_eq!(p.uv.apply(Point::new(123.0, -4.0)), center);
    let tex = &packed.textures[0];
    let (x, y) = (center.x as u32, center.y as u32);
    let i = ((y * tex.width + x) * 4) as usize;
    assert_eq!(&tex.rgba8_premul[i..i + 4], &[10, 20, 30, 255]);
}

#[test]
fn sprite_uv_covers_its_rect() {
    let packed = pack_atlas(&[image_item(solid_image(8, 8, 3))], &cfg(32), &mut |_| {}).unwrap();
    let p = packed.placements[0];
    let (x, y, w, h) = p.rect;
    assert_eq!(p.uv.apply(Point::ZERO), Point::new(f64::from(x), f64::from(y)));
    assert_eq!(
        p.uv.apply(Point::new(8.0, 8.0)),
        Point::new(f64::from(x + w), f64::from(y + h))
    );
}

#[test]
fn rotation_lets_wide_items_fit_narrow_bins() {
    let cfg = AtlasConfig {
        max_width: 24,
        max_height: 80,
        scale_factor: 1.0,
        padding: 2,
    };
    let packed = pack_atlas(&[image_item(solid_image(60, 10, 1))], &cfg, &mut |_| {}).unwrap();
    let p = packed.placements[0];
    let UvTransform::Sprite { rotated, .. } = p.uv else {
        panic!("expected sprite uv");
    };
    assert!(rotated);
    assert_eq!((p.rect.2, p.rect.3), (10, 60));
    // Top-left source corner lands on the top-right of the rotated slot.
    assert_eq!(
        p.uv.apply(Point::ZERO),
        Point::new(f64::from(p.rect.0 + 10), f64::from(p.rect.1))
    );
}

#[test]
fn overflow_opens_more_textures() {
    let items: Vec<AtlasItem> = (0..4).map(|i| image_item(solid_image(28, 28, i + 1))).collect();
    let packed = pack_atlas(&items, &cfg(40), &mut |_| {}).unwrap();
    assert_eq!(packed.textures.len(), 4);
}

#[test]
fn scale_factor_resamples_images() {
    let cfg = AtlasConfig {
        scale_factor: 0.5,
        ..cfg(64)
    };
    let packed = pack_atlas(&[image_item(solid_image(10, 6, 9))], &cfg, &mut |_| {}).unwrap();
    let p = packed.placements[0];
    assert_eq!((p.rect.2, p.rect.3), (5, 3));
    assert_eq!(
        p.uv.apply(Point::new(10.0, 6.0)),
        Point::new(f64::from(p.rect.0 + 5), f64::from(p.rect.1 + 3))
    );
}

#[test]
fn failures_carry_reason_and_index() {
    let too_big = pack_atlas(
        &[swatch(Rgba8::new(1, 1, 1, 255)), image_item(solid_image(100, 100, 1))],
        &cfg(32),
        &mut |_| {},
    )
    .unwrap_err();
    assert_eq!(too_big.reason, PackagingReason::TooBigImage);
    assert_eq!(too_big.index, Some(1));

    let broken = pack_atlas(
        &[image_item(PreparedImage::new(3, 3, vec![0; 4]))],
        &cfg(32),
        &mut |_| {},
    )
    .unwrap_err();
    assert_eq!(broken, PackFailure::at(PackagingReason::UnsupportedImage, 0));

    let degenerate = AtlasItem::Swatch {
        color: Rgba8::new(1, 1, 1, 255),
        polygons: vec![vec![Point::ZERO, Point::new(1.0, 1.0)]],
    };
    let bad_poly = pack_atlas(&[degenerate], &cfg(32), &mut |_| {}).unwrap_err();
    assert_eq!(bad_poly.reason, PackagingReason::InvalidPolygon);

    let bad_cfg = pack_atlas(&[], &cfg(0), &mut |_| {}).unwrap_err();
    assert_eq!(bad_cfg.reason, PackagingReason::Unknown);
    assert_eq!(bad_cfg.index, None);
}

#[test]
fn page_sized_image_gets_its_own_page() {
    let packed = pack_atlas(&[image_item(solid_image(64, 64, 5))], &cfg(64), &mut |_| {}).unwrap();
    assert_eq!(packed.textures.len(), 1);
    assert_eq!((packed.textures[0].width, packed.textures[0].height), (64, 64));
    assert_eq!(packed.placements[0].rect, (0, 0, 64, 64));

    // A smaller item alongside opens a second page instead of failing.
    let items = [image_item(solid_image(64, 64, 5)), image_item(solid_image(8, 8, 6))];
    let packed = pack_atlas(&items, &cfg(64), &mut |_| {}).unwrap();
    assert_eq!(packed.textures.len(), 2);
}

#[test]
fn oversized_scale_is_rejected_before_resampling() {
    let cfg = AtlasConfig {
        scale_factor: 100.0,
        ..cfg(64)
    };
    let err = pack_atlas(
        &[swatch(Rgba8::new(3, 3, 3, 255)), image_item(solid_image(100, 100, 1))],
        &cfg,
        &mut |_| {},
    )
    .unwrap_err();
    assert_eq!(err, PackFailure::at(PackagingReason::TooBigImage, 1));
}

#[test]
fn progress_counts_shared_slots_once_per_item() {
    let img = solid_image(6, 6, 2);
    let copy = PreparedImage::new(6, 6, img.rgba8_premul.to_vec());
    let items = vec![image_item(img), image_item(copy), swatch(Rgba8::new(9, 9, 9, 255))];
    let mut seen = Vec::new();
    pack_atlas(&items, &cfg(64), &mut |n| seen.push(n)).unwrap();
    // Two slots: the shared image (two items) lands first, then the swatch.
    assert_eq!(seen, vec![2, 3]);
}
