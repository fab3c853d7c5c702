use super::*;

#[test]
fn quality_tiers_map_to_formats() {
    assert_eq!(TextureQuality::Highest.pixel_format(), PixelFormat::Rgba8);
    assert_eq!(TextureQuality::High.pixel_format(), PixelFormat::Rgba4);
    assert_eq!(TextureQuality::Medium.pixel_format(), PixelFormat::Rgba4);
    assert_eq!(TextureQuality::Low.pixel_format(), PixelFormat::Rgb5A1);
}

#[test]
fn rgba4_keeps_high_nibbles() {
    let px = [0xFF, 0x80, 0x10, 0xF0];
    let packed = pack_pixels(&px, PixelFormat::Rgba4);
    assert_eq!(packed.len(), 2);
    assert_eq!(unpack_pixels(&packed, PixelFormat::Rgba4), vec![0xFF, 0x88, 0x11, 0xFF]);
}

#[test]
fn rgb5a1_thresholds_alpha() {
    let px = [0xFF, 0x00, 0x84, 0x7F, 0x08, 0x08, 0x08, 0x80];
    let back = unpack_pixels(&pack_pixels(&px, PixelFormat::Rgb5A1), PixelFormat::Rgb5A1);
    assert_eq!(back, vec![0xFF, 0x00, 0x84, 0x00, 0x08, 0x08, 0x08, 0xFF]);
}

#[test]
fn tags_round_trip_and_reject_unknown() {
    for f in [PixelFormat::Rgba8, PixelFormat::Rgba4, PixelFormat::Rgb5A1] {
        assert_eq!(PixelFormat::from_tag(f.tag()).unwrap(), f);
    }
    assert!(PixelFormat::from_tag(7).is_err());
    assert!(TextureEncoding::from_tag(2).is_err());
}

#[test]
fn compressed_texture_round_trips() {
    let px = vec![1, 2, 3, 255, 0, 0, 0, 0];
    let blob = encode_texture(2, 1, &px, PixelFormat::Rgba4, TextureEncoding::Compressed).unwrap();
    assert_eq!(&blob[1..4], b"PNG");
    let back = decode_texture(2, 1, &blob, PixelFormat::Rgba4, TextureEncoding::Compressed).unwrap();
    assert_eq!(back, px);
    assert!(decode_texture(3, 1, &blob, PixelFormat::Rgba8, TextureEncoding::Compressed).is_err());
}

#[test]
fn raw_payload_length_is_checked() {
    let err = decode_texture(2, 2, &[0; 4], PixelFormat::Rgba8, TextureEncoding::Raw).unwrap_err();
    assert!(matches!(err, PackError::Decode(_)));
}

#[test]
fn half_size_rounds_up() {
    let (w, h, px) = downscale_half(5, 3, &vec![255; 5 * 3 * 4]);
    assert_eq!((w, h), (3, 2));
    assert_eq!(px.len(), 3 * 2 * 4);
}
