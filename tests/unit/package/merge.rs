use super::*;
use crate::package::model::{
    DrawCommand, ExportName, MatrixBank, MovieClip, MovieClipChild, Shape, Texture,
};

fn texture() -> Texture {
    Texture {
        width: 1,
        height: 1,
        pixel_format: PixelFormat::Rgba8,
        encoding: TextureEncoding::Raw,
        rgba8_premul: vec![0; 4],
    }
}

fn shape(id: u16, texture_index: u16) -> Shape {
    Shape {
        id,
        commands: vec![DrawCommand {
            texture_index,
            vertices: Vec::new(),
        }],
    }
}

fn clip(id: u16, child: u16, bank: u16) -> MovieClip {
    MovieClip {
        bank_index: bank,
        children: vec![MovieClipChild {
            id: child,
            blend: 0,
            name: None,
        }],
        ..MovieClip::empty(id)
    }
}

#[test]
fn fresh_ids_move_past_existing_ones() {
    let mut a = Package::default();
    a.shapes.push(shape(5, 0));
    a.shapes.push(shape(1, 0));
    a.textures.push(texture());
    a.matrix_banks.push(MatrixBank::default());

    let mut b = Package::default();
    b.shapes.push(shape(0, 0));
    b.movieclips.push(clip(2, 0, 0));
    b.exports.push(ExportName {
        id: 2,
        name: "root".to_owned(),
    });
    b.textures.push(texture());
    b.matrix_banks.push(MatrixBank::default());
    b.flags.use_low_resolution = true;

    let merged =
        merge_packages(a, b, PixelFormat::Rgba4, TextureEncoding::Compressed).unwrap();

    let ids: Vec<u16> = merged.ids().collect();
    assert_eq!(ids.len(), 4);
    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    assert_eq!(merged.shapes[2].id, 6);
    assert_eq!(merged.shapes[2].commands[0].texture_index, 1);
    assert_eq!(merged.movieclips[0].id, 8);
    assert_eq!(merged.movieclips[0].children[0].id, 6);
    assert_eq!(merged.movieclips[0].bank_index, 1);
    assert_eq!(merged.exports[0].id, 8);
    assert_eq!(merged.textures.len(), 2);
    assert_eq!(merged.textures[0].pixel_format, PixelFormat::Rgba4);
    assert_eq!(merged.textures[0].encoding, TextureEncoding::Compressed);
    assert!(merged.flags.use_low_resolution);
}

#[test]
fn empty_existing_package_keeps_ids() {
    let mut b = Package::default();
    b.shapes.push(shape(0, 0));
    b.textures.push(texture());
    let merged = merge_packages(
        Package::default(),
        b.clone(),
        PixelFormat::Rgba8,
        TextureEncoding::Raw,
    )
    .unwrap();
    assert_eq!(merged, b);
}

#[test]
fn id_overflow_is_a_validation_error() {
    let mut a = Package::default();
    a.shapes.push(shape(u16::MAX - 1, 0));
    let mut b = Package::default();
    b.shapes.push(shape(3, 0));
    let err = merge_packages(a, b, PixelFormat::Rgba8, TextureEncoding::Raw).unwrap_err();
    assert!(matches!(err, PackError::Validation(_)));
}
