//! scpack compiles authored vector animation scenes into compact runtime packages.
//!
//! A job runs in stages:
//!
//! - Load a [`Scene`] and a [`CompileConfig`]
//! - Feed symbols to a [`CompileSession`]; shapes become [`GraphicGroup`]s of bitmaps,
//!   solid-color polygons and rasterized sprites
//! - Pack every item into texture atlases and emit textured draw commands
//! - Optionally merge with an existing package, then write it with [`save_package`]
//!
//! [`compile_scene`] runs the whole job in one call.
#![forbid(unsafe_code)]

mod assets;
mod atlas;
mod foundation;
mod geometry;
mod graphic;
mod package;
mod raster;
mod scene;
mod session;

pub use crate::foundation::core::{Affine, BezPath, Point, PreparedImage, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{PackError, PackResult, PackagingReason};
pub use crate::foundation::math::{ring_area, round_half_away_from_zero, round_rect};

pub use crate::scene::bitmap::{BitmapExporter, DirectoryExporter};
pub use crate::scene::model::{
    BitmapElement, ChildDesc, ColorTransform, Contour, Fill, FilledElement, FilledRegion,
    FrameDesc, FrameElementDesc, ModifierKind, ModifierSymbol, MovieClipSymbol, PathSegment,
    Scene, ShapeElement, ShapeSymbol, Slice9Element, SymbolDesc, TextAlign, TextFieldSymbol,
};

pub use crate::geometry::classify::{DIRECT_CONTOUR_MAX_SEGMENTS, RegionStrategy, classify_region};
pub use crate::geometry::triangulate::{Triangle, triangle_polygon, triangulate};

pub use crate::raster::composite::{SLICE9_RESOLUTION, composite_over, rasterize_slice9};
pub use crate::raster::region::{RasterSprite, rasterize_region, rasterize_region_with};

pub use crate::assets::cache::{ImageCache, ScratchFile};
pub use crate::assets::decode::{decode_image, encode_png};

pub use crate::graphic::builder::{BitmapTable, REGION_RESOLUTION, build_group, referenced_bitmaps};
pub use crate::graphic::hash::{GroupDigest, digest_group};
pub use crate::graphic::item::{BitmapItem, FilledItem, GraphicGroup, GraphicItem, SlicedItem};

pub use crate::atlas::emit::{emit_shapes, slice9_cells};
pub use crate::atlas::item::{AtlasItem, FlatItems};
pub use crate::atlas::packer::{
    AtlasConfig, AtlasTexture, PackFailure, PackedAtlas, Placement, UvTransform, pack_atlas,
};

pub use crate::package::codec::{
    Compression, FORMAT_VERSION, PACKAGE_MAGIC, TEXTURE_MAGIC, TextureStorage, decode_package,
    decode_texture_file, encode_package, encode_texture_file,
};
pub use crate::package::merge::merge_packages;
pub use crate::package::model::{
    DrawCommand, ExportName, FrameElement, MatrixBank, Modifier, MovieClip, MovieClipChild,
    MovieClipFrame, NO_TRANSFORM, Package, PackageFlags, Shape, TextField, Texture, Vertex,
};
pub use crate::package::save::{
    PACKAGE_EXTENSION, PackageLayout, load_package, package_path, plan_storage, save_package,
};
pub use crate::package::texture::{PixelFormat, TextureEncoding, TextureQuality};

pub use crate::session::compiler::{CompileReport, CompileSession, ShapeOutcome, compile_scene};
pub use crate::session::config::{CompileConfig, SaveOptions, TextureSettings};
