use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::atlas::item::AtlasItem;
use crate::foundation::core::{Point, PreparedImage};
use crate::foundation::error::PackagingReason;

/// Packer limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Resampling factor applied to every bitmap before placement.
    pub scale_factor: f64,
    /// Empty pixels kept around every slot.
    pub padding: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            scale_factor: 1.0,
            padding: 2,
        }
    }
}

/// Packing failure with the offending flat item index when known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackFailure {
    pub reason: PackagingReason,
    pub index: Option<usize>,
}

impl PackFailure {
    fn at(reason: PackagingReason, index: usize) -> Self {
        Self {
            reason,
            index: Some(index),
        }
    }
}

/// Source-pixel to atlas-pixel mapping of one placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UvTransform {
    /// Scaled, optionally rotated 90 degrees clockwise, then offset.
    Sprite {
        scale_x: f64,
        scale_y: f64,
        rotated: bool,
        /// Slot origin in the atlas.
        x: u32,
        y: u32,
        /// Scaled source height, needed to flip rows when rotated.
        scaled_height: u32,
    },
    /// Every point maps to the middle of a 1x1 swatch.
    Solid { center: Point },
}

impl UvTransform {
    /// Map a point in source pixel space to atlas pixel space.
    pub fn apply(&self, p: Point) -> Point {
        match *self {
            Self::Sprite {
                scale_x,
                scale_y,
                rotated,
                x,
                y,
                scaled_height,
            } => {
                let (u, v) = (p.x * scale_x, p.y * scale_y);
                let (u, v) = if rotated {
                    (f64::from(scaled_height) - v, u)
                } else {
                    (u, v)
                };
                Point::new(f64::from(x) + u, f64::from(y) + v)
            }
            Self::Solid { center } => center,
        }
    }
}

/// Where one item landed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub texture: usize,
    /// Slot rectangle `(x, y, width, height)` in atlas pixels, padding excluded.
    pub rect: (u32, u32, u32, u32),
    pub uv: UvTransform,
}

/// One finished atlas page in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasTexture {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// Packer output; `placements[i]` belongs to the i-th input item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedAtlas {
    pub textures: Vec<AtlasTexture>,
    pub placements: Vec<Placement>,
}

/// One atlas page being filled: an `etagere` allocator plus the extent used so far.
struct Bin {
    allocator: etagere::AtlasAllocator,
    used_width: u32,
    used_height: u32,
}

impl Bin {
    fn new(width: u32, height: u32) -> Option<Self> {
        let size = etagere::size2(i32::try_from(width).ok()?, i32::try_from(height).ok()?);
        Some(Self {
            allocator: etagere::AtlasAllocator::new(size),
            used_width: 0,
            used_height: 0,
        })
    }

    /// Reserve a `w` x `h` slot and return its top-left corner.
    fn allocate(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let size = etagere::size2(i32::try_from(w).ok()?, i32::try_from(h).ok()?);
        let alloc = self.allocator.allocate(size)?;
        let x = u32::try_from(alloc.rectangle.min.x).ok()?;
        let y = u32::try_from(alloc.rectangle.min.y).ok()?;
        self.used_width = self.used_width.max(x + w);
        self.used_height = self.used_height.max(y + h);
        Some((x, y))
    }
}

/// Slot footprint of a `w` x `h` image: padding on every side, clipped to the page so an
/// image as large as the page still gets one.
fn slot_size(w: u32, h: u32, pad: u32, config: &AtlasConfig) -> Option<(u32, u32)> {
    if w > config.max_width || h > config.max_height {
        return None;
    }
    Some((
        w.saturating_add(pad.saturating_mul(2)).min(config.max_width),
        h.saturating_add(pad.saturating_mul(2)).min(config.max_height),
    ))
}

/// A validated, resampled request ready for placement.
struct Prepared {
    /// Pixels as they will land in the atlas.
    image: PreparedImage,
    /// Pixels as requested, before resampling.
    original: PreparedImage,
    swatch: bool,
}

/// Pack `items` into as many atlas pages as needed.
///
/// Identical images and identical swatch colors share one slot. `progress` receives the number
/// of items placed so far, in increasing order, as each slot lands.
#[tracing::instrument(level = "debug", skip_all, fields(items = items.len()))]
pub fn pack_atlas(
    items: &[AtlasItem],
    config: &AtlasConfig,
    progress: &mut dyn FnMut(usize),
) -> Result<PackedAtlas, PackFailure> {
    if config.max_width == 0
        || config.max_height == 0
        || !config.scale_factor.is_finite()
        || config.scale_factor <= 0.0
    {
        return Err(PackFailure {
            reason: PackagingReason::Unknown,
            index: None,
        });
    }

    // Distinct slots; `slot_of[i]` points at the slot of item `i`.
    let mut slots: Vec<Prepared> = Vec::new();
    let mut slot_of: Vec<usize> = Vec::with_capacity(items.len());
    let mut swatch_slot: HashMap<u32, usize> = HashMap::new();
    let mut image_slot: HashMap<(u32, u32, u64), Vec<usize>> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let slot = match item {
            AtlasItem::Image { image, .. } => {
                if !image.is_well_formed() {
                    return Err(PackFailure::at(PackagingReason::UnsupportedImage, index));
                }
                let key = (
                    image.width,
                    image.height,
                    xxhash_rust::xxh3::xxh3_64(&image.rgba8_premul),
                );
                let candidates = image_slot.entry(key).or_default();
                match candidates.iter().copied().find(|&s| slots[s].original == *image) {
                    Some(s) => s,
                    None => {
                        let (w, h) = scaled_size(image, config.scale_factor)
                            .filter(|&(w, h)| fits_page(w, h, config))
                            .ok_or(PackFailure::at(PackagingReason::TooBigImage, index))?;
                        let prepared = Prepared {
                            image: resample(image, w, h),
                            original: image.clone(),
                            swatch: false,
                        };
                        slots.push(prepared);
                        candidates.push(slots.len() - 1);
                        slots.len() - 1
                    }
                }
            }
            AtlasItem::Swatch { color, polygons } => {
                let valid = polygons.iter().all(|poly| {
                    poly.len() >= 3 && poly.iter().all(|p| p.x.is_finite() && p.y.is_finite())
                });
                if !valid {
                    return Err(PackFailure::at(PackagingReason::InvalidPolygon, index));
                }
                *swatch_slot.entry(color.to_u32()).or_insert_with(|| {
                    let image = PreparedImage::new(1, 1, color.to_premul().to_vec());
                    slots.push(Prepared {
                        original: image.clone(),
                        image,
                        swatch: true,
                    });
                    slots.len() - 1
                })
            }
        };
        slot_of.push(slot);
    }

    let mut users = vec![0usize; slots.len()];
    for &s in &slot_of {
        users[s] += 1;
    }
    let first_item_of = |slot: usize| slot_of.iter().position(|&s| s == slot);

    // Largest first leaves fewer gaps; ties keep input order.
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|&s| {
        let img = &slots[s].image;
        std::cmp::Reverse(img.width.max(img.height))
    });

    let pad = config.padding;
    let mut bins: Vec<Bin> = Vec::new();
    let mut slot_place: Vec<Option<(usize, u32, u32, bool)>> = vec![None; slots.len()];
    let mut placed_items = 0usize;

    for &s in &order {
        let (w, h) = (slots[s].image.width, slots[s].image.height);
        let upright = slot_size(w, h, pad, config);
        let turned = if w != h { slot_size(h, w, pad, config) } else { None };
        if upright.is_none() && turned.is_none() {
            return Err(PackFailure {
                reason: PackagingReason::TooBigImage,
                index: first_item_of(s),
            });
        }

        let mut placed = None;
        for (bi, bin) in bins.iter_mut().enumerate() {
            placed = place_in(bin, upright, turned).map(|p| (bi, p));
            if placed.is_some() {
                break;
            }
        }
        let (bi, (x, y, rotated)) = match placed {
            Some(p) => p,
            None => {
                let unknown = PackFailure {
                    reason: PackagingReason::Unknown,
                    index: first_item_of(s),
                };
                let mut bin = Bin::new(config.max_width, config.max_height).ok_or(unknown)?;
                let p = place_in(&mut bin, upright, turned).ok_or(unknown)?;
                bins.push(bin);
                (bins.len() - 1, p)
            }
        };
        let (sw, sh) = if rotated {
            turned.unwrap_or((h, w))
        } else {
            upright.unwrap_or((w, h))
        };
        let (iw, ih) = if rotated { (h, w) } else { (w, h) };
        slot_place[s] = Some((bi, x + (sw - iw) / 2, y + (sh - ih) / 2, rotated));

        placed_items += users[s];
        progress(placed_items);
    }

    let mut textures: Vec<AtlasTexture> = bins
        .iter()
        .map(|b| {
            let width = b.used_width.max(1);
            let height = b.used_height.max(1);
            AtlasTexture {
                width,
                height,
                rgba8_premul: vec![0; width as usize * height as usize * 4],
            }
        })
        .collect();

    let mut slot_uv: Vec<Option<Placement>> = vec![None; slots.len()];
    for (s, place) in slot_place.iter().enumerate() {
        let Some((bi, x, y, rotated)) = *place else {
            continue;
        };
        let prepared = &slots[s];
        let img = &prepared.image;
        blit(&mut textures[bi], img, x, y, rotated);

        let (w, h) = if rotated {
            (img.height, img.width)
        } else {
            (img.width, img.height)
        };
        let uv = if prepared.swatch {
            UvTransform::Solid {
                center: Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5),
            }
        } else {
            UvTransform::Sprite {
                scale_x: f64::from(img.width) / f64::from(prepared.original.width),
                scale_y: f64::from(img.height) / f64::from(prepared.original.height),
                rotated,
                x,
                y,
                scaled_height: img.height,
            }
        };
        slot_uv[s] = Some(Placement {
            texture: bi,
            rect: (x, y, w, h),
            uv,
        });
    }

    let mut placements = Vec::with_capacity(items.len());
    for (index, &s) in slot_of.iter().enumerate() {
        let placement = slot_uv[s].ok_or(PackFailure::at(PackagingReason::Unknown, index))?;
        placements.push(placement);
    }

    tracing::debug!(
        textures = textures.len(),
        slots = slots.len(),
        "atlas packed"
    );
    Ok(PackedAtlas {
        textures,
        placements,
    })
}

/// Upright first, then turned; returns the slot corner and whether it is turned.
fn place_in(
    bin: &mut Bin,
    upright: Option<(u32, u32)>,
    turned: Option<(u32, u32)>,
) -> Option<(u32, u32, bool)> {
    if let Some((w, h)) = upright
        && let Some((x, y)) = bin.allocate(w, h)
    {
        return Some((x, y, false));
    }
    let (w, h) = turned?;
    bin.allocate(w, h).map(|(x, y)| (x, y, true))
}

/// Size of `image` after resampling by `scale`, or `None` when it does not fit `u32`.
fn scaled_size(image: &PreparedImage, scale: f64) -> Option<(u32, u32)> {
    if (scale - 1.0).abs() < f64::EPSILON {
        return Some((image.width, image.height));
    }
    let w = (f64::from(image.width) * scale).round().max(1.0);
    let h = (f64::from(image.height) * scale).round().max(1.0);
    if w > f64::from(u32::MAX) || h > f64::from(u32::MAX) {
        return None;
    }
    Some((w as u32, h as u32))
}

/// Whether a `w` x `h` image fits an empty page in either orientation.
fn fits_page(w: u32, h: u32, config: &AtlasConfig) -> bool {
    (w <= config.max_width && h <= config.max_height)
        || (h <= config.max_width && w <= config.max_height)
}

fn resample(image: &PreparedImage, w: u32, h: u32) -> PreparedImage {
    if (w, h) == (image.width, image.height) {
        return image.clone();
    }
    let Some(src) =
        image::RgbaImage::from_raw(image.width, image.height, image.rgba8_premul.to_vec())
    else {
        return image.clone();
    };
    let out = image::imageops::resize(&src, w, h, image::imageops::FilterType::Triangle);
    PreparedImage::new(w, h, out.into_raw())
}

/// Copy `img` into `tex` at (`x`, `y`), rotated 90 degrees clockwise when asked.
fn blit(tex: &mut AtlasTexture, img: &PreparedImage, x: u32, y: u32, rotated: bool) {
    let (iw, ih) = (img.width as usize, img.height as usize);
    let tw = tex.width as usize;
    for sy in 0..ih {
        for sx in 0..iw {
            let (dx, dy) = if rotated {
                (ih - 1 - sy, sx)
            } else {
                (sx, sy)
            };
            let si = (sy * iw + sx) * 4;
            let di = ((y as usize + dy) * tw + x as usize + dx) * 4;
            tex.rgba8_premul[di..di + 4].copy_from_slice(&img.rgba8_premul[si..si + 4]);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/packer.rs"]
mod tests;
