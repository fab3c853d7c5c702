use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::{Affine, PreparedImage, Rect};
use crate::graphic::item::{GraphicGroup, GraphicItem};

const XXH3_SEED: u64 = 0x5c9a_17e3_40d2_b86f;

/// 128-bit content digest of a graphic group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupDigest {
    pub hi: u64,
    pub lo: u64,
}

/// Digest every item of `group`: transforms, bitmap pixels and guides, fill colors and points.
///
/// Symbol id and name are not part of the digest, so identical art under two names collides
/// on purpose.
pub fn digest_group(group: &GraphicGroup) -> GroupDigest {
    let mut h = StableHasher::new();
    h.write_u32(group.items.len() as u32);
    for item in &group.items {
        write_item(&mut h, item);
    }
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn finish(self) -> GroupDigest {
        let v = self.inner.digest128();
        GroupDigest {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

fn write_item(h: &mut StableHasher, item: &GraphicItem) {
    match item {
        GraphicItem::Bitmap(b) => {
            h.write_u8(0);
            write_affine(h, b.transform);
            write_image(h, &b.image);
        }
        GraphicItem::Filled(f) => {
            h.write_u8(1);
            write_affine(h, f.transform);
            h.write_u32(f.color.to_u32());
            h.write_u32(f.polygons.len() as u32);
            for poly in &f.polygons {
                h.write_u32(poly.len() as u32);
                for p in poly {
                    h.write_f64(p.x);
                    h.write_f64(p.y);
                }
            }
        }
        GraphicItem::Sliced(s) => {
            h.write_u8(2);
            write_affine(h, s.transform);
            write_image(h, &s.image);
            write_rect(h, s.guides);
        }
    }
}

fn write_affine(h: &mut StableHasher, a: Affine) {
    for c in a.as_coeffs() {
        h.write_f64(c);
    }
}

fn write_rect(h: &mut StableHasher, r: Rect) {
    h.write_f64(r.x0);
    h.write_f64(r.y0);
    h.write_f64(r.x1);
    h.write_f64(r.y1);
}

fn write_image(h: &mut StableHasher, img: &PreparedImage) {
    h.write_u32(img.width);
    h.write_u32(img.height);
    h.write_bytes(&img.rgba8_premul);
}

#[cfg(test)]
#[path = "../../tests/unit/graphic/hash.rs"]
mod tests;
