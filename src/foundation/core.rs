pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Straight-alpha RGBA8 color as supplied by the authoring host.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Construct a color from straight-alpha channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Return `true` when the color has no coverage at all.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Convert to premultiplied RGBA8 bytes.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    /// Pack as `0xRRGGBBAA`.
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Unpack from `0xRRGGBBAA`.
    pub fn from_u32(v: u32) -> Self {
        let [r, g, b, a] = v.to_be_bytes();
        Self { r, g, b, a }
    }
}

/// Decoded raster image in premultiplied RGBA8 form.
///
/// Pixels are shared, so cloning an image is cheap and two items referencing the same bitmap
/// point at the same buffer.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: std::sync::Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap an existing premultiplied buffer.
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba8_premul: std::sync::Arc::new(rgba8_premul),
        }
    }

    /// Return `true` when the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba8_premul.len()
                == (self.width as usize)
                    .saturating_mul(self.height as usize)
                    .saturating_mul(4)
    }
}

impl PartialEq for PreparedImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (std::sync::Arc::ptr_eq(&self.rgba8_premul, &other.rgba8_premul)
                || self.rgba8_premul == other.rgba8_premul)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
