use serde::{Deserialize, Serialize};

use crate::assets::decode::{decode_image, encode_png};
use crate::foundation::error::{PackError, PackResult};

/// Pixel layout of a raw texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgba8,
    Rgba4,
    Rgb5A1,
}

impl PixelFormat {
    pub fn tag(self) -> u8 {
        match self {
            Self::Rgba8 => 0,
            Self::Rgba4 => 1,
            Self::Rgb5A1 => 2,
        }
    }

    pub fn from_tag(tag: u8) -> PackResult<Self> {
        match tag {
            0 => Ok(Self::Rgba8),
            1 => Ok(Self::Rgba4),
            2 => Ok(Self::Rgb5A1),
            other => Err(PackError::decode(format!("unknown pixel format tag {other}"))),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgba4 | Self::Rgb5A1 => 2,
        }
    }
}

/// Storage of texture pixels inside the package.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TextureEncoding {
    /// Pixel-format tagged bytes.
    #[default]
    Raw,
    /// Opaque PNG blob; the pixel format is ignored.
    Compressed,
}

impl TextureEncoding {
    pub fn tag(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Compressed => 1,
        }
    }

    pub fn from_tag(tag: u8) -> PackResult<Self> {
        match tag {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Compressed),
            other => Err(PackError::decode(format!("unknown texture encoding tag {other}"))),
        }
    }
}

/// Quality tier selecting the raw pixel format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TextureQuality {
    #[default]
    Highest,
    High,
    Medium,
    Low,
}

impl TextureQuality {
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Highest => PixelFormat::Rgba8,
            Self::High | Self::Medium => PixelFormat::Rgba4,
            Self::Low => PixelFormat::Rgb5A1,
        }
    }
}

/// Encode premultiplied RGBA8 pixels into `format`.
pub fn pack_pixels(rgba8_premul: &[u8], format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Rgba8 => rgba8_premul.to_vec(),
        PixelFormat::Rgba4 => rgba8_premul
            .chunks_exact(4)
            .flat_map(|p| {
                let v = (u16::from(p[0] >> 4) << 12)
                    | (u16::from(p[1] >> 4) << 8)
                    | (u16::from(p[2] >> 4) << 4)
                    | u16::from(p[3] >> 4);
                v.to_le_bytes()
            })
            .collect(),
        PixelFormat::Rgb5A1 => rgba8_premul
            .chunks_exact(4)
            .flat_map(|p| {
                let v = (u16::from(p[0] >> 3) << 11)
                    | (u16::from(p[1] >> 3) << 6)
                    | (u16::from(p[2] >> 3) << 1)
                    | u16::from(p[3] >= 128);
                v.to_le_bytes()
            })
            .collect(),
    }
}

/// Expand `format` bytes back to RGBA8.
pub fn unpack_pixels(bytes: &[u8], format: PixelFormat) -> Vec<u8> {
    fn expand4(v: u16) -> u8 {
        (v & 0xF) as u8 * 17
    }
    fn expand5(v: u16) -> u8 {
        let v = (v & 0x1F) as u8;
        (v << 3) | (v >> 2)
    }

    match format {
        PixelFormat::Rgba8 => bytes.to_vec(),
        PixelFormat::Rgba4 => bytes
            .chunks_exact(2)
            .flat_map(|b| {
                let v = u16::from_le_bytes([b[0], b[1]]);
                [expand4(v >> 12), expand4(v >> 8), expand4(v >> 4), expand4(v)]
            })
            .collect(),
        PixelFormat::Rgb5A1 => bytes
            .chunks_exact(2)
            .flat_map(|b| {
                let v = u16::from_le_bytes([b[0], b[1]]);
                [
                    expand5(v >> 11),
                    expand5(v >> 6),
                    expand5(v >> 1),
                    if v & 1 == 1 { 255 } else { 0 },
                ]
            })
            .collect(),
    }
}

/// Encoded texture payload as stored in the package or an external file.
pub fn encode_texture(
    width: u32,
    height: u32,
    rgba8_premul: &[u8],
    format: PixelFormat,
    encoding: TextureEncoding,
) -> PackResult<Vec<u8>> {
    match encoding {
        TextureEncoding::Raw => Ok(pack_pixels(rgba8_premul, format)),
        TextureEncoding::Compressed => encode_png(width, height, rgba8_premul),
    }
}

/// Inverse of [`encode_texture`].
pub fn decode_texture(
    width: u32,
    height: u32,
    payload: &[u8],
    format: PixelFormat,
    encoding: TextureEncoding,
) -> PackResult<Vec<u8>> {
    let expected = width as usize * height as usize;
    let pixels = match encoding {
        TextureEncoding::Raw => {
            if payload.len() != expected * format.bytes_per_pixel() {
                return Err(PackError::decode(format!(
                    "raw texture payload is {} bytes, expected {} for {width}x{height} {format:?}",
                    payload.len(),
                    expected * format.bytes_per_pixel()
                )));
            }
            unpack_pixels(payload, format)
        }
        TextureEncoding::Compressed => {
            let img = decode_image(payload)
                .map_err(|e| PackError::decode(format!("compressed texture: {e:#}")))?;
            if (img.width, img.height) != (width, height) {
                return Err(PackError::decode(format!(
                    "compressed texture is {}x{}, record says {width}x{height}",
                    img.width, img.height
                )));
            }
            img.rgba8_premul.to_vec()
        }
    };
    Ok(pixels)
}

/// Half-size copy used for low-resolution sidecars.
pub fn downscale_half(width: u32, height: u32, rgba8_premul: &[u8]) -> (u32, u32, Vec<u8>) {
    let w = width.div_ceil(2).max(1);
    let h = height.div_ceil(2).max(1);
    match image::RgbaImage::from_raw(width, height, rgba8_premul.to_vec()) {
        Some(src) => {
            let out = image::imageops::resize(&src, w, h, image::imageops::FilterType::Triangle);
            (w, h, out.into_raw())
        }
        None => (width, height, rgba8_premul.to_vec()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/package/texture.rs"]
mod tests;
