use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PackError, PackResult};
use crate::package::model::{
    DrawCommand, ExportName, FrameElement, MatrixBank, Modifier, MovieClip, MovieClipChild,
    MovieClipFrame, Package, PackageFlags, Shape, TextField, Texture, Vertex,
};
use crate::package::texture::{PixelFormat, TextureEncoding, decode_texture, encode_texture};
use crate::scene::model::{ColorTransform, ModifierKind, TextAlign};

/// Leading bytes of a package file.
pub const PACKAGE_MAGIC: &[u8; 4] = b"SCPK";
/// Leading bytes of a texture sidecar file.
pub const TEXTURE_MAGIC: &[u8; 4] = b"SCTX";
pub const FORMAT_VERSION: u16 = 1;

/// Payload compression applied at save time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    #[default]
    Zlib,
    Gzip,
}

impl Compression {
    fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
            Self::Gzip => 2,
        }
    }

    fn from_tag(tag: u8) -> PackResult<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            2 => Ok(Self::Gzip),
            other => Err(PackError::decode(format!("unknown compression tag {other}"))),
        }
    }
}

/// Where the pixels of one texture record live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureStorage {
    /// Payload follows the record.
    Inline,
    /// Payload lives in the texture sidecar, in record order.
    Sidecar,
    /// Payload is a standalone file next to the package.
    File(String),
}

impl TextureStorage {
    fn tag(&self) -> u8 {
        match self {
            Self::Inline => 0,
            Self::Sidecar => 1,
            Self::File(_) => 2,
        }
    }
}

/// Encode the main package file. `storage[i]` decides where texture `i` goes; non-inline
/// payloads must be written by the caller.
pub fn encode_package(
    pkg: &Package,
    storage: &[TextureStorage],
    compression: Compression,
) -> PackResult<Vec<u8>> {
    if storage.len() != pkg.textures.len() {
        return Err(PackError::validation(format!(
            "{} texture storage entries for {} textures",
            storage.len(),
            pkg.textures.len()
        )));
    }
    let mut payload = Vec::new();
    write_package(&mut payload, pkg, storage).map_err(ser_err)?;
    frame(PACKAGE_MAGIC, &payload, compression)
}

/// Decode a main package file.
///
/// Textures stored outside the file come back with empty pixels; the returned storage list
/// says where to find them.
pub fn decode_package(bytes: &[u8]) -> PackResult<(Package, Vec<TextureStorage>)> {
    let payload = unframe(PACKAGE_MAGIC, bytes)?;
    let mut r = Cursor::new(payload.as_slice());
    let out = read_package(&mut r).map_err(de_err)?;
    if (r.position() as usize) != payload.len() {
        return Err(PackError::decode("trailing bytes after package payload"));
    }
    Ok(out)
}

/// Encode a texture sidecar holding every texture payload in order.
pub fn encode_texture_file(textures: &[Texture], compression: Compression) -> PackResult<Vec<u8>> {
    let mut payload = Vec::new();
    payload
        .write_u32::<LE>(textures.len() as u32)
        .map_err(ser_err)?;
    for t in textures {
        let blob = encode_texture(t.width, t.height, &t.rgba8_premul, t.pixel_format, t.encoding)?;
        write_texture_header(&mut payload, t).map_err(ser_err)?;
        write_blob(&mut payload, &blob).map_err(ser_err)?;
    }
    frame(TEXTURE_MAGIC, &payload, compression)
}

/// Decode a texture sidecar.
pub fn decode_texture_file(bytes: &[u8]) -> PackResult<Vec<Texture>> {
    let payload = unframe(TEXTURE_MAGIC, bytes)?;
    let mut r = Cursor::new(payload.as_slice());
    let count = r.read_u32::<LE>().map_err(de_err)?;
    let mut out = Vec::new();
    for _ in 0..count {
        let mut t = read_texture_header(&mut r).map_err(de_err)?;
        let blob = read_blob(&mut r).map_err(de_err)?;
        t.rgba8_premul = decode_texture(t.width, t.height, &blob, t.pixel_format, t.encoding)?;
        out.push(t);
    }
    Ok(out)
}

fn ser_err(e: io::Error) -> PackError {
    PackError::serialization(e.to_string())
}

fn de_err(e: io::Error) -> PackError {
    PackError::decode(e.to_string())
}

fn frame(magic: &[u8; 4], payload: &[u8], compression: Compression) -> PackResult<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(magic);
    out.write_u16::<LE>(FORMAT_VERSION).map_err(ser_err)?;
    out.write_u8(compression.tag()).map_err(ser_err)?;
    match compression {
        Compression::None => out.extend_from_slice(payload),
        Compression::Zlib => {
            let mut enc = flate2::write::ZlibEncoder::new(out, flate2::Compression::default());
            enc.write_all(payload).map_err(ser_err)?;
            out = enc.finish().map_err(ser_err)?;
        }
        Compression::Gzip => {
            let mut enc = flate2::write::GzEncoder::new(out, flate2::Compression::default());
            enc.write_all(payload).map_err(ser_err)?;
            out = enc.finish().map_err(ser_err)?;
        }
    }
    Ok(out)
}

fn unframe(magic: &[u8; 4], bytes: &[u8]) -> PackResult<Vec<u8>> {
    if bytes.len() < 7 || &bytes[..4] != magic {
        return Err(PackError::decode(format!(
            "missing '{}' header",
            String::from_utf8_lossy(magic)
        )));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(PackError::decode(format!(
            "unsupported format version {version}"
        )));
    }
    let body = &bytes[7..];
    let mut out = Vec::new();
    match Compression::from_tag(bytes[6])? {
        Compression::None => out.extend_from_slice(body),
        Compression::Zlib => {
            flate2::read::ZlibDecoder::new(body)
                .read_to_end(&mut out)
                .map_err(de_err)?;
        }
        Compression::Gzip => {
            flate2::read::GzDecoder::new(body)
                .read_to_end(&mut out)
                .map_err(de_err)?;
        }
    }
    Ok(out)
}

// Primitive writers.

fn write_len<W: Write>(w: &mut W, len: usize) -> io::Result<()> {
    let n = u32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "array longer than u32"))?;
    w.write_u32::<LE>(n)
}

fn write_str<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    let n = u16::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string longer than u16"))?;
    w.write_u16::<LE>(n)?;
    w.write_all(s.as_bytes())
}

fn write_opt_str<W: Write>(w: &mut W, s: Option<&str>) -> io::Result<()> {
    match s {
        Some(s) => {
            w.write_u8(1)?;
            write_str(w, s)
        }
        None => w.write_u8(0),
    }
}

fn write_blob<W: Write>(w: &mut W, b: &[u8]) -> io::Result<()> {
    write_len(w, b.len())?;
    w.write_all(b)
}

fn read_len<R: Read>(r: &mut R) -> io::Result<usize> {
    Ok(r.read_u32::<LE>()? as usize)
}

fn read_str<R: Read>(r: &mut R) -> io::Result<String> {
    let n = r.read_u16::<LE>()? as usize;
    let mut buf = vec![0; n];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn read_opt_str<R: Read>(r: &mut R) -> io::Result<Option<String>> {
    match r.read_u8()? {
        0 => Ok(None),
        _ => read_str(r).map(Some),
    }
}

fn read_blob<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let n = read_len(r)?;
    let mut buf = Vec::new();
    r.by_ref().take(n as u64).read_to_end(&mut buf)?;
    if buf.len() != n {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}

// Records.

const FLAG_EXTERNAL_TEXTURE: u8 = 1 << 0;
const FLAG_EXTERNAL_TEXTURE_FILES: u8 = 1 << 1;
const FLAG_LOW_RESOLUTION: u8 = 1 << 2;
const FLAG_MULTI_RESOLUTION: u8 = 1 << 3;
const FLAG_PRECISION_MATRIX: u8 = 1 << 4;
const FLAG_CUSTOM_PROPERTY: u8 = 1 << 5;

fn write_package<W: Write>(w: &mut W, pkg: &Package, storage: &[TextureStorage]) -> io::Result<()> {
    let f = &pkg.flags;
    let mut bits = 0u8;
    for (on, bit) in [
        (f.use_external_texture, FLAG_EXTERNAL_TEXTURE),
        (f.use_external_texture_files, FLAG_EXTERNAL_TEXTURE_FILES),
        (f.use_low_resolution, FLAG_LOW_RESOLUTION),
        (f.use_multi_resolution, FLAG_MULTI_RESOLUTION),
        (f.use_precision_matrix, FLAG_PRECISION_MATRIX),
        (f.save_custom_property, FLAG_CUSTOM_PROPERTY),
    ] {
        if on {
            bits |= bit;
        }
    }
    w.write_u8(bits)?;
    write_str(w, &f.low_resolution_suffix)?;
    write_str(w, &f.multi_resolution_suffix)?;

    write_len(w, pkg.textures.len())?;
    for (t, place) in pkg.textures.iter().zip(storage) {
        write_texture_header(w, t)?;
        w.write_u8(place.tag())?;
        match place {
            TextureStorage::Inline => {
                let blob = encode_texture(t.width, t.height, &t.rgba8_premul, t.pixel_format, t.encoding)
                    .map_err(|e| io::Error::other(e.to_string()))?;
                write_blob(w, &blob)?;
            }
            TextureStorage::Sidecar => {}
            TextureStorage::File(name) => write_str(w, name)?,
        }
    }

    write_len(w, pkg.shapes.len())?;
    for s in &pkg.shapes {
        write_shape(w, s)?;
    }

    write_len(w, pkg.matrix_banks.len())?;
    for b in &pkg.matrix_banks {
        write_bank(w, b, f.use_precision_matrix)?;
    }

    write_len(w, pkg.movieclips.len())?;
    for m in &pkg.movieclips {
        write_movieclip(w, m)?;
    }

    write_len(w, pkg.modifiers.len())?;
    for m in &pkg.modifiers {
        w.write_u16::<LE>(m.id)?;
        w.write_u8(modifier_tag(m.kind))?;
    }

    write_len(w, pkg.textfields.len())?;
    for t in &pkg.textfields {
        write_textfield(w, t)?;
    }

    write_len(w, pkg.exports.len())?;
    for e in &pkg.exports {
        w.write_u16::<LE>(e.id)?;
        write_str(w, &e.name)?;
    }
    Ok(())
}

fn read_package<R: Read>(r: &mut R) -> io::Result<(Package, Vec<TextureStorage>)> {
    let bits = r.read_u8()?;
    let flags = PackageFlags {
        use_external_texture: bits & FLAG_EXTERNAL_TEXTURE != 0,
        use_external_texture_files: bits & FLAG_EXTERNAL_TEXTURE_FILES != 0,
        use_low_resolution: bits & FLAG_LOW_RESOLUTION != 0,
        use_multi_resolution: bits & FLAG_MULTI_RESOLUTION != 0,
        use_precision_matrix: bits & FLAG_PRECISION_MATRIX != 0,
        save_custom_property: bits & FLAG_CUSTOM_PROPERTY != 0,
        low_resolution_suffix: read_str(r)?,
        multi_resolution_suffix: read_str(r)?,
    };
    let mut pkg = Package {
        flags,
        ..Package::default()
    };

    let mut storage = Vec::new();
    for _ in 0..read_len(r)? {
        let mut t = read_texture_header(r)?;
        let place = match r.read_u8()? {
            0 => {
                let blob = read_blob(r)?;
                t.rgba8_premul = decode_texture(t.width, t.height, &blob, t.pixel_format, t.encoding)
                    .map_err(|e| invalid(&e.to_string()))?;
                TextureStorage::Inline
            }
            1 => TextureStorage::Sidecar,
            2 => TextureStorage::File(read_str(r)?),
            _ => return Err(invalid("unknown texture storage tag")),
        };
        pkg.textures.push(t);
        storage.push(place);
    }

    for _ in 0..read_len(r)? {
        pkg.shapes.push(read_shape(r)?);
    }
    let precise = pkg.flags.use_precision_matrix;
    for _ in 0..read_len(r)? {
        pkg.matrix_banks.push(read_bank(r, precise)?);
    }
    for _ in 0..read_len(r)? {
        pkg.movieclips.push(read_movieclip(r)?);
    }
    for _ in 0..read_len(r)? {
        let id = r.read_u16::<LE>()?;
        let kind = modifier_from_tag(r.read_u8()?)?;
        pkg.modifiers.push(Modifier { id, kind });
    }
    for _ in 0..read_len(r)? {
        pkg.textfields.push(read_textfield(r)?);
    }
    for _ in 0..read_len(r)? {
        let id = r.read_u16::<LE>()?;
        let name = read_str(r)?;
        pkg.exports.push(ExportName { id, name });
    }
    Ok((pkg, storage))
}

fn write_texture_header<W: Write>(w: &mut W, t: &Texture) -> io::Result<()> {
    w.write_u32::<LE>(t.width)?;
    w.write_u32::<LE>(t.height)?;
    w.write_u8(t.pixel_format.tag())?;
    w.write_u8(t.encoding.tag())
}

fn read_texture_header<R: Read>(r: &mut R) -> io::Result<Texture> {
    let width = r.read_u32::<LE>()?;
    let height = r.read_u32::<LE>()?;
    let pixel_format = PixelFormat::from_tag(r.read_u8()?).map_err(|e| invalid(&e.to_string()))?;
    let encoding = TextureEncoding::from_tag(r.read_u8()?).map_err(|e| invalid(&e.to_string()))?;
    Ok(Texture {
        width,
        height,
        pixel_format,
        encoding,
        rgba8_premul: Vec::new(),
    })
}

fn write_shape<W: Write>(w: &mut W, s: &Shape) -> io::Result<()> {
    w.write_u16::<LE>(s.id)?;
    write_len(w, s.commands.len())?;
    for c in &s.commands {
        w.write_u16::<LE>(c.texture_index)?;
        write_len(w, c.vertices.len())?;
        for v in &c.vertices {
            w.write_f32::<LE>(v.x)?;
            w.write_f32::<LE>(v.y)?;
            w.write_f32::<LE>(v.u)?;
            w.write_f32::<LE>(v.v)?;
        }
    }
    Ok(())
}

fn read_shape<R: Read>(r: &mut R) -> io::Result<Shape> {
    let id = r.read_u16::<LE>()?;
    let mut commands = Vec::new();
    for _ in 0..read_len(r)? {
        let texture_index = r.read_u16::<LE>()?;
        let mut vertices = Vec::new();
        for _ in 0..read_len(r)? {
            vertices.push(Vertex {
                x: r.read_f32::<LE>()?,
                y: r.read_f32::<LE>()?,
                u: r.read_f32::<LE>()?,
                v: r.read_f32::<LE>()?,
            });
        }
        commands.push(DrawCommand {
            texture_index,
            vertices,
        });
    }
    Ok(Shape { id, commands })
}

fn write_bank<W: Write>(w: &mut W, b: &MatrixBank, precise: bool) -> io::Result<()> {
    write_len(w, b.matrices.len())?;
    for m in &b.matrices {
        for c in m {
            if precise {
                w.write_f64::<LE>(*c)?;
            } else {
                w.write_f32::<LE>(*c as f32)?;
            }
        }
    }
    write_len(w, b.color_transforms.len())?;
    for c in &b.color_transforms {
        for m in [c.r_mul, c.g_mul, c.b_mul, c.a_mul] {
            w.write_f32::<LE>(m)?;
        }
        for a in [c.r_add, c.g_add, c.b_add, c.a_add] {
            w.write_i16::<LE>(a)?;
        }
    }
    Ok(())
}

fn read_bank<R: Read>(r: &mut R, precise: bool) -> io::Result<MatrixBank> {
    let mut bank = MatrixBank::default();
    for _ in 0..read_len(r)? {
        let mut m = [0.0; 6];
        for c in &mut m {
            *c = if precise {
                r.read_f64::<LE>()?
            } else {
                f64::from(r.read_f32::<LE>()?)
            };
        }
        bank.matrices.push(m);
    }
    for _ in 0..read_len(r)? {
        bank.color_transforms.push(ColorTransform {
            r_mul: r.read_f32::<LE>()?,
            g_mul: r.read_f32::<LE>()?,
            b_mul: r.read_f32::<LE>()?,
            a_mul: r.read_f32::<LE>()?,
            r_add: r.read_i16::<LE>()?,
            g_add: r.read_i16::<LE>()?,
            b_add: r.read_i16::<LE>()?,
            a_add: r.read_i16::<LE>()?,
        });
    }
    Ok(bank)
}

fn write_movieclip<W: Write>(w: &mut W, m: &MovieClip) -> io::Result<()> {
    w.write_u16::<LE>(m.id)?;
    w.write_u8(m.fps)?;
    w.write_u16::<LE>(m.bank_index)?;
    write_len(w, m.children.len())?;
    for c in &m.children {
        w.write_u16::<LE>(c.id)?;
        w.write_u8(c.blend)?;
        write_opt_str(w, c.name.as_deref())?;
    }
    write_len(w, m.frames.len())?;
    for f in &m.frames {
        write_opt_str(w, f.label.as_deref())?;
        write_len(w, f.elements.len())?;
        for e in &f.elements {
            w.write_u16::<LE>(e.child_index)?;
            w.write_u16::<LE>(e.matrix_index)?;
            w.write_u16::<LE>(e.color_index)?;
        }
    }
    match m.scaling_grid {
        Some(g) => {
            w.write_u8(1)?;
            for v in g {
                w.write_f32::<LE>(v)?;
            }
        }
        None => w.write_u8(0)?,
    }
    Ok(())
}

fn read_movieclip<R: Read>(r: &mut R) -> io::Result<MovieClip> {
    let id = r.read_u16::<LE>()?;
    let fps = r.read_u8()?;
    let bank_index = r.read_u16::<LE>()?;
    let mut children = Vec::new();
    for _ in 0..read_len(r)? {
        children.push(MovieClipChild {
            id: r.read_u16::<LE>()?,
            blend: r.read_u8()?,
            name: read_opt_str(r)?,
        });
    }
    let mut frames = Vec::new();
    for _ in 0..read_len(r)? {
        let label = read_opt_str(r)?;
        let mut elements = Vec::new();
        for _ in 0..read_len(r)? {
            elements.push(FrameElement {
                child_index: r.read_u16::<LE>()?,
                matrix_index: r.read_u16::<LE>()?,
                color_index: r.read_u16::<LE>()?,
            });
        }
        frames.push(MovieClipFrame { label, elements });
    }
    let scaling_grid = match r.read_u8()? {
        0 => None,
        _ => {
            let mut g = [0.0f32; 4];
            for v in &mut g {
                *v = r.read_f32::<LE>()?;
            }
            Some(g)
        }
    };
    Ok(MovieClip {
        id,
        fps,
        bank_index,
        children,
        frames,
        scaling_grid,
    })
}

fn modifier_tag(kind: ModifierKind) -> u8 {
    match kind {
        ModifierKind::Mask => 0,
        ModifierKind::Masked => 1,
        ModifierKind::Unmasked => 2,
    }
}

fn modifier_from_tag(tag: u8) -> io::Result<ModifierKind> {
    match tag {
        0 => Ok(ModifierKind::Mask),
        1 => Ok(ModifierKind::Masked),
        2 => Ok(ModifierKind::Unmasked),
        _ => Err(invalid("unknown modifier tag")),
    }
}

fn align_tag(a: TextAlign) -> u8 {
    match a {
        TextAlign::Left => 0,
        TextAlign::Right => 1,
        TextAlign::Center => 2,
        TextAlign::Justify => 3,
    }
}

fn align_from_tag(tag: u8) -> io::Result<TextAlign> {
    match tag {
        0 => Ok(TextAlign::Left),
        1 => Ok(TextAlign::Right),
        2 => Ok(TextAlign::Center),
        3 => Ok(TextAlign::Justify),
        _ => Err(invalid("unknown text alignment tag")),
    }
}

const TEXT_BOLD: u8 = 1 << 0;
const TEXT_ITALIC: u8 = 1 << 1;
const TEXT_MULTILINE: u8 = 1 << 2;
const TEXT_DEVICE_FONT: u8 = 1 << 3;
const TEXT_AUTO_KERN: u8 = 1 << 4;
const TEXT_OUTLINE: u8 = 1 << 5;

fn write_textfield<W: Write>(w: &mut W, t: &TextField) -> io::Result<()> {
    w.write_u16::<LE>(t.id)?;
    write_str(w, &t.font_name)?;
    w.write_u32::<LE>(t.font_color)?;
    w.write_u16::<LE>(t.font_size)?;
    w.write_u8(align_tag(t.align))?;
    for b in t.bounds {
        w.write_i16::<LE>(b)?;
    }
    let mut bits = 0u8;
    for (on, bit) in [
        (t.bold, TEXT_BOLD),
        (t.italic, TEXT_ITALIC),
        (t.multiline, TEXT_MULTILINE),
        (t.device_font, TEXT_DEVICE_FONT),
        (t.auto_kern, TEXT_AUTO_KERN),
        (t.outline.is_some(), TEXT_OUTLINE),
    ] {
        if on {
            bits |= bit;
        }
    }
    w.write_u8(bits)?;
    if let Some(c) = t.outline {
        w.write_u32::<LE>(c)?;
    }
    write_str(w, &t.text)
}

fn read_textfield<R: Read>(r: &mut R) -> io::Result<TextField> {
    let id = r.read_u16::<LE>()?;
    let font_name = read_str(r)?;
    let font_color = r.read_u32::<LE>()?;
    let font_size = r.read_u16::<LE>()?;
    let align = align_from_tag(r.read_u8()?)?;
    let mut bounds = [0i16; 4];
    for b in &mut bounds {
        *b = r.read_i16::<LE>()?;
    }
    let bits = r.read_u8()?;
    let outline = if bits & TEXT_OUTLINE != 0 {
        Some(r.read_u32::<LE>()?)
    } else {
        None
    };
    let text = read_str(r)?;
    Ok(TextField {
        id,
        text,
        font_name,
        font_color,
        font_size,
        align,
        bounds,
        bold: bits & TEXT_BOLD != 0,
        italic: bits & TEXT_ITALIC != 0,
        outline,
        multiline: bits & TEXT_MULTILINE != 0,
        device_font: bits & TEXT_DEVICE_FONT != 0,
        auto_kern: bits & TEXT_AUTO_KERN != 0,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/package/codec.rs"]
mod tests;
