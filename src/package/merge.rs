use crate::foundation::error::{PackError, PackResult};
use crate::package::model::Package;
use crate::package::texture::{PixelFormat, TextureEncoding};

/// Append `fresh` to `existing`, shifting every fresh id and index past the existing ones.
///
/// Existing textures are re-tagged with `format` and `encoding` so the merged package is
/// written uniformly. Flags come from `fresh`. The merged package is built separately and only
/// returned when every shift fits the record widths.
#[tracing::instrument(level = "debug", skip_all, fields(
    existing = existing.record_count(),
    fresh = fresh.record_count(),
))]
pub fn merge_packages(
    existing: Package,
    fresh: Package,
    format: PixelFormat,
    encoding: TextureEncoding,
) -> PackResult<Package> {
    let id_offset = existing.max_id().map_or(0u32, |m| u32::from(m) + 1);
    let bank_offset = existing.matrix_banks.len();
    let texture_offset = existing.textures.len();

    let shift_id = |id: u16| shift(u32::from(id), id_offset as usize, "symbol id");
    let mut out = existing;

    for t in &mut out.textures {
        t.pixel_format = format;
        t.encoding = encoding;
    }

    for mut m in fresh.movieclips {
        m.id = shift_id(m.id)?;
        m.bank_index = shift(u32::from(m.bank_index), bank_offset, "matrix bank index")?;
        for c in &mut m.children {
            c.id = shift_id(c.id)?;
        }
        out.movieclips.push(m);
    }
    for mut m in fresh.modifiers {
        m.id = shift_id(m.id)?;
        out.modifiers.push(m);
    }
    for mut t in fresh.textfields {
        t.id = shift_id(t.id)?;
        out.textfields.push(t);
    }
    for mut s in fresh.shapes {
        s.id = shift_id(s.id)?;
        for c in &mut s.commands {
            c.texture_index = shift(u32::from(c.texture_index), texture_offset, "texture index")?;
        }
        out.shapes.push(s);
    }
    for mut e in fresh.exports {
        e.id = shift_id(e.id)?;
        out.exports.push(e);
    }

    out.textures.extend(fresh.textures);
    out.matrix_banks.extend(fresh.matrix_banks);
    if out.matrix_banks.len() > usize::from(u16::MAX) + 1 {
        return Err(PackError::validation("matrix bank count exceeds u16"));
    }
    if out.textures.len() > usize::from(u16::MAX) + 1 {
        return Err(PackError::validation("texture count exceeds u16"));
    }
    out.flags = fresh.flags;

    tracing::debug!(id_offset, bank_offset, texture_offset, "packages merged");
    Ok(out)
}

fn shift(value: u32, offset: usize, what: &str) -> PackResult<u16> {
    u16::try_from(value as usize + offset)
        .map_err(|_| PackError::validation(format!("{what} {value} + {offset} overflows u16")))
}

#[cfg(test)]
#[path = "../../tests/unit/package/merge.rs"]
mod tests;
