use std::fmt;

/// Convenience result type used across scpack.
pub type PackResult<T> = Result<T, PackError>;

/// Reason reported by the atlas packer when an item cannot be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackagingReason {
    /// The image decoded, but its pixel layout cannot be packed.
    UnsupportedImage,
    /// Fill geometry is degenerate or not finite.
    InvalidPolygon,
    /// A single item does not fit into an empty atlas of the configured maximum size.
    TooBigImage,
    /// Any other internal packer failure.
    Unknown,
}

impl fmt::Display for PackagingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnsupportedImage => "unsupported image",
            Self::InvalidPolygon => "invalid polygon",
            Self::TooBigImage => "image is too big for the atlas",
            Self::Unknown => "unknown packaging failure",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum PackError {
    /// Invalid scene descriptors, configuration or index overflow.
    #[error("validation error: {0}")]
    Validation(String),

    /// A precondition of the export job does not hold (for example a missing merge file).
    #[error("precondition failure: {0}")]
    Precondition(String),

    /// The atlas packer rejected an item; `symbol` names the owning shape when resolvable.
    #[error("[AtlasGenerator] {reason} {}", symbol_label(.symbol))]
    Packaging {
        /// Failure class reported by the packer.
        reason: PackagingReason,
        /// Name of the symbol owning the failing item.
        symbol: Option<String>,
    },

    /// I/O failure while writing or reading a package.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Malformed package bytes or undecodable bitmap data.
    #[error("decode error: {0}")]
    Decode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn symbol_label(symbol: &Option<String>) -> String {
    match symbol {
        Some(name) => format!("(symbol '{name}')"),
        None => "(unknown symbol)".to_string(),
    }
}

impl PackError {
    /// Build a [`PackError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PackError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`PackError::Packaging`] value.
    pub fn packaging(reason: PackagingReason, symbol: Option<String>) -> Self {
        Self::Packaging { reason, symbol }
    }

    /// Build a [`PackError::Serialization`] value.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Build a [`PackError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
