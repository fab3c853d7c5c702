pub(crate) mod codec;
pub(crate) mod merge;
pub(crate) mod model;
pub(crate) mod save;
pub(crate) mod texture;
