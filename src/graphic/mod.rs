pub(crate) mod builder;
pub(crate) mod hash;
pub(crate) mod item;
