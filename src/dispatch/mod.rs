pub(crate) mod fast_path;
pub(crate) mod flags;
pub(crate) mod implementation;
