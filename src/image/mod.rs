pub(crate) mod filter;
pub(crate) mod format;
pub(crate) mod model;
pub(crate) mod transform;
