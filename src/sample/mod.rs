pub(crate) mod fetch;
pub(crate) mod repeat;
pub(crate) mod scanline;
