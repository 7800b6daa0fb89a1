pub(crate) mod error;
pub(crate) mod fixed;
pub(crate) mod math;
