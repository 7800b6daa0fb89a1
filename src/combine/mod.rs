pub(crate) mod op;
pub(crate) mod reference;
