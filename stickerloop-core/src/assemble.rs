pub(crate) mod apng;
pub(crate) mod assembler;
pub(crate) mod quantize;
