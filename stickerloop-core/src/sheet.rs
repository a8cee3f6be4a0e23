pub(crate) mod cutter;
