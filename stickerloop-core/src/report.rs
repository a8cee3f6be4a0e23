pub(crate) mod loop_score;
pub(crate) mod validate;
