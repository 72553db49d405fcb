pub mod encounter;
pub mod review;
pub mod vocab;
