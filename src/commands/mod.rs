pub mod count;
pub mod validate;
