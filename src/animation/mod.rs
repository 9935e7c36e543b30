pub mod base;
pub mod ease;
