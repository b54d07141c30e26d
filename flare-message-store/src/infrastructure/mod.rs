pub mod persistence;
pub mod resolver;
