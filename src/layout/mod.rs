pub mod context;
pub mod tokens;
