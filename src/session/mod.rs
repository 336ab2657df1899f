pub mod mount;
pub mod player;
