pub mod executor;
pub mod playback;
pub mod script;
pub mod stages;
pub mod table;
pub mod views;
