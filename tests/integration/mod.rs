//! Integration test modules for Solo

pub mod audio;
pub mod loading;
pub mod presets;
pub mod shared;
