pub mod audio;
pub mod cli;
pub mod render;
