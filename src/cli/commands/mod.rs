//! CLI command implementations.

mod config;
mod fuse;
mod windows;

pub use config::run_config;
pub use fuse::run_fuse;
pub use windows::run_windows;
