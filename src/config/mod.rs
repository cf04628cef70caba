//! Configuration module for the LingoLink client.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the capture and
//! relay subsystems, `AppPaths` for cross-platform config directories, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, RelayConfig};
