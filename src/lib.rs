// ListMaker - work lists and order tracking for a panel cutting shop
//
// This is the library crate containing the order-processing pipeline.
// The binary crate (main.rs) provides the command-line entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, SettingsLoad};
pub use metrics::ScanMetrics;
pub use models::{ScanOptions, Settings, Status, StatusNode};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
