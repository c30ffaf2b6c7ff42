//! Data models for ListMaker.
//!
//! - [`StatusNode`] / [`Status`]: the status tree built by the resolver and persisted in
//!   completion markers
//! - [`SettingsFile`]: the on-disk shape of `listMaker_settings.xml`
//! - [`Settings`]: settings after path resolution
//! - [`ScanOptions`]: the read-only configuration handed to the resolver (ignore list,
//!   stop words, manifest name, detail-count convention)

pub mod config;
pub mod status;

pub use config::{
    DetailCountConvention, IgnoreDir, IgnoreDirList, ScanOptions, Settings, SettingsError,
    SettingsFile, DEFAULT_REPORT_FILE, DEFAULT_STOP_WORDS, MANIFEST_FILE_NAME,
};
pub use status::{Status, StatusNode, UnknownStatus};
