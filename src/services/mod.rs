//! Services module - the order-processing pipeline.
//!
//! Everything here works on plain paths and values; nothing keeps global state. The only
//! thing shared across a run is a [`ScanMetrics`](crate::metrics::ScanMetrics) reference.
//!
//! # Components
//!
//! - [`naming`]: pure metadata extraction from file names (detail count, ready date,
//!   sort key, stop words)
//! - [`manifest`]: ordering of job files and the `list.xml` work list
//! - [`panels`]: in-place renaming of panels inside part descriptor files
//! - [`report_codec`]: the `order_ready_YYYYMMDD.xml` completion marker format
//! - [`resolver`]: the recursive status walk that drives the modules above
//! - [`work_report`]: the text report of all orders
//! - [`relocation`]: moving finished orders into `<target>/<YYYY-MM>`
//! - [`workflow`]: one complete run
//!
//! # Usage Example
//!
//! ```ignore
//! use listmaker::metrics::ScanMetrics;
//! use listmaker::services::workflow::{self, RunOptions};
//!
//! let metrics = ScanMetrics::new();
//! let summary = workflow::run(&settings, &settings.source_dir, RunOptions::default(), &metrics)?;
//! for order in &summary.orders {
//!     println!("{}: {}", order.item_name, order.status);
//! }
//! ```

pub mod manifest;
pub mod naming;
pub mod panels;
pub mod relocation;
pub mod report_codec;
pub mod resolver;
pub mod work_report;
pub mod workflow;

pub use manifest::{FileFormat, ManifestError};
pub use panels::{PanelError, PanelRecord, PanelRewrite, PartDescriptor};
pub use relocation::{RelocationError, RelocationSummary};
pub use report_codec::ReportCodecError;
pub use resolver::{LocalPlan, StatusResolver};
pub use workflow::{RunOptions, RunSummary};
