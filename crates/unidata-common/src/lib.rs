//! Unidata Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error taxonomy and logging setup for the unidata workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`UnidataError`], the failure taxonomy of the ingestion core
//! - **Types**: the Unified Record shape every source is normalized into
//! - **Logging**: tracing subscriber configuration shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use unidata_common::types::{RawData, UnifiedRecord};
//!
//! let record = UnifiedRecord::new("source1", RawData::default());
//! assert_eq!(record.source_id, "source1");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, UnidataError};
