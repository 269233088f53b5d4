/*!
 * bacpac-editor - Schema object removal for .bacpac packages
 *
 * Removes selected categories of schema objects from the model of an
 * exported database package while keeping the package consistent:
 * - Type-attribute filtering of model.xml
 * - SHA-256 checksum refresh in origin.xml
 * - Object count reconciliation against the filtered model
 * - Repackaging into a new container, source left untouched
 */

pub mod catalog;
pub mod cli;
pub mod cli_style;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use catalog::{catalog, ElementTypeCatalog, TypeGroup, TypeSelection};
pub use config::{EditorConfig, LogLevel};
pub use core::pipeline::{EditOutcome, Editor, InputKind};
pub use core::model::RemovalReport;
pub use error::{EditorError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
