/*!
 * Core edit operations
 */

pub mod archive;
pub mod checksum;
pub mod document;
pub mod manifest;
pub mod model;
pub mod pipeline;

pub use archive::{derive_output_path, extract, is_package_path, repackage};
pub use checksum::calculate_checksum;
pub use document::XmlDocument;
pub use manifest::{ManifestReconciler, ReconcileOutcome};
pub use model::{filter_model_file, remove, select_by_type, RemovalReport, SelectedElement};
