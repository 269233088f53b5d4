/*!
 * Manifest (origin.xml) reconciliation
 *
 * After the model is filtered the manifest still describes the old model:
 * the `/model.xml` checksum is stale and the `ObjectCounts` fields count
 * objects that are gone. The reconciler recomputes both from the filtered
 * model as written to disk.
 */

use std::path::Path;
use tracing::{debug, info, warn};

use super::checksum::calculate_checksum;
use super::document::{Element, XmlDocument};
use super::model::count_by_type;
use crate::catalog::{ElementTypeCatalog, TypeSelection};
use crate::error::{EditorError, Result};

pub const CHECKSUMS_SECTION: &str = "Checksums";
pub const OBJECT_COUNTS_SECTION: &str = "ObjectCounts";
pub const URI_ATTRIBUTE: &str = "Uri";

/// Newline convention for the persisted manifest
pub const MANIFEST_NEWLINE: &str = "\r\n";

/// One `ObjectCounts` field rewritten during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountUpdate {
    pub field: String,
    pub type_id: String,
    pub previous: String,
    pub value: usize,
}

/// What a reconciliation run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub checksum: String,
    pub checksum_updated: bool,
    pub count_updates: Vec<CountUpdate>,
    pub warnings: Vec<String>,
}

fn is_section(name: &'static str) -> impl Fn(&Element) -> bool {
    move |el: &Element| el.local_name() == name
}

/// Overwrite the checksum recorded for `uri`
pub fn update_checksum_entry(manifest: &mut XmlDocument, uri: &str, checksum: &str) -> Result<()> {
    let section = manifest
        .root_mut()
        .find_descendant_mut(&is_section(CHECKSUMS_SECTION))
        .ok_or_else(|| {
            EditorError::MissingManifestSection(format!("{} element", CHECKSUMS_SECTION))
        })?;

    let entry = section
        .find_descendant_mut(&|el: &Element| el.attribute(URI_ATTRIBUTE).as_deref() == Some(uri))
        .ok_or_else(|| {
            EditorError::MissingManifestSection(format!(
                "{} entry for {}",
                CHECKSUMS_SECTION, uri
            ))
        })?;

    entry.set_text(checksum);
    info!("Updated checksum for {}: {}", uri, checksum);
    Ok(())
}

/// Checksum recorded for `uri` in the `Checksums` section
pub fn read_checksum_entry(manifest: &XmlDocument, uri: &str) -> Option<String> {
    manifest
        .root()
        .find_descendant(&is_section(CHECKSUMS_SECTION))?
        .find_descendant(&|el: &Element| el.attribute(URI_ATTRIBUTE).as_deref() == Some(uri))
        .map(|el| el.text().trim().to_string())
}

/// Rewrite mapped `ObjectCounts` fields from the filtered model
///
/// A field is set to the remaining count when the model still has elements
/// of its type, to zero when its type was targeted by this run, and left
/// alone otherwise. Fields the catalog does not map are never touched.
pub fn recompute_object_counts(
    manifest: &mut XmlDocument,
    model: &XmlDocument,
    removed: &TypeSelection,
    catalog: &ElementTypeCatalog,
) -> Result<Vec<CountUpdate>> {
    let section = manifest
        .root_mut()
        .find_descendant_mut(&is_section(OBJECT_COUNTS_SECTION))
        .ok_or_else(|| {
            EditorError::MissingManifestSection(format!("{} element", OBJECT_COUNTS_SECTION))
        })?;

    let counts = count_by_type(model);
    let mut updates = Vec::new();

    for field in section.child_elements_mut() {
        let name = field.local_name();
        let Some(type_id) = catalog.type_for_manifest_field(&name) else {
            debug!("Leaving unmapped field {} untouched", name);
            continue;
        };

        let value = match counts.get(type_id) {
            Some(&count) if count > 0 => count,
            _ if removed.contains(type_id) => 0,
            _ => continue,
        };

        let previous = field.text();
        field.set_text(&value.to_string());
        if value == 0 {
            info!("Set {} to 0 (removed)", name);
        } else {
            info!("Updated {}: {}", name, value);
        }
        updates.push(CountUpdate {
            field: name,
            type_id: type_id.to_string(),
            previous,
            value,
        });
    }

    Ok(updates)
}

/// Write the manifest with stable formatting, then read it back and check
/// the recorded checksum against `expected`
pub fn persist(
    manifest: &XmlDocument,
    path: &Path,
    uri: &str,
    expected: Option<&str>,
) -> Result<()> {
    let bytes = manifest.to_indented_bytes(MANIFEST_NEWLINE)?;
    std::fs::write(path, bytes)?;
    debug!("Manifest saved: {}", path.display());

    let Some(expected) = expected else {
        return Ok(());
    };

    let saved = XmlDocument::load(path)?;
    let actual = read_checksum_entry(&saved, uri).unwrap_or_default();
    if actual != expected {
        return Err(EditorError::IntegrityFailure {
            expected: expected.to_string(),
            actual,
        });
    }
    info!("Verified saved checksum: {}", actual);
    Ok(())
}

/// Brings a package manifest back in line with its filtered model
pub struct ManifestReconciler<'a> {
    catalog: &'a ElementTypeCatalog,
    model_uri: String,
}

impl<'a> ManifestReconciler<'a> {
    pub fn new(catalog: &'a ElementTypeCatalog, model_uri: impl Into<String>) -> Self {
        Self {
            catalog,
            model_uri: model_uri.into(),
        }
    }

    /// Reconcile `manifest_path` against the model already saved at `model_path`
    pub fn reconcile(
        &self,
        manifest_path: &Path,
        model_path: &Path,
        removed: &TypeSelection,
    ) -> Result<ReconcileOutcome> {
        let mut manifest = XmlDocument::load(manifest_path)?;
        let checksum = calculate_checksum(model_path)?;
        info!("Calculated new checksum: {}", checksum);

        let mut outcome = ReconcileOutcome {
            checksum: checksum.clone(),
            ..Default::default()
        };

        match update_checksum_entry(&mut manifest, &self.model_uri, &checksum) {
            Ok(()) => outcome.checksum_updated = true,
            Err(e) if !e.is_fatal() => {
                warn!("{}, skipping checksum update", e);
                outcome.warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }

        let model = XmlDocument::load(model_path)?;
        match recompute_object_counts(&mut manifest, &model, removed, self.catalog) {
            Ok(updates) => outcome.count_updates = updates,
            Err(e) if !e.is_fatal() => {
                warn!("{}, skipping object counts", e);
                outcome.warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }

        let expected = outcome.checksum_updated.then_some(checksum.as_str());
        persist(&manifest, manifest_path, &self.model_uri, expected)?;
        Ok(outcome)
    }
}
