/*!
 * Schema model filtering by `Type` attribute
 */

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::document::{Element, NodeId, XmlDocument};
use crate::catalog::TypeSelection;
use crate::error::Result;

/// Attribute carrying the schema object category
pub const TYPE_ATTRIBUTE: &str = "Type";

/// An element nominated for removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedElement {
    pub id: NodeId,
    pub type_id: String,
}

/// Removed element counts per type identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    removed: BTreeMap<String, usize>,
}

impl RemovalReport {
    fn record(&mut self, type_id: &str) {
        *self.removed.entry(type_id.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, type_id: &str) -> usize {
        self.removed.get(type_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.removed.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// (type, count) pairs sorted by type identifier
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.removed.iter().map(|(t, c)| (t.as_str(), *c))
    }
}

impl fmt::Display for RemovalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed {} total element(s)", self.total())?;
        for (type_id, count) in self.entries() {
            write!(f, "\n  - {}: {}", type_id, count)?;
        }
        Ok(())
    }
}

/// Every non-root element whose type is in `selection`, in document order
pub fn select_by_type(doc: &XmlDocument, selection: &TypeSelection) -> Vec<SelectedElement> {
    doc.root()
        .descendants()
        .into_iter()
        .filter_map(|el| {
            el.attribute(TYPE_ATTRIBUTE)
                .filter(|t| selection.contains(t))
                .map(|type_id| SelectedElement {
                    id: el.id(),
                    type_id,
                })
        })
        .collect()
}

/// Detach the selected elements and report what left the tree
///
/// Elements already detached are skipped, so repeating a call reports zero.
pub fn remove(doc: &mut XmlDocument, selected: &[SelectedElement]) -> RemovalReport {
    let ids: HashSet<NodeId> = selected.iter().map(|s| s.id).collect();
    let detached = doc.root_mut().detach_where(&|el| ids.contains(&el.id()));

    let mut report = RemovalReport::default();
    for element in &detached {
        record_selected(element, &ids, &mut report);
        for nested in element.descendants() {
            record_selected(nested, &ids, &mut report);
        }
    }
    report
}

fn record_selected(element: &Element, ids: &HashSet<NodeId>, report: &mut RemovalReport) {
    if ids.contains(&element.id()) {
        if let Some(type_id) = element.attribute(TYPE_ATTRIBUTE) {
            report.record(&type_id);
        }
    }
}

/// Count every element (root included) by its `Type` attribute
pub fn count_by_type(doc: &XmlDocument) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for el in doc.elements() {
        if let Some(type_id) = el.attribute(TYPE_ATTRIBUTE) {
            *counts.entry(type_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Load, filter and save a model document in place
///
/// The file is only rewritten when something was removed.
pub fn filter_model_file(path: &Path, selection: &TypeSelection) -> Result<RemovalReport> {
    let mut doc = XmlDocument::load(path)?;
    let selected = select_by_type(&doc, selection);
    debug!("Selected {} element(s) in {}", selected.len(), path.display());

    if selected.is_empty() {
        info!("No elements found with specified types");
        return Ok(RemovalReport::default());
    }

    let report = remove(&mut doc, &selected);
    doc.save(path)?;
    info!("File saved: {}", path.display());
    for (type_id, count) in report.entries() {
        info!("Removed {}: {} element(s)", type_id, count);
    }
    Ok(report)
}
