/*!
 * Edit pipeline: extract, filter, reconcile, repackage, clean up
 */

use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::{info, warn};

use super::archive::{derive_output_path, extract, is_package_path, repackage};
use super::manifest::{ManifestReconciler, ReconcileOutcome};
use super::model::{filter_model_file, RemovalReport};
use crate::catalog::{catalog, ElementTypeCatalog, TypeSelection};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};

const WORK_DIR_PREFIX: &str = "bacpac-editor-";

/// How an input file is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Zip container: full archive pipeline with manifest reconciliation
    Package,
    /// Bare model document rewritten in place
    Document,
}

/// Result of one successful run
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub kind: InputKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: RemovalReport,
    pub manifest: Option<ReconcileOutcome>,
}

pub struct Editor<'a> {
    config: EditorConfig,
    catalog: &'a ElementTypeCatalog,
    output_override: Option<PathBuf>,
}

impl Editor<'static> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_catalog(config, catalog())
    }
}

impl<'a> Editor<'a> {
    pub fn with_catalog(config: EditorConfig, catalog: &'a ElementTypeCatalog) -> Self {
        Self {
            config,
            catalog,
            output_override: None,
        }
    }

    /// Write the package to `path` instead of the derived name
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_override = Some(path.into());
        self
    }

    pub fn input_kind(&self, path: &Path) -> InputKind {
        if is_package_path(path, &self.config.package_extension) {
            InputKind::Package
        } else {
            InputKind::Document
        }
    }

    /// Process `path`, dispatching on its extension
    pub fn process(&self, path: &Path, selection: &TypeSelection) -> Result<EditOutcome> {
        if !path.is_file() {
            return Err(EditorError::SourceNotFound(path.to_path_buf()));
        }
        info!("Processing file: {}", path.display());

        match self.input_kind(path) {
            InputKind::Package => self.process_package(path, selection),
            InputKind::Document => self.process_document(path, selection),
        }
    }

    /// Filter a bare model document in place, no manifest involved
    pub fn process_document(&self, path: &Path, selection: &TypeSelection) -> Result<EditOutcome> {
        let report = filter_model_file(path, selection)?;
        Ok(EditOutcome {
            kind: InputKind::Document,
            input: path.to_path_buf(),
            output: path.to_path_buf(),
            report,
            manifest: None,
        })
    }

    /// Run the archive pipeline; the working directory is removed on every exit path
    pub fn process_package(&self, path: &Path, selection: &TypeSelection) -> Result<EditOutcome> {
        let output = self
            .output_override
            .clone()
            .unwrap_or_else(|| derive_output_path(path, &self.config.output_suffix));
        if output == path {
            return Err(EditorError::Config(format!(
                "Output path {} would overwrite the input package",
                output.display()
            )));
        }

        let work_dir = self.create_work_dir()?;
        info!("Extracting package to temporary directory: {}", work_dir.path().display());

        // On error the TempDir is dropped here, which deletes it
        let (report, manifest) = self.edit_extracted(path, work_dir.path(), selection, &output)?;

        let work_path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            warn!("Failed to remove {}: {}", work_path.display(), e);
        } else {
            info!("Cleaned up temporary files");
        }

        Ok(EditOutcome {
            kind: InputKind::Package,
            input: path.to_path_buf(),
            output,
            report,
            manifest,
        })
    }

    fn edit_extracted(
        &self,
        package: &Path,
        work_dir: &Path,
        selection: &TypeSelection,
        output: &Path,
    ) -> Result<(RemovalReport, Option<ReconcileOutcome>)> {
        extract(package, work_dir)?;

        let model_path = work_dir.join(&self.config.model_entry);
        if !model_path.is_file() {
            return Err(EditorError::MissingResource(self.config.model_entry.clone()));
        }
        info!("Found {} in package", self.config.model_entry);
        let report = filter_model_file(&model_path, selection)?;

        let manifest_path = work_dir.join(&self.config.manifest_entry);
        let manifest = if manifest_path.is_file() {
            info!("Updating {}", self.config.manifest_entry);
            let reconciler = ManifestReconciler::new(self.catalog, self.config.model_uri());
            Some(reconciler.reconcile(&manifest_path, &model_path, selection)?)
        } else {
            warn!(
                "{} not found, skipping checksum update",
                self.config.manifest_entry
            );
            None
        };

        info!("Creating new package: {}", output.display());
        if let Err(e) = repackage(work_dir, output) {
            // Don't leave a half-written container behind
            let _ = std::fs::remove_file(output);
            return Err(e);
        }
        Ok((report, manifest))
    }

    fn create_work_dir(&self) -> Result<TempDir> {
        let mut builder = Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let dir = match self.config.work_dir {
            Some(ref root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}
