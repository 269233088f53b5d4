/*!
 * Package container extraction and repackaging
 */

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{EditorError, Result};

/// Whether `path` carries the package extension (case-insensitive)
pub fn is_package_path(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}

/// `dir/stem{suffix}.ext` next to the input
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(name)
}

/// Unpack every entry of `container` into `working_dir`
pub fn extract(container: &Path, working_dir: &Path) -> Result<usize> {
    let file = File::open(container).map_err(|e| {
        EditorError::Archive(format!("Cannot open {}: {}", container.display(), e))
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        EditorError::Archive(format!("{} is not a valid package: {}", container.display(), e))
    })?;

    let entries = archive.len();
    archive.extract(working_dir).map_err(|e| {
        EditorError::Archive(format!(
            "Failed to extract {} into {}: {}",
            container.display(),
            working_dir.display(),
            e
        ))
    })?;

    info!("Extracted {} entries to {}", entries, working_dir.display());
    Ok(entries)
}

/// Write a new container at `output` mirroring the tree under `working_dir`
///
/// An existing file at `output` is replaced.
pub fn repackage(working_dir: &Path, output: &Path) -> Result<usize> {
    if output.exists() {
        std::fs::remove_file(output)?;
    }

    let file = File::create(output)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0;
    for entry in WalkDir::new(working_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry_name(working_dir, entry.path())?;

        if entry.file_type().is_dir() {
            let is_empty = std::fs::read_dir(entry.path())?.next().is_none();
            if is_empty {
                zip.add_directory(name.as_str(), options)?;
                entries += 1;
            }
            continue;
        }

        debug!("Adding {}", name);
        zip.start_file(name.as_str(), options)?;
        let mut source = BufReader::new(File::open(entry.path())?);
        io::copy(&mut source, &mut zip)?;
        entries += 1;
    }

    zip.finish()?.flush()?;
    info!("New package created: {} ({} entries)", output.display(), entries);
    Ok(entries)
}

/// Relative `/`-separated archive name of `path` under `root`
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        EditorError::Archive(format!("{} is outside {}", path.display(), root.display()))
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
