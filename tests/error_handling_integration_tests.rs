/*!
 * Integration tests for error handling
 *
 * These tests drive the editor through failure scenarios to verify:
 * - Error categorization and exit codes
 * - Non-fatal manifest problems degrade to warnings
 * - No output or working state is left behind on failure
 */

use bacpac_editor::{
    catalog,
    error::{ErrorCategory, EXIT_FAILURE, EXIT_INTEGRITY, EXIT_USAGE},
    Editor, EditorConfig, EditorError, TypeSelection,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn write_package(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn editor_in(dir: &Path) -> Editor<'static> {
    Editor::new(EditorConfig {
        work_dir: Some(dir.join("work")),
        ..Default::default()
    })
}

fn work_dir_is_empty(dir: &Path) -> bool {
    let work = dir.join("work");
    !work.exists() || std::fs::read_dir(work).unwrap().next().is_none()
}

#[test]
fn test_corrupt_container() {
    let dir = tempdir().unwrap();
    let package = dir.path().join("broken.bacpac");
    std::fs::write(&package, b"this is not a zip archive").unwrap();

    let err = editor_in(dir.path())
        .process(&package, &TypeSelection::from_types(["SqlView"]))
        .unwrap_err();

    assert!(matches!(err, EditorError::Archive(_)));
    assert_eq!(err.category(), ErrorCategory::Archive);
    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert!(work_dir_is_empty(dir.path()));
    assert!(!dir.path().join("broken_modified.bacpac").exists());
}

#[test]
fn test_container_without_model() {
    let dir = tempdir().unwrap();
    let package = dir.path().join("empty.bacpac");
    write_package(&package, &[("origin.xml", "<DacOrigin/>"), ("Data/x.BCP", "raw")]);

    let err = editor_in(dir.path())
        .process(&package, &TypeSelection::from_types(["SqlView"]))
        .unwrap_err();

    assert!(matches!(err, EditorError::MissingResource(ref name) if name == "model.xml"));
    assert_eq!(err.category(), ErrorCategory::Package);
    assert!(work_dir_is_empty(dir.path()));
    assert!(!dir.path().join("empty_modified.bacpac").exists());
}

#[test]
fn test_malformed_bare_document_left_untouched() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.xml");
    let content = "<DataSchemaModel><Model><Element Type=\"SqlView\">";
    std::fs::write(&model, content).unwrap();

    let err = editor_in(dir.path())
        .process(&model, &TypeSelection::from_types(["SqlView"]))
        .unwrap_err();

    assert!(matches!(err, EditorError::Parse { .. }));
    assert_eq!(err.category(), ErrorCategory::Markup);
    assert_eq!(std::fs::read_to_string(&model).unwrap(), content);
}

#[test]
fn test_manifest_without_sections_is_not_fatal() {
    let dir = tempdir().unwrap();
    let package = dir.path().join("db.bacpac");
    write_package(
        &package,
        &[
            ("model.xml", "<M><E Type=\"SqlView\"/><E Type=\"SqlTable\"/></M>"),
            ("origin.xml", "<DacOrigin><Operation/></DacOrigin>"),
        ],
    );

    let outcome = editor_in(dir.path())
        .process(&package, &TypeSelection::from_types(["SqlView"]))
        .unwrap();

    let manifest = outcome.manifest.unwrap();
    assert!(!manifest.checksum_updated);
    assert!(manifest.count_updates.is_empty());
    assert_eq!(manifest.warnings.len(), 2);
    assert!(manifest.warnings[0].contains("Checksums"));
    assert!(manifest.warnings[1].contains("ObjectCounts"));
    assert!(outcome.output.exists());
    assert!(work_dir_is_empty(dir.path()));
}

#[test]
fn test_unknown_selection_names_offender() {
    let err = catalog()
        .resolve(&["--Views", "--Synonyms"])
        .unwrap_err();

    assert!(matches!(err, EditorError::UnknownSelection(ref s) if s == "--Synonyms"));
    assert!(err.shows_usage());
    assert_eq!(err.exit_code(), EXIT_USAGE);
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[test]
fn test_empty_selection_is_usage_error() {
    let none: [&str; 0] = [];
    let err = catalog().resolve(&none).unwrap_err();
    assert!(matches!(err, EditorError::Usage(_)));
    assert_eq!(err.exit_code(), EXIT_USAGE);
}

#[test]
fn test_fatality_and_exit_codes() {
    let integrity = EditorError::IntegrityFailure {
        expected: "AA".to_string(),
        actual: "BB".to_string(),
    };
    assert_eq!(integrity.exit_code(), EXIT_INTEGRITY);
    assert!(integrity.is_fatal());
    assert!(integrity.to_string().contains("AA"));

    let section = EditorError::MissingManifestSection("Checksums element".to_string());
    assert!(!section.is_fatal());

    let missing = EditorError::SourceNotFound("nope.bacpac".into());
    assert!(missing.is_fatal());
    assert!(!missing.shows_usage());
    assert!(missing.to_string().contains("nope.bacpac"));
}
