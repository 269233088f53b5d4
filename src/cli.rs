/*!
 * Command-line surface
 *
 * Parsing never exits the process; every failure comes back as an
 * `EditorError` and `main` picks the exit code.
 */

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::catalog::{ElementTypeCatalog, TypeSelection};
use crate::config::{EditorConfig, LogLevel};
use crate::error::{EditorError, Result};

#[derive(Parser, Debug)]
#[command(name = "bacpac-editor")]
#[command(
    version,
    about = "Remove schema object categories from .bacpac packages and model.xml files",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stdout
    #[arg(long = "log", value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Output package path (defaults to <name>_modified.bacpac)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// .bacpac package or model.xml document to edit
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Selection groups, e.g. --Views --Tables
    #[arg(
        value_name = "SELECTION",
        num_args = 1..,
        required = true,
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    pub selections: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

/// Outcome of parsing the raw arguments
#[derive(Debug)]
pub enum Parsed {
    /// Help or version was requested; the rendered text is ready to print
    Info(String),
    Run(Cli),
}

/// Parse arguments without terminating the process
pub fn parse_from<I, T>(args: I) -> Result<Parsed>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Parsed::Run(cli)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(Parsed::Info(e.to_string()))
        }
        Err(e) => {
            let rendered = e.to_string();
            let summary = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            Err(EditorError::Usage(summary))
        }
    }
}

/// A validated request: what to edit, how, and which types to remove
#[derive(Debug)]
pub struct Invocation {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub selection: TypeSelection,
    pub config: EditorConfig,
}

impl Cli {
    /// Merge config file and flags, check the input and resolve selections
    pub fn into_invocation(self, catalog: &ElementTypeCatalog) -> Result<Invocation> {
        let mut config = match self.config {
            Some(ref path) => EditorConfig::from_file(path)?,
            None => EditorConfig::default(),
        };
        if let Some(level) = self.log_level {
            config.log_level = level.into();
        }
        if self.log.is_some() {
            config.log_file = self.log.clone();
        }
        config.verbose |= self.verbose;

        if !self.file.is_file() {
            return Err(EditorError::SourceNotFound(self.file));
        }
        let selection = catalog.resolve(&self.selections)?;

        Ok(Invocation {
            file: self.file,
            output: self.output,
            selection,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;
    use tempfile::TempDir;

    fn run_args(args: &[&str]) -> Cli {
        match parse_from(args).unwrap() {
            Parsed::Run(cli) => cli,
            Parsed::Info(text) => panic!("unexpected info output: {}", text),
        }
    }

    #[test]
    fn test_selections_after_file() {
        let cli = run_args(&["bacpac-editor", "db.bacpac", "--Views", "--Tables"]);
        assert_eq!(cli.file, PathBuf::from("db.bacpac"));
        assert_eq!(cli.selections, vec!["--Views", "--Tables"]);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_options_before_file() {
        let cli = run_args(&[
            "bacpac-editor",
            "-v",
            "--log-level",
            "warn",
            "-o",
            "out.bacpac",
            "db.bacpac",
            "--AllObjects",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.log_level, Some(LogLevelArg::Warn));
        assert_eq!(cli.output, Some(PathBuf::from("out.bacpac")));
        assert_eq!(cli.selections, vec!["--AllObjects"]);
    }

    #[test]
    fn test_missing_selection_is_usage_error() {
        let err = parse_from(["bacpac-editor", "db.bacpac"]).unwrap_err();
        assert!(matches!(err, EditorError::Usage(_)));
        assert!(err.shows_usage());
    }

    #[test]
    fn test_help_is_not_an_error() {
        match parse_from(["bacpac-editor", "--help"]).unwrap() {
            Parsed::Info(text) => assert!(text.contains("Usage")),
            Parsed::Run(_) => panic!("help should not produce a run"),
        }
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("model.xml");
        std::fs::write(&file, "<m/>").unwrap();

        let cli = run_args(&["bacpac-editor", file.to_str().unwrap(), "--Views", "--views"]);
        let err = cli.into_invocation(catalog()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownSelection(ref s) if s == "--views"));
        // Input untouched
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<m/>");
    }

    #[test]
    fn test_nonexistent_file_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.bacpac");
        let cli = run_args(&["bacpac-editor", missing.to_str().unwrap(), "--Views"]);

        let err = cli.into_invocation(catalog()).unwrap_err();
        assert!(matches!(err, EditorError::SourceNotFound(_)));
        assert_ne!(err.exit_code(), crate::error::EXIT_SUCCESS);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("model.xml");
        std::fs::write(&file, "<m/>").unwrap();
        let config_path = dir.path().join("editor.toml");
        std::fs::write(&config_path, "output_suffix = \"_slim\"\nlog_level = \"error\"\n").unwrap();

        let cli = run_args(&[
            "bacpac-editor",
            "--config",
            config_path.to_str().unwrap(),
            "--log-level",
            "debug",
            file.to_str().unwrap(),
            "--Views",
            "--AllObjects",
        ]);
        let invocation = cli.into_invocation(catalog()).unwrap();

        assert_eq!(invocation.config.output_suffix, "_slim");
        assert_eq!(invocation.config.log_level, LogLevel::Debug);
        assert_eq!(invocation.selection.groups(), &["--Views", "--AllObjects"]);
        assert!(invocation.selection.contains("SqlRole"));
    }
}
