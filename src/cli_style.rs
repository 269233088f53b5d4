/*!
 * bacpac-editor CLI Style System
 *
 * Styled messages, usage text and result tables for the command line.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::catalog::ElementTypeCatalog;
use crate::core::manifest::ReconcileOutcome;
use crate::core::model::RemovalReport;

// ============================================================================
// THEME COLORS
// ============================================================================

pub struct Theme;

impl Theme {
    /// Primary accent color (cyan)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const ARROW_RIGHT: &'static str = "→";
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Removed elements per type, with a total row
pub fn removal_table(report: &RemovalReport) -> Table {
    let mut table = create_minimal_table();
    table.set_header(vec![
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Removed").add_attribute(Attribute::Bold),
    ]);

    for (type_id, count) in report.entries() {
        table.add_row(vec![
            Cell::new(type_id).fg(Color::Cyan),
            Cell::new(count).fg(Color::White),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(report.total()).add_attribute(Attribute::Bold),
    ]);

    table
}

/// Manifest fields rewritten during reconciliation
pub fn manifest_table(outcome: &ReconcileOutcome) -> Table {
    let mut table = create_minimal_table();
    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Before").add_attribute(Attribute::Bold),
        Cell::new("After").add_attribute(Attribute::Bold),
    ]);

    for update in &outcome.count_updates {
        table.add_row(vec![
            Cell::new(&update.field).fg(Color::Cyan),
            Cell::new(&update.previous),
            Cell::new(update.value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

// ============================================================================
// USAGE
// ============================================================================

/// Usage text listing every selection group in the catalog
pub fn usage_text(catalog: &ElementTypeCatalog) -> String {
    let program = env!("CARGO_PKG_NAME");
    let width = catalog
        .groups()
        .iter()
        .map(|g| g.name.len())
        .max()
        .unwrap_or(0)
        + 3;

    let mut out = format!(
        "Usage: {} [OPTIONS] <file-path> <selection-option> [additional-options...]\n\nSelection Options:\n",
        program
    );
    for group in catalog.groups() {
        out.push_str(&format!(
            "  {:<width$}{}\n",
            group.name,
            group.description,
            width = width
        ));
    }
    out.push_str("\nExamples:\n");
    for example in [
        "database.bacpac --Views",
        "model.xml --StoredProcedures",
        "database.bacpac --Views --StoredProcedures",
        "database.bacpac --Functions --Triggers",
        "model.xml --Views --StoredProcedures --Functions",
    ] {
        out.push_str(&format!("  {} {}\n", program, example));
    }
    out
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}
