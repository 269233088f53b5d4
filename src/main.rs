/*!
 * bacpac-editor CLI
 *
 * Removes schema object categories from a .bacpac package (or a bare
 * model.xml) and keeps origin.xml checksums and object counts truthful.
 */

use bacpac_editor::{
    catalog::catalog,
    cli::{self, Parsed},
    cli_style::{
        manifest_table, print_error, print_info, print_success, print_warning, removal_table,
        section_header, usage_text,
    },
    core::pipeline::{EditOutcome, Editor, InputKind},
    error::{Result, EXIT_SUCCESS},
    logging,
};
use tracing::{error, info};

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(category = %e.category(), "{}", e);
            print_error(&e.to_string(), None);
            if e.shows_usage() {
                eprintln!("{}", usage_text(catalog()));
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = match cli::parse_from(std::env::args_os())? {
        Parsed::Info(text) => {
            print!("{}", text);
            return Ok(());
        }
        Parsed::Run(cli) => cli,
    };

    let invocation = cli.into_invocation(catalog())?;

    if let Err(e) = logging::init_logging(&invocation.config) {
        print_warning(&format!("Failed to initialize logging: {}", e));
    }

    info!("Selections: {}", invocation.selection.groups().join(", "));
    info!(
        "Removing elements: {}",
        invocation.selection.types().join(", ")
    );

    let mut editor = Editor::new(invocation.config);
    if let Some(output) = invocation.output {
        editor = editor.with_output(output);
    }

    let outcome = editor.process(&invocation.file, &invocation.selection)?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &EditOutcome) {
    section_header("Removed elements");
    if outcome.report.is_empty() {
        print_info("No elements found with specified types");
    } else {
        println!("{}", removal_table(&outcome.report));
    }

    if let Some(ref manifest) = outcome.manifest {
        section_header("Manifest");
        if manifest.checksum_updated {
            print_success(&format!("Checksum updated: {}", manifest.checksum));
        }
        if !manifest.count_updates.is_empty() {
            println!("{}", manifest_table(manifest));
        }
        for warning in &manifest.warnings {
            print_warning(warning);
        }
    }

    println!();
    match outcome.kind {
        InputKind::Package => {
            print_success(&format!("New package created: {}", outcome.output.display()))
        }
        InputKind::Document => {
            print_success(&format!("File saved: {}", outcome.output.display()))
        }
    }
    print_success("Processing completed successfully.");
}
