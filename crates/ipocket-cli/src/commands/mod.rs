mod connector;
mod export;
mod import;

pub use connector::ConnectorCommand;
pub use export::ExportCommand;
pub use import::ImportCommand;

use ipocket_import_types::ImportApplyResult;

/// Shared result printout for imports and connector runs
pub(crate) fn print_import_result(result: &ImportApplyResult) {
    let total = result.summary.total();
    println!(
        "Import summary: create={}, update={}, skip={}",
        total.would_create, total.would_update, total.would_skip
    );

    if !result.errors.is_empty() {
        println!("Import errors:");
        for issue in &result.errors {
            println!("- {}: {}", issue.location, issue.message);
        }
    }

    if !result.warnings.is_empty() {
        println!("Import warnings:");
        for issue in &result.warnings {
            println!("- {}: {}", issue.location, issue.message);
        }
    }
}
