use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Subcommand};

use ipocket_database::establish_connection;
use ipocket_import::{run_import, BundleImporter, CsvImporter, ImportAuditContext};
use ipocket_import_types::{ImportInputs, ImportOptions};

use super::print_import_result;

#[derive(Args)]
pub struct ImportCommand {
    #[command(subcommand)]
    format: ImportFormat,
}

#[derive(Subcommand)]
enum ImportFormat {
    /// Import a bundle.json snapshot
    Bundle(BundleArgs),
    /// Import hosts.csv and/or ip-assets.csv
    Csv(CsvArgs),
}

#[derive(Args)]
struct BundleArgs {
    /// Path to the bundle JSON file
    path: PathBuf,

    #[command(flatten)]
    options: SharedImportArgs,
}

#[derive(Args)]
struct CsvArgs {
    /// Path to hosts.csv
    #[arg(long)]
    hosts: Option<PathBuf>,

    /// Path to ip-assets.csv
    #[arg(long)]
    ip_assets: Option<PathBuf>,

    #[command(flatten)]
    options: SharedImportArgs,
}

#[derive(Args)]
struct SharedImportArgs {
    /// Compute the plan without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Union-merge imported tags into existing tag sets
    #[arg(long)]
    merge_tags: bool,

    /// Keep existing non-empty notes instead of overwriting them
    #[arg(long)]
    preserve_notes: bool,
}

impl SharedImportArgs {
    fn options(&self) -> ImportOptions {
        ImportOptions {
            merge_tags: self.merge_tags,
            preserve_existing_notes: self.preserve_notes,
        }
    }
}

impl ImportCommand {
    pub async fn execute(&self, database_url: &str) -> anyhow::Result<()> {
        let db = establish_connection(database_url).await?;

        let (inputs, shared, importer, label): (ImportInputs, &SharedImportArgs, _, String) =
            match &self.format {
                ImportFormat::Bundle(args) => {
                    let mut inputs = ImportInputs::new();
                    inputs.insert(
                        "bundle".to_string(),
                        std::fs::read(&args.path)
                            .with_context(|| format!("reading {}", args.path.display()))?,
                    );
                    let label = args.path.display().to_string();
                    (
                        inputs,
                        &args.options,
                        Box::new(BundleImporter) as Box<dyn ipocket_import_types::Importer>,
                        label,
                    )
                }
                ImportFormat::Csv(args) => {
                    if args.hosts.is_none() && args.ip_assets.is_none() {
                        bail!("provide --hosts and/or --ip-assets");
                    }
                    let mut inputs = ImportInputs::new();
                    let mut labels = Vec::new();
                    if let Some(path) = &args.hosts {
                        inputs.insert(
                            "hosts".to_string(),
                            std::fs::read(path)
                                .with_context(|| format!("reading {}", path.display()))?,
                        );
                        labels.push(path.display().to_string());
                    }
                    if let Some(path) = &args.ip_assets {
                        inputs.insert(
                            "ip_assets".to_string(),
                            std::fs::read(path)
                                .with_context(|| format!("reading {}", path.display()))?,
                        );
                        labels.push(path.display().to_string());
                    }
                    (
                        inputs,
                        &args.options,
                        Box::new(CsvImporter) as Box<dyn ipocket_import_types::Importer>,
                        labels.join(", "),
                    )
                }
            };

        let mode = if shared.dry_run { "dry-run" } else { "apply" };
        let context = ImportAuditContext {
            user: None,
            source: "cli".to_string(),
            mode: mode.to_string(),
            input_label: label,
        };

        let result = run_import(
            &db,
            importer.as_ref(),
            &inputs,
            &shared.options(),
            shared.dry_run,
            Some(&context),
        )
        .await?;

        println!("ipocket import mode: {mode}");
        print_import_result(&result);
        if result.errors.is_empty() {
            Ok(())
        } else {
            bail!("import blocked by {} error(s)", result.errors.len())
        }
    }
}
