use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use ipocket_database::establish_connection;
use ipocket_import::export_bundle;

#[derive(Args)]
pub struct ExportCommand {
    /// Write the bundle here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include archived IP assets in the export
    #[arg(long)]
    include_archived: bool,
}

impl ExportCommand {
    pub async fn execute(&self, database_url: &str) -> anyhow::Result<()> {
        let db = establish_connection(database_url).await?;
        let document = export_bundle(&db, self.include_archived).await?;

        let mut payload = serde_json::to_string_pretty(&document)?;
        payload.push('\n');
        match &self.output {
            Some(path) => {
                std::fs::write(path, payload)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Bundle written to {}", path.display());
            }
            None => print!("{payload}"),
        }
        Ok(())
    }
}
