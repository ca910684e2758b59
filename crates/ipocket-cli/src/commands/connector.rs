use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Subcommand, ValueEnum};

use ipocket_connectors::elasticsearch::{
    extract_ip_assets_from_nodes, ElasticsearchAuth, ElasticsearchConnector,
};
use ipocket_connectors::prometheus::{extract_ip_assets_from_result, PrometheusConnector};
use ipocket_connectors::vcenter::{build_vcenter_bundle, VcenterConnector};
use ipocket_connectors::{
    build_ip_asset_bundle, import_bundle_via_pipeline, write_bundle_json, AssetDefaults,
};
use ipocket_core::split_tag_string;
use ipocket_database::establish_connection;
use ipocket_entities::IpAssetType;
use ipocket_import_types::BundleDocument;

use super::print_import_result;

#[derive(Args)]
pub struct ConnectorCommand {
    #[command(subcommand)]
    source: ConnectorSource,
}

#[derive(Subcommand)]
enum ConnectorSource {
    /// Import Elasticsearch node IPs
    Elasticsearch(ElasticsearchArgs),
    /// Import IPs from a Prometheus instant query
    Prometheus(PrometheusArgs),
    /// Import vCenter host and VM IPs
    Vcenter(VcenterArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConnectorMode {
    /// Write the bundle to a file only
    File,
    /// Run the local import pipeline without writing to the database
    DryRun,
    /// Run the local import pipeline and apply
    Apply,
}

#[derive(Args)]
struct CommonConnectorArgs {
    /// file=write bundle only, dry-run/apply=run local import pipeline
    #[arg(long, value_enum, default_value = "file")]
    mode: ConnectorMode,

    /// Path to save bundle.json (required in file mode)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,
}

#[derive(Args)]
struct AssetDefaultArgs {
    /// Asset type for imported IPs
    #[arg(long, default_value = "OTHER")]
    asset_type: String,

    /// Optional project name
    #[arg(long)]
    project_name: Option<String>,

    /// Optional comma-separated tags (example: elasticsearch,nodes)
    #[arg(long)]
    tags: Option<String>,

    /// Optional fixed note to apply to imported IP assets
    #[arg(long)]
    note: Option<String>,
}

impl AssetDefaultArgs {
    fn defaults(&self) -> anyhow::Result<AssetDefaults> {
        let asset_type = IpAssetType::normalize(&self.asset_type)
            .map_err(|e| anyhow::anyhow!("{e}; use OS, BMC, VM, VIP or OTHER"))?;
        Ok(AssetDefaults {
            asset_type,
            project_name: self.project_name.clone(),
            tags: self.tags.as_deref().map(split_tag_string),
            note: self
                .note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Args)]
struct ElasticsearchArgs {
    /// Elasticsearch base URL
    #[arg(long)]
    elasticsearch_url: String,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// API key in Base64 form or id:key format
    #[arg(long)]
    api_key: Option<String>,

    #[command(flatten)]
    defaults: AssetDefaultArgs,

    #[command(flatten)]
    common: CommonConnectorArgs,
}

#[derive(Args)]
struct PrometheusArgs {
    /// Prometheus base URL
    #[arg(long)]
    prometheus_url: String,

    /// Instant query whose vector result carries the IPs
    #[arg(long)]
    query: String,

    /// Label holding the IP or host:port value
    #[arg(long, default_value = "instance")]
    ip_label: String,

    /// Bearer token, or user:password for basic auth
    #[arg(long)]
    token: Option<String>,

    #[command(flatten)]
    defaults: AssetDefaultArgs,

    #[command(flatten)]
    common: CommonConnectorArgs,
}

#[derive(Args)]
struct VcenterArgs {
    /// vCenter base URL
    #[arg(long)]
    vcenter_url: String,

    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,

    #[command(flatten)]
    common: CommonConnectorArgs,
}

impl ConnectorCommand {
    pub async fn execute(&self, database_url: &str) -> anyhow::Result<()> {
        let (document, warnings, source) = match &self.source {
            ConnectorSource::Elasticsearch(args) => {
                let auth = elasticsearch_auth(args)?;
                let connector = ElasticsearchConnector::new(
                    &args.elasticsearch_url,
                    auth,
                    args.common.insecure,
                )?;
                let records = connector.fetch_nodes().await?;
                println!("Collected {} Elasticsearch nodes", records.len());

                let (assets, extraction_warnings) =
                    extract_ip_assets_from_nodes(&records, &args.defaults.defaults()?);
                println!("Prepared {} IP assets from node inventory", assets.len());

                let (document, bundle_warnings) = build_ip_asset_bundle(assets, None);
                let warnings = [extraction_warnings, bundle_warnings].concat();
                (document, warnings, "elasticsearch")
            }
            ConnectorSource::Prometheus(args) => {
                let connector = PrometheusConnector::new(
                    &args.prometheus_url,
                    args.token.clone(),
                    args.common.insecure,
                )?;
                let records = connector.fetch_query_result(&args.query).await?;
                println!("Collected {} Prometheus samples", records.len());

                let (assets, extraction_warnings) = extract_ip_assets_from_result(
                    &records,
                    &args.ip_label,
                    &args.query,
                    &args.defaults.defaults()?,
                )?;
                println!("Prepared {} IP assets from query result", assets.len());

                let (document, bundle_warnings) = build_ip_asset_bundle(assets, None);
                let warnings = [extraction_warnings, bundle_warnings].concat();
                (document, warnings, "prometheus")
            }
            ConnectorSource::Vcenter(args) => {
                let mut connector =
                    VcenterConnector::new(&args.vcenter_url, args.common.insecure)?;
                connector.login(&args.username, &args.password).await?;
                let (hosts, host_warnings) = connector.fetch_hosts().await?;
                let (vms, vm_warnings) = connector.fetch_vms().await?;
                println!("Collected {} hosts and {} VMs from vCenter", hosts.len(), vms.len());

                let (document, bundle_warnings) = build_vcenter_bundle(&hosts, &vms, None);
                let warnings = [host_warnings, vm_warnings, bundle_warnings].concat();
                (document, warnings, "vcenter")
            }
        };

        if !warnings.is_empty() {
            println!("Warnings:");
            for warning in &warnings {
                println!("- {warning}");
            }
        }

        let common = self.common_args();
        if let Some(output) = &common.output {
            write_bundle_json(&document, output)?;
            println!("Bundle written to {}", output.display());
        }

        match common.mode {
            ConnectorMode::File => {
                if common.output.is_none() {
                    bail!("--output is required when --mode=file");
                }
            }
            ConnectorMode::DryRun | ConnectorMode::Apply => {
                let dry_run = common.mode == ConnectorMode::DryRun;
                self.run_pipeline(database_url, &document, source, dry_run)
                    .await?;
            }
        }
        Ok(())
    }

    fn common_args(&self) -> &CommonConnectorArgs {
        match &self.source {
            ConnectorSource::Elasticsearch(args) => &args.common,
            ConnectorSource::Prometheus(args) => &args.common,
            ConnectorSource::Vcenter(args) => &args.common,
        }
    }

    async fn run_pipeline(
        &self,
        database_url: &str,
        document: &BundleDocument,
        source: &str,
        dry_run: bool,
    ) -> anyhow::Result<()> {
        let db = establish_connection(database_url).await?;
        let result = import_bundle_via_pipeline(&db, document, source, None, dry_run).await?;
        println!(
            "ipocket import mode: {}",
            if dry_run { "dry-run" } else { "apply" }
        );
        print_import_result(&result);
        Ok(())
    }
}

fn elasticsearch_auth(args: &ElasticsearchArgs) -> anyhow::Result<ElasticsearchAuth> {
    let api_key = args.api_key.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let username = args.username.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let has_password = args.password.is_some();

    if api_key.is_some() && (username.is_some() || has_password) {
        bail!("provide either --api-key or --username/--password, not both");
    }
    if let Some(api_key) = api_key {
        return Ok(ElasticsearchAuth::ApiKey(api_key.to_string()));
    }
    match (username, &args.password) {
        (Some(username), Some(password)) => Ok(ElasticsearchAuth::Basic {
            username: username.to_string(),
            password: password.clone(),
        }),
        (Some(_), None) => bail!("--password is required when --username is provided"),
        (None, Some(_)) => bail!("--username is required when --password is provided"),
        (None, None) => bail!("authentication is required: use --api-key or --username/--password"),
    }
}
