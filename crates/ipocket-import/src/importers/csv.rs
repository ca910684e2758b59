//! CSV importer for `hosts.csv` and `ip-assets.csv`
//!
//! CSV has no vendor or project sections, so referenced names are
//! synthesized into minimal drafts, and the `os_ip`/`bmc_ip` convenience
//! columns on host rows expand into derived IP-asset drafts.

use std::collections::{HashMap, HashSet};

use csv::{ReaderBuilder, Trim};

use ipocket_core::{split_tag_string, FieldUpdate};
use ipocket_import_types::{
    ImportBundle, ImportHost, ImportIPAsset, ImportInputs, ImportOptions, ImportParseError,
    ImportProject, ImportSource, ImportVendor, Importer,
};

use super::bundle::parse_bool_token;

const HOSTS_FILE: &str = "hosts.csv";
const IP_ASSETS_FILE: &str = "ip-assets.csv";

const HOSTS_REQUIRED_COLUMNS: [&str; 3] = ["name", "notes", "vendor_name"];
const IP_ASSETS_REQUIRED_COLUMNS: [&str; 6] = [
    "ip_address",
    "type",
    "project_name",
    "host_name",
    "notes",
    "archived",
];

/// Parses the `hosts` and/or `ip_assets` CSV inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvImporter;

impl Importer for CsvImporter {
    fn parse(
        &self,
        inputs: &ImportInputs,
        options: &ImportOptions,
    ) -> Result<ImportBundle, ImportParseError> {
        let hosts_input = inputs.get("hosts");
        let assets_input = inputs.get("ip_assets");
        if hosts_input.is_none() && assets_input.is_none() {
            return Err(ImportParseError::new(
                "CSV import requires a hosts.csv or ip-assets.csv input.",
            ));
        }

        let mut hosts = Vec::new();
        let mut ip_assets = Vec::new();
        if let Some(data) = hosts_input {
            let (parsed_hosts, derived_assets) = parse_hosts_csv(data, HOSTS_FILE, options)?;
            hosts = parsed_hosts;
            ip_assets = derived_assets;
        }
        if let Some(data) = assets_input {
            ip_assets.extend(parse_ip_assets_csv(data, IP_ASSETS_FILE, options)?);
        }

        let vendors = derive_vendors(&hosts);
        let projects = derive_projects(&hosts, &ip_assets);
        Ok(ImportBundle {
            vendors,
            projects,
            hosts,
            ip_assets,
        })
    }
}

type CsvRow = (HashMap<String, String>, u64);

fn parse_hosts_csv(
    data: &[u8],
    filename: &str,
    options: &ImportOptions,
) -> Result<(Vec<ImportHost>, Vec<ImportIPAsset>), ImportParseError> {
    let (headers, rows) = read_csv(data, filename)?;
    require_columns(&headers, &HOSTS_REQUIRED_COLUMNS, filename)?;

    let mut hosts = Vec::with_capacity(rows.len());
    let mut derived = Vec::new();
    for (row, line) in rows {
        let source = ImportSource::new(format!("{filename}:line {line}"));
        let mut host = ImportHost::named(cell(&row, "name"), source);
        host.notes = optional_cell(&row, "notes");
        host.vendor_name = optional_cell(&row, "vendor_name");
        host.project_name = optional_cell(&row, "project_name");
        host.os_ip = optional_cell(&row, "os_ip");
        host.bmc_ip = optional_cell(&row, "bmc_ip");

        for (field, asset_type, ip) in [
            ("os_ip", "OS", host.os_ip.clone()),
            ("bmc_ip", "BMC", host.bmc_ip.clone()),
        ] {
            let Some(ip) = ip else { continue };
            let mut asset = ImportIPAsset::new(ip, asset_type, host.source.with_field(field));
            asset.project_name = host.project_name.clone();
            if !host.name.trim().is_empty() {
                asset.host_name = Some(host.name.trim().to_string());
            }
            asset.merge_tags = options.merge_tags;
            asset.preserve_existing_notes = options.preserve_existing_notes;
            derived.push(asset);
        }
        hosts.push(host);
    }
    Ok((hosts, derived))
}

fn parse_ip_assets_csv(
    data: &[u8],
    filename: &str,
    options: &ImportOptions,
) -> Result<Vec<ImportIPAsset>, ImportParseError> {
    let (headers, rows) = read_csv(data, filename)?;
    require_columns(&headers, &IP_ASSETS_REQUIRED_COLUMNS, filename)?;
    let has_tags_column = headers.iter().any(|h| h == "tags");

    let mut assets = Vec::with_capacity(rows.len());
    for (row, line) in rows {
        let source = ImportSource::new(format!("{filename}:line {line}"));
        let mut asset = ImportIPAsset::new(cell(&row, "ip_address"), cell(&row, "type"), source);
        asset.project_name = optional_cell(&row, "project_name");
        asset.host_name = optional_cell(&row, "host_name");
        asset.notes = FieldUpdate::from_option(optional_cell(&row, "notes"));
        asset.archived = row
            .get("archived")
            .and_then(|value| parse_bool_token(value));
        if has_tags_column {
            asset.tags = optional_cell(&row, "tags").map(|value| split_tag_string(&value));
        }
        asset.merge_tags = options.merge_tags;
        asset.preserve_existing_notes = options.preserve_existing_notes;
        assets.push(asset);
    }
    Ok(assets)
}

/// Vendors referenced by host rows, one draft per distinct name with the
/// first-seen row as its source.
fn derive_vendors(hosts: &[ImportHost]) -> Vec<ImportVendor> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut vendors = Vec::new();
    for host in hosts {
        if let Some(vendor_name) = host.vendor_name.as_deref() {
            if seen.insert(vendor_name) {
                vendors.push(ImportVendor {
                    name: vendor_name.to_string(),
                    source: host.source.clone(),
                });
            }
        }
    }
    vendors
}

/// Projects referenced by host or IP-asset rows, deduplicated by name.
fn derive_projects(hosts: &[ImportHost], ip_assets: &[ImportIPAsset]) -> Vec<ImportProject> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut projects = Vec::new();
    let references = hosts
        .iter()
        .filter_map(|host| host.project_name.as_deref().map(|name| (name, &host.source)))
        .chain(
            ip_assets
                .iter()
                .filter_map(|asset| asset.project_name.as_deref().map(|name| (name, &asset.source))),
        );
    for (name, source) in references {
        if seen.insert(name) {
            projects.push(ImportProject {
                name: name.to_string(),
                description: None,
                color: None,
                source: source.clone(),
            });
        }
    }
    projects
}

fn read_csv(data: &[u8], filename: &str) -> Result<(Vec<String>, Vec<CsvRow>), ImportParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ImportParseError::at("CSV is not valid UTF-8.", filename))?;

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|_| ImportParseError::at("Invalid CSV header row.", filename))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ImportParseError::at(format!("Invalid CSV row: {e}."), filename)
        })?;
        // 1-based line of the record start; header is line 1
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);
        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push((row, line));
    }
    Ok((headers, rows))
}

fn require_columns(
    headers: &[String],
    required: &[&str],
    filename: &str,
) -> Result<(), ImportParseError> {
    let mut missing: Vec<&str> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .copied()
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    Err(ImportParseError::at(
        format!("Missing required columns: {}.", missing.join(", ")),
        filename,
    ))
}

fn cell(row: &HashMap<String, String>, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

fn optional_cell(row: &HashMap<String, String>, key: &str) -> Option<String> {
    let value = row.get(key)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(hosts: Option<&str>, ip_assets: Option<&str>) -> ImportInputs {
        let mut map = ImportInputs::new();
        if let Some(hosts) = hosts {
            map.insert("hosts".to_string(), hosts.as_bytes().to_vec());
        }
        if let Some(ip_assets) = ip_assets {
            map.insert("ip_assets".to_string(), ip_assets.as_bytes().to_vec());
        }
        map
    }

    #[test]
    fn test_requires_at_least_one_input() {
        let err = CsvImporter
            .parse(&ImportInputs::new(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(
            err.message,
            "CSV import requires a hosts.csv or ip-assets.csv input."
        );
    }

    #[test]
    fn test_missing_host_columns() {
        let err = CsvImporter
            .parse(
                &inputs(Some("name,notes\nnode-1,"), None),
                &ImportOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.location, "hosts.csv");
        assert_eq!(err.message, "Missing required columns: vendor_name.");
    }

    #[test]
    fn test_rejects_non_utf8() {
        let mut map = ImportInputs::new();
        map.insert("hosts".to_string(), vec![0xff, 0xfe, 0x00]);
        let err = CsvImporter.parse(&map, &ImportOptions::default()).unwrap_err();
        assert_eq!(err.message, "CSV is not valid UTF-8.");
        assert_eq!(err.location, "hosts.csv");
    }

    #[test]
    fn test_host_row_expands_convenience_ips() {
        let bundle = CsvImporter
            .parse(
                &inputs(
                    Some(
                        "name,notes,vendor_name,project_name,os_ip,bmc_ip\n\
                         node-1,rack 4,Dell,Core,10.0.0.5,10.0.0.6\n",
                    ),
                    None,
                ),
                &ImportOptions::default(),
            )
            .unwrap();

        assert_eq!(bundle.hosts.len(), 1);
        assert_eq!(bundle.hosts[0].source.location, "hosts.csv:line 2");

        assert_eq!(bundle.ip_assets.len(), 2);
        let os_asset = &bundle.ip_assets[0];
        assert_eq!(os_asset.ip_address, "10.0.0.5");
        assert_eq!(os_asset.asset_type, "OS");
        assert_eq!(os_asset.project_name.as_deref(), Some("Core"));
        assert_eq!(os_asset.host_name.as_deref(), Some("node-1"));
        assert_eq!(os_asset.source.location, "hosts.csv:line 2.os_ip");
        let bmc_asset = &bundle.ip_assets[1];
        assert_eq!(bmc_asset.asset_type, "BMC");
        assert_eq!(bmc_asset.source.location, "hosts.csv:line 2.bmc_ip");

        // Referenced vendor and project are synthesized as batch drafts
        assert_eq!(bundle.vendors.len(), 1);
        assert_eq!(bundle.vendors[0].name, "Dell");
        assert_eq!(bundle.projects.len(), 1);
        assert_eq!(bundle.projects[0].name, "Core");
    }

    #[test]
    fn test_synthesized_entities_dedup_by_first_seen() {
        let bundle = CsvImporter
            .parse(
                &inputs(
                    Some(
                        "name,notes,vendor_name\nnode-1,,Dell\nnode-2,,Dell\nnode-3,,Supermicro\n",
                    ),
                    Some(
                        "ip_address,type,project_name,host_name,notes,archived\n\
                         10.0.0.5,OS,Core,,,\n\
                         10.0.0.6,VM,Core,,,\n",
                    ),
                ),
                &ImportOptions::default(),
            )
            .unwrap();

        let vendor_names: Vec<&str> = bundle.vendors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(vendor_names, vec!["Dell", "Supermicro"]);
        assert_eq!(bundle.vendors[0].source.location, "hosts.csv:line 2");

        assert_eq!(bundle.projects.len(), 1);
        assert_eq!(bundle.projects[0].source.location, "ip-assets.csv:line 2");
    }

    #[test]
    fn test_ip_asset_rows_parse_fields() {
        let bundle = CsvImporter
            .parse(
                &inputs(
                    None,
                    Some(
                        "ip_address,type,project_name,host_name,notes,archived,tags\n\
                         10.0.0.7,VIP,,lb-1,front door,yes,\"web, prod\"\n\
                         10.0.0.8,OS,,,,,\n",
                    ),
                ),
                &ImportOptions::default(),
            )
            .unwrap();

        let first = &bundle.ip_assets[0];
        assert_eq!(first.host_name.as_deref(), Some("lb-1"));
        assert_eq!(first.notes, FieldUpdate::Set("front door".to_string()));
        assert_eq!(first.archived, Some(true));
        assert_eq!(
            first.tags,
            Some(vec!["web".to_string(), "prod".to_string()])
        );

        let second = &bundle.ip_assets[1];
        assert_eq!(second.notes, FieldUpdate::Unspecified);
        assert_eq!(second.archived, None);
        assert_eq!(second.tags, None);
        assert_eq!(second.source.location, "ip-assets.csv:line 3");
    }

    #[test]
    fn test_options_apply_to_all_rows() {
        let options = ImportOptions {
            merge_tags: true,
            preserve_existing_notes: true,
        };
        let bundle = CsvImporter
            .parse(
                &inputs(
                    Some("name,notes,vendor_name,os_ip\nnode-1,,,10.0.0.5\n"),
                    Some(
                        "ip_address,type,project_name,host_name,notes,archived\n10.0.0.9,OS,,,,\n",
                    ),
                ),
                &options,
            )
            .unwrap();
        assert!(bundle.ip_assets.iter().all(|a| a.merge_tags));
        assert!(bundle.ip_assets.iter().all(|a| a.preserve_existing_notes));
    }
}
