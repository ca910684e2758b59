//! End-to-end pipeline tests against an in-memory store

use std::sync::Arc;

use serde_json::{json, Value};

use ipocket_database::test_utils::TestDatabase;
use ipocket_database::DbConnection;
use ipocket_entities::IpAssetType;
use ipocket_import::{
    apply_bundle, export_bundle, run_import, validate_bundle, BundleImporter, CsvImporter,
};
use ipocket_import_types::{ImportInputs, ImportOptions, Importer, IssueLevel};
use ipocket_inventory::{
    CreateIpAsset, HostService, IpAssetService, ProjectService, TagService, VendorService,
};

fn bundle_inputs(data: Value) -> ImportInputs {
    let document = json!({
        "app": "ipocket",
        "schema_version": "1",
        "exported_at": "2025-06-01T12:00:00Z",
        "data": data
    });
    let mut inputs = ImportInputs::new();
    inputs.insert("bundle".to_string(), document.to_string().into_bytes());
    inputs
}

async fn run_bundle_import(
    db: &Arc<DbConnection>,
    data: Value,
    dry_run: bool,
) -> anyhow::Result<ipocket_import_types::ImportApplyResult> {
    Ok(run_import(
        db,
        &BundleImporter,
        &bundle_inputs(data),
        &ImportOptions::default(),
        dry_run,
        None,
    )
    .await?)
}

fn sample_data() -> Value {
    json!({
        "vendors": [{"name": "Dell"}],
        "projects": [{"name": "Core", "description": "main racks", "color": "#0ea5e9"}],
        "hosts": [{"name": "node-1", "notes": "rack 4", "vendor_name": "Dell"}],
        "ip_assets": [
            {
                "ip_address": "10.0.0.5",
                "type": "OS",
                "project_name": "Core",
                "host_name": "node-1",
                "notes": "primary",
                "archived": false,
                "tags": ["web", "prod"]
            },
            {"ip_address": "10.0.0.6", "type": "BMC", "host_name": "node-1"}
        ]
    })
}

#[tokio::test]
async fn test_apply_then_reapply_is_idempotent() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let first = run_bundle_import(&db, sample_data(), false).await?;
    assert!(first.errors.is_empty());
    let total = first.summary.total();
    assert_eq!(total.would_create, 5);
    assert_eq!(total.would_update, 0);
    assert_eq!(total.would_skip, 0);

    let second = run_bundle_import(&db, sample_data(), false).await?;
    assert!(second.errors.is_empty());
    let total = second.summary.total();
    assert_eq!(total.would_create, 0);
    assert_eq!(total.would_update, 0);
    assert_eq!(total.would_skip, 5);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_forecasts_apply_and_mutates_nothing() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let dry = run_bundle_import(&db, sample_data(), true).await?;
    assert!(dry.errors.is_empty());

    // Nothing was written
    assert!(VendorService::new(db.clone()).list().await?.is_empty());
    assert!(ProjectService::new(db.clone()).list().await?.is_empty());
    assert!(HostService::new(db.clone()).list().await?.is_empty());
    assert!(IpAssetService::new(db.clone()).list_all().await?.is_empty());

    let real = run_bundle_import(&db, sample_data(), false).await?;
    assert_eq!(dry.summary, real.summary);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_ip_in_batch_creates_once_and_warns() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let result = run_bundle_import(
        &db,
        json!({
            "ip_assets": [
                {"ip_address": "10.0.0.9", "type": "OS"},
                {"ip_address": "10.0.0.9", "type": "VM"}
            ]
        }),
        false,
    )
    .await?;

    assert_eq!(result.summary.ip_assets.would_create, 1);
    assert_eq!(result.summary.ip_assets.would_skip, 1);
    let duplicate_warning = result
        .warnings
        .iter()
        .find(|issue| issue.message == "Duplicate IP address in import batch.")
        .expect("duplicate warning present");
    assert_eq!(duplicate_warning.location, "data.ip_assets[1]");
    assert_eq!(duplicate_warning.level, IssueLevel::Warning);

    let assets = IpAssetService::new(db.clone()).list_all().await?;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].asset_type, IpAssetType::Os);
    Ok(())
}

#[tokio::test]
async fn test_tag_merge_unions_and_replace_overwrites() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();
    let assets = IpAssetService::new(db.clone());
    let tags = TagService::new(db.clone());

    let asset = assets
        .create(
            CreateIpAsset {
                ip_address: "10.0.0.5".to_string(),
                asset_type: IpAssetType::Os,
                tags: Some(vec!["a".to_string(), "b".to_string()]),
                ..Default::default()
            },
            None,
        )
        .await?;

    let merged = run_bundle_import(
        &db,
        json!({
            "ip_assets": [
                {"ip_address": "10.0.0.5", "type": "OS", "tags": ["b", "c"], "merge_tags": true}
            ]
        }),
        false,
    )
    .await?;
    assert_eq!(merged.summary.ip_assets.would_update, 1);
    let current = tags.list_tags_for_ip_assets(&[asset.id]).await?;
    assert_eq!(current[&asset.id], vec!["a", "b", "c"]);

    let replaced = run_bundle_import(
        &db,
        json!({
            "ip_assets": [
                {"ip_address": "10.0.0.5", "type": "OS", "tags": ["b", "c"]}
            ]
        }),
        false,
    )
    .await?;
    assert_eq!(replaced.summary.ip_assets.would_update, 1);
    let current = tags.list_tags_for_ip_assets(&[asset.id]).await?;
    assert_eq!(current[&asset.id], vec!["b", "c"]);

    // Absent tags leave the set untouched; an empty list clears it
    let untouched = run_bundle_import(
        &db,
        json!({"ip_assets": [{"ip_address": "10.0.0.5", "type": "OS"}]}),
        false,
    )
    .await?;
    assert_eq!(untouched.summary.ip_assets.would_skip, 1);

    run_bundle_import(
        &db,
        json!({"ip_assets": [{"ip_address": "10.0.0.5", "type": "OS", "tags": []}]}),
        false,
    )
    .await?;
    let current = tags.list_tags_for_ip_assets(&[asset.id]).await?;
    assert!(current[&asset.id].is_empty());
    Ok(())
}

#[tokio::test]
async fn test_validation_collects_every_violation() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let result = run_bundle_import(
        &db,
        json!({
            "vendors": [{"name": "  "}],
            "projects": [{"name": "Core", "color": "not-a-color"}],
            "ip_assets": [
                {"ip_address": "10.0.0", "type": "SERVER", "project_name": "Missing"}
            ]
        }),
        false,
    )
    .await?;

    assert_eq!(result.errors.len(), 5);
    let locations: Vec<&str> = result
        .errors
        .iter()
        .map(|issue| issue.location.as_str())
        .collect();
    assert!(locations.contains(&"data.vendors[0]"));
    assert!(locations.contains(&"data.projects[0].color"));
    assert!(locations.contains(&"data.ip_assets[0].ip_address"));
    assert!(locations.contains(&"data.ip_assets[0].type"));
    assert!(locations.contains(&"data.ip_assets[0].project_name"));
    assert!(result
        .errors
        .iter()
        .any(|issue| issue.message == "Invalid asset type. Use OS, BMC, VM, VIP, OTHER."));
    assert!(result
        .errors
        .iter()
        .any(|issue| issue.message == "Project does not exist."));

    // Blocked runs report all-zero summaries and write nothing
    assert!(IpAssetService::new(db.clone()).list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unsupported_schema_version_short_circuits() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let mut inputs = ImportInputs::new();
    inputs.insert(
        "bundle".to_string(),
        json!({"schema_version": "2", "data": {}}).to_string().into_bytes(),
    );
    let result = run_import(
        &db,
        &BundleImporter,
        &inputs,
        &ImportOptions::default(),
        false,
        None,
    )
    .await?;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].location, "schema_version");
    assert_eq!(
        result.errors[0].message,
        "Unsupported schema_version (expected '1')."
    );
    let total = result.summary.total();
    assert_eq!(
        (total.would_create, total.would_update, total.would_skip),
        (0, 0, 0)
    );
    Ok(())
}

#[tokio::test]
async fn test_batch_declared_names_satisfy_references() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let inputs = bundle_inputs(json!({
        "projects": [{"name": "Core"}],
        "hosts": [{"name": "node-1"}],
        "ip_assets": [
            {"ip_address": "10.0.0.5", "type": "OS", "project_name": "Core", "host_name": "node-1"}
        ]
    }));
    let bundle = BundleImporter.parse(&inputs, &ImportOptions::default())?;
    let validation = validate_bundle(&db, &bundle).await?;
    assert!(validation.is_valid(), "errors: {:?}", validation.errors);

    // Dry-run resolves the same-batch references without creating rows
    let result = apply_bundle(&db, &bundle, true).await?;
    assert_eq!(result.summary.projects.would_create, 1);
    assert_eq!(result.summary.hosts.would_create, 1);
    assert_eq!(result.summary.ip_assets.would_create, 1);
    assert!(ProjectService::new(db.clone()).list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_related_record_update_emits_single_warning() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();
    ProjectService::new(db.clone())
        .create("Core", None, None)
        .await?;

    let result = run_bundle_import(
        &db,
        json!({"projects": [{"name": "Core", "description": "new description"}]}),
        false,
    )
    .await?;

    assert_eq!(result.summary.projects.would_update, 1);
    let related: Vec<_> = result
        .warnings
        .iter()
        .filter(|issue| issue.message == "Some related records were updated based on import data.")
        .collect();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].location, "import");

    // IP-asset-only updates do not trigger the warning
    let result = run_bundle_import(
        &db,
        json!({"ip_assets": [{"ip_address": "10.0.0.5", "type": "OS", "notes": "x"}]}),
        false,
    )
    .await?;
    assert!(result.warnings.is_empty());
    let result = run_bundle_import(
        &db,
        json!({"ip_assets": [{"ip_address": "10.0.0.5", "type": "OS", "notes": "changed"}]}),
        false,
    )
    .await?;
    assert_eq!(result.summary.ip_assets.would_update, 1);
    assert!(result.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_preserve_existing_notes_keeps_manual_annotations() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    IpAssetService::new(db.clone())
        .create(
            CreateIpAsset {
                ip_address: "10.0.0.5".to_string(),
                asset_type: IpAssetType::Os,
                notes: Some("hand-written note".to_string()),
                ..Default::default()
            },
            None,
        )
        .await?;

    let result = run_bundle_import(
        &db,
        json!({"ip_assets": [{
            "ip_address": "10.0.0.5",
            "type": "OS",
            "notes": "connector note",
            "preserve_existing_notes": true
        }]}),
        false,
    )
    .await?;
    assert_eq!(result.summary.ip_assets.would_skip, 1);
    let asset = IpAssetService::new(db.clone())
        .get_by_ip("10.0.0.5")
        .await?
        .expect("asset exists");
    assert_eq!(asset.notes.as_deref(), Some("hand-written note"));
    Ok(())
}

#[tokio::test]
async fn test_csv_import_expands_and_synthesizes() -> anyhow::Result<()> {
    let test_db = TestDatabase::new().await?;
    let db = test_db.connection_arc();

    let mut inputs = ImportInputs::new();
    inputs.insert(
        "hosts".to_string(),
        b"name,notes,vendor_name,project_name,os_ip,bmc_ip\n\
          node-1,rack 4,Dell,Core,10.0.0.5,10.0.0.6\n"
            .to_vec(),
    );
    let result = run_import(
        &db,
        &CsvImporter,
        &inputs,
        &ImportOptions::default(),
        false,
        None,
    )
    .await?;
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

    assert_eq!(result.summary.vendors.would_create, 1);
    assert_eq!(result.summary.projects.would_create, 1);
    assert_eq!(result.summary.hosts.would_create, 1);
    assert_eq!(result.summary.ip_assets.would_create, 2);

    let assets = IpAssetService::new(db.clone()).list_all().await?;
    let types: Vec<IpAssetType> = assets.iter().map(|a| a.asset_type).collect();
    assert!(types.contains(&IpAssetType::Os));
    assert!(types.contains(&IpAssetType::Bmc));

    let host = HostService::new(db.clone())
        .get_by_name("node-1")
        .await?
        .expect("host created");
    assert!(assets.iter().all(|a| a.host_id == Some(host.id)));
    Ok(())
}

#[tokio::test]
async fn test_export_import_round_trip() -> anyhow::Result<()> {
    let source_db = TestDatabase::new().await?;
    let db = source_db.connection_arc();

    run_bundle_import(&db, sample_data(), false).await?;
    let document = export_bundle(&db, true).await?;

    let target_db = TestDatabase::new().await?;
    let target = target_db.connection_arc();
    let mut inputs = ImportInputs::new();
    inputs.insert(
        "bundle".to_string(),
        serde_json::to_vec(&document)?,
    );
    let result = run_import(
        &target,
        &BundleImporter,
        &inputs,
        &ImportOptions::default(),
        false,
        None,
    )
    .await?;
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

    let exported_again = export_bundle(&target, true).await?;
    assert_eq!(
        serde_json::to_value(&document.data)?,
        serde_json::to_value(&exported_again.data)?
    );
    Ok(())
}
