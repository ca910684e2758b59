//! Import pipeline orchestrator
//!
//! Straight-line state machine: parse, validate, apply. A parse failure
//! or any validation error short-circuits before storage is touched; the
//! terminal result has the same shape in every outcome so callers branch
//! on `result.errors` instead of catching errors.

use std::sync::Arc;

use tracing::{info, warn};

use ipocket_audit::AuditService;
use ipocket_database::DbConnection;
use ipocket_entities::users;
use ipocket_import_types::{
    ImportApplyResult, ImportInputs, ImportIssue, ImportOptions, Importer,
};
use ipocket_inventory::InventoryResult;

use crate::applier::apply_bundle;
use crate::validator::validate_bundle;

/// Who and what triggered an import, for the audit trail
#[derive(Debug, Clone)]
pub struct ImportAuditContext {
    pub user: Option<users::Model>,
    /// Origin identifier, e.g. `ui_bundle` or `connector_elasticsearch`
    pub source: String,
    /// `apply` or `dry-run`; only real applies are audited
    pub mode: String,
    pub input_label: String,
}

/// Run the full import pipeline with the given importer.
pub async fn run_import(
    db: &Arc<DbConnection>,
    importer: &dyn Importer,
    inputs: &ImportInputs,
    options: &ImportOptions,
    dry_run: bool,
    audit_context: Option<&ImportAuditContext>,
) -> InventoryResult<ImportApplyResult> {
    let bundle = match importer.parse(inputs, options) {
        Ok(bundle) => bundle,
        Err(parse_error) => {
            warn!("Import blocked at parse: {}", parse_error.message);
            return Ok(ImportApplyResult::failed(
                vec![ImportIssue::error(
                    parse_error.location,
                    parse_error.message,
                )],
                Vec::new(),
            ));
        }
    };

    let validation = validate_bundle(db, &bundle).await?;
    if !validation.is_valid() {
        warn!(
            "Import blocked at validation with {} error(s)",
            validation.errors.len()
        );
        return Ok(ImportApplyResult::failed(
            validation.errors,
            validation.warnings,
        ));
    }

    let mut applied = apply_bundle(db, &bundle, dry_run).await?;
    let mut warnings = validation.warnings;
    warnings.append(&mut applied.warnings);
    applied.warnings = warnings;

    if !dry_run && applied.errors.is_empty() {
        if let Some(context) = audit_context.filter(|c| c.mode.eq_ignore_ascii_case("apply")) {
            record_import_apply_audit(db, context, &applied).await?;
        }
    }

    Ok(applied)
}

async fn record_import_apply_audit(
    db: &Arc<DbConnection>,
    context: &ImportAuditContext,
    result: &ImportApplyResult,
) -> InventoryResult<()> {
    let total = result.summary.total();
    let changes = format!(
        "Import apply source={}; input={}; create={}; update={}; skip={}; warnings={}; errors={}.",
        context.source,
        context.input_label,
        total.would_create,
        total.would_update,
        total.would_skip,
        result.warnings.len(),
        result.errors.len()
    );
    AuditService::new(db.clone())
        .create_audit_log(
            context.user.as_ref(),
            "APPLY",
            "IMPORT_RUN",
            0,
            &context.source,
            Some(changes),
        )
        .await
        .map_err(ipocket_inventory::InventoryError::Database)?;
    info!("Recorded import audit entry for {}", context.source);
    Ok(())
}
