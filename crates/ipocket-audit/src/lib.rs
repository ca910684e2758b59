//! Audit trail for inventory mutations
//!
//! Every create/update/delete against the inventory records one row with a
//! human-readable change description.

pub mod services;

pub use services::audit_service::AuditService;
