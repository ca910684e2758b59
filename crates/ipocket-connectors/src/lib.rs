//! Inventory connectors
//!
//! Adapters that scrape IP inventory from external systems and package it
//! into the bundle format the import pipeline consumes. Every connector
//! follows the same shape: fetch raw records, extract one usable IPv4
//! address per record (rejections become warnings), deduplicate by IP,
//! and build a `schema_version: "1"` bundle to write to disk or feed
//! straight into `run_import`.

pub mod common;
pub mod elasticsearch;
pub mod error;
pub mod prometheus;
pub mod vcenter;

pub use common::{
    build_ip_asset_bundle, import_bundle_via_pipeline, write_bundle_json, AssetDefaults,
};
pub use error::ConnectorError;
