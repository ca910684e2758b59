//! Database entities for the ipocket inventory
//!
//! sea-orm entity definitions for every stored table plus the string-backed
//! enums persisted in those tables.

pub mod asset_type;
pub mod audit_logs;
pub mod hosts;
pub mod ip_asset_tags;
pub mod ip_assets;
pub mod projects;
pub mod sessions;
pub mod tags;
pub mod user_role;
pub mod users;
pub mod vendors;

pub use asset_type::IpAssetType;
pub use user_role::UserRole;
