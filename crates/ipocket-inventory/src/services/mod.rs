pub mod host;
pub mod ip_asset;
pub mod project;
pub mod tag;
pub mod types;
pub mod vendor;

pub use host::HostService;
pub use ip_asset::{CreateIpAsset, IpAssetExportRow, IpAssetService, UpdateIpAsset};
pub use project::ProjectService;
pub use tag::TagService;
pub use types::{InventoryError, InventoryResult};
pub use vendor::VendorService;
