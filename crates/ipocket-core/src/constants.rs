/// Fallback color for projects created without an explicit color
pub const DEFAULT_PROJECT_COLOR: &str = "#94a3b8";

/// Fallback color for tags created without an explicit color
pub const DEFAULT_TAG_COLOR: &str = "#e2e8f0";
