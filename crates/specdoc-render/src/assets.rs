//! Bundled page assets.

/// Stylesheet for rendered specifications.
pub const STYLESHEET: &str = include_str!("../assets/spec.css");

/// Client script for rendered specifications.
pub const SCRIPT: &str = include_str!("../assets/spec.js");
