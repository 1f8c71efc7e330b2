//! Render options.

/// How the page refers to the generated script and stylesheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssetMode {
    /// Assets are written next to the page but not referenced by it.
    #[default]
    None,
    /// Assets are written next to the page and linked from it.
    External,
    /// Asset contents are embedded in the page; no asset files are written.
    Inline,
}

/// Fixed configuration of the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Script asset path relative to the output directory (`None` omits it).
    pub js: Option<String>,
    /// Stylesheet asset path relative to the output directory (`None` omits it).
    pub css: Option<String>,
    pub assets: AssetMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            js: Some("spec.js".to_owned()),
            css: Some("spec.css".to_owned()),
            assets: AssetMode::None,
        }
    }
}
