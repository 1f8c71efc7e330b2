//! Configuration management for specdoc.
//!
//! Parses `specdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `source.dir`
//! - `source.entry`
//! - `output.dir`

mod expand;

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "specdoc.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source tree configuration (paths are relative strings from TOML).
    source: SourceConfigRaw,
    /// Output tree configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Renderer options.
    pub render: RenderConfig,
    /// Dev server configuration.
    pub server: ServerConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    dir: Option<String>,
    entry: Option<String>,
    watch_patterns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
}

/// Resolved source and output paths.
#[derive(Debug, Default)]
pub struct PathsConfig {
    /// Source tree root.
    pub source_dir: PathBuf,
    /// Entry-point document inside the source tree.
    pub entry: PathBuf,
    /// Output tree root.
    pub output_dir: PathBuf,
    /// Glob patterns (relative to `source_dir`) that trigger rebuilds.
    pub watch_patterns: Vec<String>,
}

/// How generated assets are referenced from the rendered page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetsMode {
    /// Assets are written but not referenced.
    #[default]
    None,
    /// Assets are written and linked.
    External,
    /// Assets are embedded into the page.
    Inline,
}

/// Renderer options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Script asset file name. Empty string disables the script.
    pub js: String,
    /// Stylesheet asset file name. Empty string disables the stylesheet.
    pub css: String,
    /// Asset inclusion mode.
    pub assets: AssetsMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            js: "spec.js".to_owned(),
            css: "spec.css".to_owned(),
            assets: AssetsMode::None,
        }
    }
}

impl RenderConfig {
    /// Script asset name, `None` when disabled.
    #[must_use]
    pub fn js_name(&self) -> Option<&str> {
        Some(self.js.as_str()).filter(|s| !s.is_empty())
    }

    /// Stylesheet asset name, `None` when disabled.
    #[must_use]
    pub fn css_name(&self) -> Option<&str> {
        Some(self.css.as_str()).filter(|s| !s.is_empty())
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Quiet period for coalescing filesystem events. `0` disables coalescing.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`output.dir`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`}: environment variable not found").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Reject asset names that would escape the output directory.
fn require_plain_file_name(value: &str, field: &str) -> Result<(), ConfigError> {
    let path = Path::new(value);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(ConfigError::Validation(format!(
            "{field} must be a relative path inside the output directory"
        )));
    }
    Ok(())
}

/// Lexically fold `.` and `..` components so prefix checks compare like paths.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `specdoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Relative CLI paths are resolved against the current directory.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(output_dir) = &settings.output_dir {
            self.paths.output_dir = std::path::absolute(output_dir)?;
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            source: SourceConfigRaw::default(),
            output: OutputConfigRaw::default(),
            render: RenderConfig::default(),
            server: ServerConfig::default(),
            live_reload: LiveReloadConfig::default(),
            paths: PathsConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`load`](Self::load) after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".to_owned()));
        }

        if let Some(js) = self.render.js_name() {
            require_plain_file_name(js, "render.js")?;
        }
        if let Some(css) = self.render.css_name() {
            require_plain_file_name(css, "render.css")?;
        }
        if self.render.js_name().is_some() && self.render.js_name() == self.render.css_name() {
            return Err(ConfigError::Validation(
                "render.js and render.css must differ".to_owned(),
            ));
        }

        if !self.paths.entry.starts_with(&self.paths.source_dir) {
            return Err(ConfigError::Validation(format!(
                "source.entry {} is outside source.dir {}",
                self.paths.entry.display(),
                self.paths.source_dir.display()
            )));
        }
        let source_dir = normalize(&self.paths.source_dir);
        let output_dir = normalize(&self.paths.output_dir);
        if output_dir.starts_with(&source_dir) {
            return Err(ConfigError::Validation(
                "output.dir cannot be inside source.dir".to_owned(),
            ));
        }
        // clean empties the output dir, so it must not hold sources or the config
        if source_dir.starts_with(&output_dir) {
            return Err(ConfigError::Validation(
                "output.dir cannot contain source.dir".to_owned(),
            ));
        }
        if let Some(config_path) = &self.config_path
            && normalize(config_path).starts_with(&output_dir)
        {
            return Err(ConfigError::Validation(format!(
                "output.dir cannot contain the config file {}",
                config_path.display()
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_field(&mut self.server.host, "server.host")?;
        expand::expand_optional(&mut self.source.dir, "source.dir")?;
        expand::expand_optional(&mut self.source.entry, "source.entry")?;
        expand::expand_optional(&mut self.output.dir, "output.dir")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths = PathsConfig {
            source_dir: resolve(self.source.dir.as_deref(), "src"),
            entry: resolve(self.source.entry.as_deref(), "src/index.html"),
            output_dir: resolve(self.output.dir.as_deref(), "docs"),
            watch_patterns: self
                .source
                .watch_patterns
                .clone()
                .unwrap_or_else(|| vec!["**/*".to_owned()]),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.paths.source_dir, PathBuf::from("/test/src"));
        assert_eq!(config.paths.entry, PathBuf::from("/test/src/index.html"));
        assert_eq!(config.paths.output_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.paths.watch_patterns, vec!["**/*".to_owned()]);
        assert_eq!(config.render.js_name(), Some("spec.js"));
        assert_eq!(config.render.css_name(), Some("spec.css"));
        assert_eq!(config.render.assets, AssetsMode::None);
        assert!(config.live_reload.enabled);
        assert_eq!(config.live_reload.debounce_ms, 100);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.render.assets, AssetsMode::None);
    }

    #[test]
    fn test_parse_render_config() {
        let toml = r#"
[render]
js = ""
css = "style/spec.css"
assets = "inline"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.render.js_name(), None);
        assert_eq!(config.render.css_name(), Some("style/spec.css"));
        assert_eq!(config.render.assets, AssetsMode::Inline);
    }

    #[test]
    fn test_parse_unknown_assets_mode_fails() {
        let toml = r#"
[render]
assets = "bundle"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[source]
dir = "spec"
entry = "spec/main.html"
watch_patterns = ["**/*.html"]

[output]
dir = "out/site"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.paths.source_dir, PathBuf::from("/project/spec"));
        assert_eq!(config.paths.entry, PathBuf::from("/project/spec/main.html"));
        assert_eq!(config.paths.output_dir, PathBuf::from("/project/out/site"));
        assert_eq!(config.paths.watch_patterns, vec!["**/*.html".to_owned()]);
    }

    #[test]
    fn test_validate_rejects_entry_outside_source() {
        let toml = r#"
[source]
dir = "src"
entry = "other/index.html"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.entry"));
    }

    #[test]
    fn test_validate_rejects_output_inside_source() {
        let toml = r#"
[output]
dir = "src/out"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.dir"));
    }

    #[test]
    fn test_validate_rejects_escaping_asset_name() {
        let toml = r#"
[render]
css = "../spec.css"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(9000),
            live_reload_enabled: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.live_reload.enabled);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/specdoc.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specdoc.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.paths.source_dir, dir.path().join("src"));
        assert_eq!(config.paths.output_dir, dir.path().join("docs"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_validate_rejects_output_containing_source() {
        let mut config: Config = toml::from_str("[output]\ndir = \".\"\n").unwrap();
        config.resolve_paths(Path::new("/project"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.dir cannot contain source.dir"));
    }

    #[test]
    fn test_validate_normalizes_parent_components() {
        let mut config: Config = toml::from_str("[output]\ndir = \"docs/..\"\n").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_output_dir_holding_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specdoc.toml");
        std::fs::write(&path, "[source]\ndir = \"../elsewhere\"\nentry = \"../elsewhere/index.html\"\n[output]\ndir = \".\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(err.to_string().contains("config file"));
    }

    #[test]
    fn test_load_rejects_cli_output_dir_inside_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specdoc.toml");
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            output_dir: Some(dir.path().join("src/out")),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();

        assert!(err.to_string().contains("output.dir cannot be inside source.dir"));
    }

    #[test]
    fn test_cli_output_dir_is_absolute() {
        let mut config = Config::default_with_base(Path::new("/project"));
        let overrides = CliSettings {
            output_dir: Some(PathBuf::from("public")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides).unwrap();

        assert!(config.paths.output_dir.is_absolute());
        assert!(config.paths.output_dir.ends_with("public"));
    }
}
