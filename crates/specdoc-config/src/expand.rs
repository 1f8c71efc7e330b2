//! `${VAR}` and `${VAR:-default}` expansion in config values.

use std::env::VarError;

use crate::ConfigError;

/// Expand environment references in `value`, in place.
///
/// Values without `${` are left untouched, so a literal `$` in a path
/// survives. An unset variable without a default is an error naming `field`.
pub(crate) fn expand_field(value: &mut String, field: &str) -> Result<(), ConfigError> {
    if !value.contains("${") {
        return Ok(());
    }
    let expanded = shellexpand::env_with_context(value.as_str(), lookup).map_err(|e| {
        ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}}: {}", e.var_name, e.cause),
        }
    })?;
    *value = expanded.into_owned();
    Ok(())
}

/// [`expand_field`] for optional values.
pub(crate) fn expand_optional(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    match value {
        Some(value) => expand_field(value, field),
        None => Ok(()),
    }
}

fn lookup(name: &str) -> Result<Option<String>, VarError> {
    std::env::var(name).map(Some)
}
