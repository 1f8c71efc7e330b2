//! Application state.

use crate::live_reload::LiveReload;

/// State shared across all handlers.
pub(crate) struct AppState {
    /// Live reload broadcaster (if enabled).
    pub(crate) live_reload: Option<LiveReload>,
}
