//! Router construction.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::live_reload;
use crate::middleware;
use crate::state::AppState;

/// Create the application router.
///
/// Everything that is not a live reload route is served from `root`.
pub(crate) fn create_router(root: &Path, state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    if state.live_reload.is_some() {
        router = router
            .route("/livereload", get(live_reload::ws_handler))
            .route("/livereload.js", get(live_reload::client_script));
    }

    router
        .fallback_service(ServeDir::new(root))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::no_cache_layer())
                .layer(middleware::content_type_options_layer()),
        )
        .with_state(state)
}
