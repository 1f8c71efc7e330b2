//! Live reload over WebSocket.
//!
//! The output directory is watched; every changed file is announced to all
//! connected clients as `{"path": "<absolute path>"}`.

mod manager;
mod websocket;

pub use manager::ReloadEvent;
pub(crate) use manager::LiveReload;
pub(crate) use websocket::{client_script, ws_handler};

/// Browser script that connects to the live reload socket.
pub(crate) const CLIENT_SCRIPT: &str = include_str!("client.js");
