//! HTTP/WebSocket hub server
//!
//! This module provides the subscriber-facing surface:
//! - WebSocket push feeds (`/ws/buzz`, `/ws/data`, `/ws/chart`)
//! - A small REST status API under `/api/`
//! - Optional static serving of the dashboard assets

pub mod api;
pub mod config;
pub mod server;
pub mod ws;

pub use api::ApiResponse;
pub use config::{ConfigError, HubConfig};
pub use server::{AppState, HubError, HubServer};
