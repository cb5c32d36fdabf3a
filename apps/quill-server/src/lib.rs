//! # Quill Server
//!
//! The JSON API of the Quill blog on actix-web. The binary in `main.rs`
//! wires configuration and telemetry around the pieces exported here.

pub mod background;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use handlers::configure_routes;
pub use state::{AppState, StartupError, Stores};
