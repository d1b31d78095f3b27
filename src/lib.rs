//! A small GitHub App framework: webhook event dispatch, per-delivery
//! context helpers, and app/installation authentication.
//!
//! Register handlers on an [`App`], mount any extra HTTP surface, then
//! hand it to [`server::serve`]:
//!
//! ```no_run
//! use octoapp::{App, AppConfig, JsonObject};
//!
//! #[tokio::main]
//! async fn main() -> octoapp::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let mut app = App::from_config(&config)?;
//!
//!     app.on("issues.opened", |ctx| async move {
//!         if ctx.is_bot() {
//!             return Ok(());
//!         }
//!         let params = ctx.issue(JsonObject::new())?;
//!         tracing::info!("issue #{} opened in {}", params["number"], params["repo"]);
//!         Ok(())
//!     });
//!
//!     octoapp::server::serve(app, &config).await
//! }
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod logging;
pub mod registry;
pub mod server;
pub mod webhook;

pub use app::App;
pub use config::AppConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use event::Event;
pub use registry::EventHandler;

/// JSON object type used for identity params and merged configuration.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
