//! App facade: event subscriptions, custom routes, authentication, dispatch

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use octocrab::Octocrab;
use tracing::{debug, error, info};

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::registry::{ANY_EVENT, EventHandler, FnHandler, HandlerRegistry};

/// A GitHub App: event subscriptions, mounted routes, and authentication.
///
/// Register handlers and routes first, then hand the app to
/// [`server::serve`](crate::server::serve), or feed it events directly
/// through [`receive`](App::receive). Registration takes `&mut self`, so
/// the registration table is never written concurrently with dispatch.
pub struct App {
    auth: AuthProvider,
    registry: HandlerRegistry,
    routes: Vec<(String, axum::Router)>,
}

impl App {
    /// Build an app from credentials.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::from_auth(AuthProvider::from_config(config)?))
    }

    /// Build an app around an existing authenticated client.
    pub fn from_client(client: Octocrab) -> Self {
        Self::from_auth(AuthProvider::from_client(client))
    }

    fn from_auth(auth: AuthProvider) -> Self {
        Self {
            auth,
            registry: HandlerRegistry::default(),
            routes: Vec::new(),
        }
    }

    /// Subscribe to deliveries matching `event_key`: a bare event name
    /// (`"issues"`) or an event-action pair (`"issues.opened"`). A single
    /// delivery may match several registrations; each matched handler is
    /// invoked exactly once with its own [`Context`].
    pub fn on<F, Fut>(&mut self, event_key: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.registry.register(event_key, Box::new(FnHandler(handler)));
        self
    }

    /// Subscribe to every delivery.
    pub fn on_any<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on(ANY_EVENT, handler)
    }

    /// Mount `router` under `path` on the receiver's HTTP surface.
    pub fn route(&mut self, path: impl Into<String>, router: axum::Router) -> Result<&mut Self> {
        let path = path.into();
        if !path.starts_with('/') || path == "/" {
            return Err(Error::Config(format!(
                "mount path must start with '/' and not be the root, got '{}'",
                path
            )));
        }
        if self.routes.iter().any(|(mounted, _)| *mounted == path) {
            return Err(Error::RouteConflict(path));
        }
        self.routes.push((path, router));
        Ok(self)
    }

    /// An authenticated client scoped to `installation_id`, or to the app
    /// itself when `None`. Installation scoping exchanges credentials for
    /// a token up front; exchange failures surface here.
    pub async fn auth(&self, installation_id: Option<u64>) -> Result<Octocrab> {
        self.auth.authenticate(installation_id).await
    }

    /// Dispatch one delivery to every matching handler.
    ///
    /// Matched handlers run concurrently, each with its own [`Context`]
    /// sharing the delivery payload and client. Handler failures are
    /// isolated: every handler settles, each failure is logged on its
    /// own, and the combined failure is reported once all have finished.
    /// A delivery matching no registration settles successfully.
    pub async fn receive(&self, event: Event) -> Result<()> {
        let keys = event.dispatch_keys();
        let handlers = self.registry.matching(&keys);
        if handlers.is_empty() {
            debug!("no handlers registered for event '{}'", event.name());
            return Ok(());
        }

        let client = self.auth.client_for(event.installation_id())?;
        let event = Arc::new(event);

        info!(
            "dispatching event '{}' (delivery {}) to {} handler(s)",
            event.name(),
            event.delivery_id(),
            handlers.len()
        );

        let pending = handlers
            .into_iter()
            .map(|handler| handler.handle(Context::new(event.clone(), client.clone())));
        let results = join_all(pending).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|result| result.err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            error!("handler for event '{}' failed: {}", event.name(), failure);
        }
        Err(Error::Dispatch {
            event: event.name().to_string(),
            failed: failures.len(),
            detail: failures.join("; "),
        })
    }

    pub(crate) fn take_routes(&mut self) -> Vec<(String, axum::Router)> {
        std::mem::take(&mut self.routes)
    }
}
