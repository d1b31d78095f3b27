//! Event handler registration and lookup

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;

/// Registration key that matches every delivery.
pub const ANY_EVENT: &str = "*";

/// A registered webhook event handler.
///
/// Plain async closures passed to [`App::on`](crate::app::App::on) are
/// wrapped into this trait; implement it directly for handlers that carry
/// their own state.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, ctx: Context) -> Result<()>;
}

/// Wraps an async closure as an [`EventHandler`].
pub(crate) struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: Context) -> Result<()> {
        (self.0)(ctx).await
    }
}

/// Mapping from event key (`"issues"`, `"issues.opened"`, `"*"`) to the
/// handlers registered under it, in registration order.
///
/// Populated while the app is being configured, read on every delivery.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<String, Vec<Box<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn register(&mut self, key: impl Into<String>, handler: Box<dyn EventHandler>) {
        self.handlers.entry(key.into()).or_default().push(handler);
    }

    /// Handlers matching any of the given dispatch keys, plus wildcard
    /// subscribers.
    pub fn matching(&self, keys: &[String]) -> Vec<&dyn EventHandler> {
        let mut matched = Vec::new();
        for key in keys.iter().map(String::as_str).chain([ANY_EVENT]) {
            if let Some(handlers) = self.handlers.get(key) {
                matched.extend(handlers.iter().map(|handler| handler.as_ref()));
            }
        }
        matched
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
