//! Webhook receiver HTTP surface

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State as AxumState;
use axum::http::{HeaderMap, StatusCode};
use axum::{Router, routing};
use tracing::{error, info, warn};

use crate::app::App;
use crate::config::AppConfig;
use crate::error::Result;
use crate::webhook::{self, SIGNATURE_HEADER};

struct ReceiverState {
    app: App,
    webhook_secret: Option<String>,
}

type SharedState = Arc<ReceiverState>;

/// Build the receiver router: the webhook endpoint plus every sub-router
/// mounted through [`App::route`].
pub fn router(mut app: App, config: &AppConfig) -> Router {
    let routes = app.take_routes();

    let state = Arc::new(ReceiverState {
        app,
        webhook_secret: config.webhook_secret.clone(),
    });

    let mut router = Router::new()
        .route(&config.webhook_path, routing::post(handle_webhook))
        .with_state(state);

    for (path, sub) in routes {
        router = router.nest(&path, sub);
    }
    router
}

/// Bind and serve the receiver until the process exits.
///
/// Deliveries are dispatched independently as their requests arrive;
/// ordering between deliveries is whatever the sender and connection
/// handling impose. Within one delivery, matched handlers run
/// concurrently and the response is sent once all of them have settled.
pub async fn serve(app: App, config: &AppConfig) -> Result<()> {
    let router = router(app, config);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("listening on {}", config.bind_address);
    info!("webhook endpoint at {}", config.webhook_path);
    axum::serve(listener, router).await?;
    Ok(())
}

/// Handles one webhook delivery POST.
async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // Verify the signature over the raw body before touching the payload.
    if let Some(secret) = &state.webhook_secret {
        let signature_opt = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        let Some(signature) = signature_opt else {
            warn!("delivery rejected: no {} header supplied", SIGNATURE_HEADER);
            return StatusCode::UNAUTHORIZED;
        };
        if !webhook::verify_signature(secret, &body, signature) {
            error!("delivery rejected: signature verification failed");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event = match webhook::parse_delivery(&headers, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!("delivery rejected: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    info!(
        "received '{}' delivery {}",
        event.name(),
        event.delivery_id()
    );

    match state.app.receive(event).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!("dispatch failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
