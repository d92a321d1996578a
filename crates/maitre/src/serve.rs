// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `maitre serve` command implementation.
//!
//! Wires the production adapters (Twilio transport, Gemini model, SQLite
//! store, log publisher) into the workflow engine and exposes the HTTP
//! surface: `POST /reviews` for ingestion, `POST /webhook` for the Twilio
//! callback, and `GET /healthz`. A background task sweeps expired approval
//! deadlines. Shutdown is coordinated through a `CancellationToken`
//! triggered by SIGINT/SIGTERM.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use maitre_config::model::MaitreConfig;
use maitre_core::types::NewReview;
use maitre_core::{Adapter, MaitreError, ReviewStore};
use maitre_draft::DraftGenerator;
use maitre_engine::{EngineSettings, WorkflowEngine};
use maitre_gateway::{TwilioTransport, normalize_inbound, signature};
use maitre_gemini::GeminiModel;
use maitre_guidelines::GuidelineRules;
use maitre_resilience::RetryPolicy;
use maitre_storage::SqliteReviewStore;

use crate::publisher::LogPublisher;

struct AppState {
    engine: Arc<WorkflowEngine>,
    store: Arc<SqliteReviewStore>,
    config: MaitreConfig,
}

/// Runs the `maitre serve` command.
pub async fn run_serve(config: MaitreConfig) -> Result<(), MaitreError> {
    init_tracing(&config.engine.log_level);
    info!(name = config.engine.name, "starting maitre serve");

    let store = Arc::new(SqliteReviewStore::new(config.storage.clone()));
    store.initialize().await?;

    let transport = Arc::new(TwilioTransport::new(&config.twilio)?);
    let model = Arc::new(GeminiModel::new(&config.gemini)?);
    let publisher = Arc::new(LogPublisher);

    let retry = RetryPolicy {
        max_attempts: config.retry.max_attempts,
        initial_backoff_ms: config.retry.initial_backoff_ms,
        backoff_factor: config.retry.backoff_factor,
    };
    let rules = GuidelineRules {
        occasion_terms: config.guidelines.occasion_terms.clone(),
        manager_contact: config.guidelines.manager_contact.clone(),
        complimentary_item: config.guidelines.complimentary_item.clone(),
    };
    let drafter = DraftGenerator::new(model, config.draft.clone(), retry.clone());
    let settings = EngineSettings::from_config(&config.engine, &config.twilio)?;

    let engine = Arc::new(WorkflowEngine::new(
        store.clone(),
        transport,
        drafter,
        publisher,
        rules,
        retry,
        settings,
    ));

    let cancel = install_signal_handler();

    // Deadline sweep task.
    {
        let sweep_engine = engine.clone();
        let sweep_cancel = cancel.clone();
        let interval_secs = config.engine.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            // Skip the first immediate tick.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match sweep_engine.sweep_expired().await {
                            Ok(0) => debug!("deadline sweep: nothing expired"),
                            Ok(n) => info!(abandoned = n, "deadline sweep abandoned reviews"),
                            Err(e) => warn!(error = %e, "deadline sweep failed"),
                        }
                    }
                    _ = sweep_cancel.cancelled() => {
                        info!("deadline sweep shutting down");
                        break;
                    }
                }
            }
        });
    }

    let state = Arc::new(AppState {
        engine,
        store: store.clone(),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/reviews", post(ingest_review))
        .route("/webhook", post(twilio_webhook))
        .route("/healthz", get(healthz))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|e| MaitreError::Config(format!(
            "cannot bind {}: {e}",
            config.server.bind_address
        )))?;
    info!(address = %config.server.bind_address, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await
        .map_err(|e| MaitreError::Internal(format!("server error: {e}")))?;

    store.close().await?;
    info!("maitre serve shutdown complete");
    Ok(())
}

/// `POST /reviews` - ingest a review and start the approval conversation.
///
/// Generation or delivery exhaustion still answers 2xx: the review is
/// persisted and flagged for attention, and a non-2xx would invite the
/// source to re-submit an id that already exists. 202 signals the flagged
/// case; errors here are infrastructure failures only.
async fn ingest_review(
    State(state): State<Arc<AppState>>,
    axum::Json(new_review): axum::Json<NewReview>,
) -> impl IntoResponse {
    if new_review.id.is_empty() {
        return (StatusCode::BAD_REQUEST, "review id must not be empty").into_response();
    }
    match state.engine.ingest(new_review).await {
        Ok(review) if review.needs_attention => {
            (StatusCode::ACCEPTED, axum::Json(review)).into_response()
        }
        Ok(review) => (StatusCode::CREATED, axum::Json(review)).into_response(),
        Err(e) => {
            error!(error = %e, "review ingestion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("ingestion failed: {e}"),
            )
                .into_response()
        }
    }
}

/// `POST /webhook` - the Twilio inbound message callback.
///
/// Always returns 200 for well-signed requests, even when the payload is
/// malformed or duplicated; Twilio retries non-2xx responses and a retry
/// of garbage is still garbage.
async fn twilio_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    axum::Form(params): axum::Form<Vec<(String, String)>>,
) -> impl IntoResponse {
    let twilio = &state.config.twilio;

    if twilio.validate_signatures {
        let Some(auth_token) = twilio.auth_token.as_deref() else {
            error!("signature validation enabled but no auth token configured");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let signature_header = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let url = webhook_url(&state.config);
        if !signature::validate(auth_token, &url, &params, signature_header) {
            warn!("webhook rejected: bad or missing signature");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let message = match normalize_inbound(&params, twilio.manager_number.as_deref()) {
        Ok(message) => message,
        Err(e) => {
            // Malformed events are acknowledged and dropped.
            warn!(error = %e, "dropping malformed inbound event");
            return StatusCode::OK.into_response();
        }
    };

    match state.engine.handle_inbound(message).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(error = %e, "inbound handling failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /healthz`.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            error!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable").into_response()
        }
    }
}

/// The externally visible webhook URL, as Twilio signed it.
fn webhook_url(config: &MaitreConfig) -> String {
    match &config.server.public_url {
        Some(url) => {
            let base = url.trim_end_matches('/');
            format!("{base}/webhook")
        }
        None => format!("http://{}/webhook", config.server.bind_address),
    }
}

fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("maitre={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_prefers_public_url() {
        let mut config = MaitreConfig::default();
        config.server.public_url = Some("https://maitre.example.com/".to_string());
        assert_eq!(webhook_url(&config), "https://maitre.example.com/webhook");
    }

    #[test]
    fn webhook_url_falls_back_to_bind_address() {
        let config = MaitreConfig::default();
        assert_eq!(webhook_url(&config), "http://127.0.0.1:3000/webhook");
    }
}
