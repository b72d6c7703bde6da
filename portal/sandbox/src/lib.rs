//! In-memory stand-in for the Acara backend.
//!
//! Serves the same REST surface the portal client consumes so every flow can be run
//! locally and in integration tests without the real platform.
//!
//!
//!
//! # Surface
//! - Everything under `/api` answers with the `{ status, data, message }` envelope
//! - `/storage/*` serves uploaded profile pictures, mirroring how the real deployment
//!   derives its storage URL from the API URL
//! - Bearer tokens come from `POST /api/auth/login` and live until the process exits
//!
//!
//!
//! # Seeded Accounts
//!
//! | Email | Password | Role |
//! |-------|----------|------|
//! | admin@acara.test | Admin123! | admin |
//! | budi@acara.test | Peserta123! | user |
//! | sari@acara.test | Panitia123! | event_organizer |
//!
//!
//!
//! # Payments
//! - New payments start `pending` and expire after `SANDBOX_PAYMENT_TTL_SECS`
//! - Expiry is applied lazily whenever a payment is read
//! - `POST /api/payments/{invoice}/simulate-success` confirms a payment and is only
//!   honoured when `SANDBOX_DEV_MODE` is on (the default), 403 otherwise
//! - A paid event registration adds a participant and a certificate that is not ready
//!   yet; a paid upgrade turns the account into an event organizer
//!
//!
//!
//! # Setup
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info cargo run -p sandbox
//! ```
//!
//! Point the console at it.
//! ```sh
//! ACARA_API_URL=http://localhost:8000/api ACARA_DEV_MODE=true cargo run -p console -- events
//! ```
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{
    admin_payments_handler, certificates_handler, change_password_handler,
    create_payment_handler, download_certificate_handler, event_handler, events_handler,
    forgot_password_handler, login_handler, me_handler, payment_status_handler,
    reset_password_handler, simulate_success_handler, storage_handler, update_profile_handler,
    upload_picture_handler,
};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", post(reset_password_handler))
        .route("/auth/change-password", post(change_password_handler))
        .route("/profile", put(update_profile_handler))
        .route("/profile/picture", post(upload_picture_handler))
        .route("/events", get(events_handler))
        .route("/events/{id}", get(event_handler))
        .route("/payments", post(create_payment_handler))
        .route("/payments/{invoice}", get(payment_status_handler))
        .route(
            "/payments/{invoice}/simulate-success",
            post(simulate_success_handler),
        )
        .route("/admin/payments", get(admin_payments_handler))
        .route("/certificates", get(certificates_handler))
        .route("/certificates/{id}/download", get(download_certificate_handler));

    Router::new()
        .nest("/api", api)
        .route("/storage/{*path}", get(storage_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let config = Config::load()?;
    let state = State::new(config);

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Serves on an ephemeral localhost port in the background; returns the API base URL.
pub async fn spawn_local(config: Config) -> std::io::Result<String> {
    spawn_with_state(State::new(config)).await
}

/// Like [`spawn_local`], but over a caller-held state so tests can look inside.
pub async fn spawn_with_state(state: Arc<State>) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address: SocketAddr = listener.local_addr()?;
    let router = app(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Sandbox stopped: {e}");
        }
    });

    Ok(format!("http://{address}/api"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
