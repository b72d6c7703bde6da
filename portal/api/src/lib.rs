//! # Acara API Client
//!
//! Typed access to the Acara event platform backend.
//!
//! ## Layers
//!
//! - [`HttpClient`]: base URL, bearer token, envelope decoding
//! - Service adapters: [`EventService`], [`PaymentService`], [`CertificateService`],
//!   [`AuthService`], one method per endpoint
//! - [`Session`]: the signed-in user, passed explicitly to the client
//!
//! ## Envelope
//!
//! The backend wraps every JSON body as `{ status, data, message }`. The envelope is
//! checked exactly once in [`client::decode`]; callers only ever see `Ok(data)` or an
//! [`ApiError`] whose message can be shown to the user as is.
//!
//! ## Errors
//!
//! - Transport failures: generic message, nothing retried
//! - Server rejections: server message verbatim, fallback when absent
//! - 401 with a token attached: the session is cleared

pub mod auth;
pub mod certificates;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payments;
pub mod session;

pub use auth::AuthService;
pub use certificates::CertificateService;
pub use client::HttpClient;
pub use config::Config;
pub use error::ApiError;
pub use events::EventService;
pub use payments::PaymentService;
pub use session::{FileTokenStore, MemoryTokenStore, Session, StoredSession, TokenStore};

/// Every adapter over one shared client.
#[derive(Clone)]
pub struct Services {
    pub events: EventService,
    pub payments: PaymentService,
    pub certificates: CertificateService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(client: HttpClient) -> Self {
        Self {
            events: EventService::new(client.clone()),
            payments: PaymentService::new(client.clone()),
            certificates: CertificateService::new(client.clone()),
            auth: AuthService::new(client),
        }
    }
}
