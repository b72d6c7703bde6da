use std::{sync::Arc, time::Duration};

use models::{Envelope, EnvelopeError};
use reqwest::{Client, Method, RequestBuilder, StatusCode, header::AUTHORIZATION, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{config::Config, error::ApiError, session::Session};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrong credentials here say nothing about the stored token.
pub(crate) const LOGIN_PATH: &str = "/auth/login";

/// Thin wrapper over `reqwest` that knows the base URL, the bearer token and the
/// response envelope. Every adapter goes through it.
#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    config: Arc<Config>,
    session: Session,
}

impl HttpClient {
    pub fn new(config: Config, session: Session) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("acara-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.request(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::POST, path).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.request(Method::POST, path)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::PUT, path).json(body)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.send(path, self.request(Method::POST, path).multipart(form)).await
    }

    /// Raw body of a successful response. Failures still arrive as envelopes.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let had_token = self.session.token().is_some();
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            debug!("Downloaded {} bytes from {path}", body.len());
            return Ok(body.to_vec());
        }

        let error = match decode::<()>(status, &body) {
            Err(error) => error,
            Ok(()) => ApiError::server(status.as_u16(), None),
        };

        Err(self.observe(path, error, had_token))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        debug!("{method} {url}");

        let builder = self.http.request(method, url);

        match self.session.token() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let had_token = self.session.token().is_some();
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        decode(status, &body).map_err(|error| self.observe(path, error, had_token))
    }

    /// A rejected token is dropped so the next screen asks for a login.
    fn observe(&self, path: &str, error: ApiError, had_token: bool) -> ApiError {
        if had_token && path != LOGIN_PATH && error.is_unauthorized() {
            warn!("Token rejected by server, signing out");

            if let Err(e) = self.session.sign_out() {
                warn!("Failed to clear session: {e}");
            }
        }

        error
    }
}

/// Turns an HTTP status and body into the typed result, checking the envelope once.
pub fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
        Err(_) if status == StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
        Err(_) => return Err(ApiError::server(status.as_u16(), None)),
    };

    if !status.is_success() {
        let message = envelope.message.filter(|message| !message.trim().is_empty());

        return Err(match (status, message) {
            (StatusCode::UNAUTHORIZED, None) => ApiError::Unauthorized,
            (status, message) => ApiError::server(status.as_u16(), message),
        });
    }

    envelope.into_result().map_err(|e| match e {
        EnvelopeError::Rejected(message) => ApiError::server(status.as_u16(), message),
        EnvelopeError::Data(e) => ApiError::Decode(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use models::{Payment, PaymentStatus};
    use serde_json::json;

    use super::*;
    use crate::error::FALLBACK_MESSAGE;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_success() {
        let payment: Payment = decode(
            StatusCode::OK,
            &body(json!({
                "status": "success",
                "data": {
                    "invoice_number": "INV-001",
                    "amount": 50000,
                    "status": "success",
                    "payment_method": "qris",
                    "payment_channel": "qris",
                    "created_at": "2026-10-01T08:00:00Z",
                    "paid_at": "2026-10-01T08:03:00Z"
                }
            })),
        )
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::Success);
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn test_decode_error_envelope_on_ok_status() {
        let error = decode::<()>(
            StatusCode::OK,
            &body(json!({"status": "error", "message": "Event sudah penuh"})),
        )
        .unwrap_err();

        assert_eq!(error.to_string(), "Event sudah penuh");
    }

    #[test]
    fn test_decode_http_error_without_message() {
        let error = decode::<()>(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>").unwrap_err();

        assert!(matches!(error, ApiError::Server { status: 500, .. }));
        assert_eq!(error.to_string(), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_decode_unauthorized() {
        let bare = decode::<()>(StatusCode::UNAUTHORIZED, b"").unwrap_err();
        assert!(matches!(bare, ApiError::Unauthorized));

        let worded = decode::<()>(
            StatusCode::UNAUTHORIZED,
            &body(json!({"status": "error", "message": "Email atau password salah"})),
        )
        .unwrap_err();
        assert_eq!(worded.to_string(), "Email atau password salah");
        assert!(worded.is_unauthorized());
    }

    #[test]
    fn test_decode_malformed_success() {
        let error = decode::<Payment>(StatusCode::OK, b"{not json").unwrap_err();

        assert!(matches!(error, ApiError::Decode(_)));
    }
}
