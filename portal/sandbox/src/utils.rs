use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, rejection::JsonRejection},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use models::{Certificate, Envelope, User};
use serde::Serialize;

use crate::{error::AppError, state::State};

/// Caller resolved from the `Authorization: Bearer` header.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(AppError::unauthorized)?;

        let mut db = state.db();
        let id = *db.tokens.get(token).ok_or_else(AppError::unauthorized)?;
        let account = db.account(id).ok_or_else(AppError::unauthorized)?;

        Ok(CurrentUser(account.user.clone()))
    }
}

pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|_| AppError::MalformedPayload)
}

pub fn success<T: Serialize>(data: &T) -> Result<Json<Envelope>, AppError> {
    let value = serde_json::to_value(data).map_err(|e| AppError::InternalError(Box::new(e)))?;

    Ok(Json(Envelope::success(value)))
}

pub fn success_message(message: &str) -> Json<Envelope> {
    Json(Envelope::success_with_message(serde_json::Value::Null, message))
}

pub fn invoice_number(now: DateTime<Utc>, sequence: u64) -> String {
    format!("INV-{}-{sequence:04}", now.format("%Y%m%d"))
}

/// Tiny single-page PDF carrying the participant and event names.
pub fn render_certificate(certificate: &Certificate) -> Vec<u8> {
    let text = format!(
        "Sertifikat {} - {}",
        sanitize(&certificate.participant_name),
        sanitize(&certificate.event_title)
    );
    let stream = format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET");

    format!(
        "%PDF-1.4\n\
         1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
         2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n\
         3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 842 595] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >> endobj\n\
         4 0 obj << /Length {} >> stream\n{stream}\nendstream endobj\n\
         5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n\
         trailer << /Root 1 0 R >>\n%EOF\n",
        stream.len()
    )
    .into_bytes()
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii() && !matches!(c, '(' | ')' | '\\'))
        .collect()
}
