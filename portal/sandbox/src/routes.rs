use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State as AxumState, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use models::{
    AuthToken, Certificate, ChangePasswordRequest, CreatePayment, Envelope, EventStatus, ForgotPasswordRequest,
    LoginRequest, Payment, PaymentStatus, ProfileUpdate, ResetPasswordRequest, Role,
};
use tracing::{info, warn};

use crate::{
    error::AppError,
    state::{State, StoredCertificate, StoredPayment},
    utils::{CurrentUser, body, invoice_number, render_certificate, success, success_message},
};

type ApiResult = Result<Json<Envelope>, AppError>;

/// Price of upgrading an account to event organizer.
pub const UPGRADE_PRICE: u64 = 100_000;

const MIN_PASSWORD_LEN: usize = 8;

pub async fn login_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let mut db = state.db();

    let user = match db.account_by_email(&request.email) {
        Some(account) if account.password == request.password => account.user.clone(),
        _ => {
            warn!("Failed login for {}", request.email);
            return Err(AppError::Unauthorized("Email atau password salah".to_string()));
        }
    };

    let token = format!("tok-{}-{}", user.id, db.next_sequence());
    db.tokens.insert(token.clone(), user.id);
    info!("{} signed in", user.email);

    success(&AuthToken { token, user })
}

pub async fn me_handler(CurrentUser(user): CurrentUser) -> ApiResult {
    success(&user)
}

pub async fn forgot_password_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let mut db = state.db();

    let email = db
        .account_by_email(&request.email)
        .map(|account| account.user.email.clone())
        .ok_or_else(|| AppError::not_found("Email tidak terdaftar"))?;

    let token = format!("reset-{}", db.next_sequence());
    info!("Reset token for {email}: {token}");
    db.reset_tokens.insert(token, email);

    Ok(success_message("Link reset password telah dikirim ke email Anda"))
}

pub async fn reset_password_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    check_new_password(&request.password, &request.password_confirmation)?;

    let mut db = state.db();

    match db.reset_tokens.get(&request.token) {
        Some(email) if email.eq_ignore_ascii_case(request.email.trim()) => {}
        _ => return Err(AppError::unprocessable("Token reset password tidak valid")),
    }
    db.reset_tokens.remove(&request.token);

    let account = db
        .account_by_email(&request.email)
        .ok_or_else(|| AppError::not_found("Email tidak terdaftar"))?;
    account.password = request.password;
    info!("Password reset for {}", account.user.email);

    Ok(success_message("Password berhasil diatur ulang"))
}

pub async fn change_password_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let mut db = state.db();
    let account = db.account(user.id).ok_or_else(AppError::unauthorized)?;

    if account.password != request.current_password {
        return Err(AppError::unprocessable("Password saat ini salah"));
    }
    check_new_password(&request.new_password, &request.new_password_confirmation)?;

    account.password = request.new_password;
    info!("Password changed for {}", user.email);

    Ok(success_message("Password berhasil diubah"))
}

pub async fn update_profile_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult {
    let update = body(payload)?;
    let name = update.name.trim();

    if name.is_empty() {
        return Err(AppError::unprocessable("Nama wajib diisi"));
    }

    let mut db = state.db();
    let account = db.account(user.id).ok_or_else(AppError::unauthorized)?;
    account.user.name = name.to_string();
    account.user.phone = update
        .phone
        .map(|phone| phone.trim().to_string())
        .filter(|phone| !phone.is_empty());

    success(&account.user)
}

pub async fn upload_picture_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult {
    let mut picture = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::MalformedPayload)?
    {
        if field.name() != Some("picture") {
            continue;
        }

        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|_| AppError::MalformedPayload)?;
        picture = Some((mime, bytes));
    }

    let (mime, bytes) = picture.ok_or_else(|| AppError::unprocessable("Foto profil wajib diunggah"))?;
    let extension = match mime.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => return Err(AppError::unprocessable("Format foto harus PNG, JPG, atau WEBP")),
    };

    let path = format!("profile-pictures/{}.{extension}", user.id);

    let mut db = state.db();
    db.pictures.insert(path.clone(), (mime, bytes.to_vec()));
    let account = db.account(user.id).ok_or_else(AppError::unauthorized)?;
    account.user.profile_picture = Some(path);

    #[cfg(feature = "verbose")]
    println!("Stored {} byte profile picture for {}", bytes.len(), user.email);

    success(&account.user)
}

pub async fn storage_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let db = state.db();
    let (mime, bytes) = db
        .pictures
        .get(&path)
        .cloned()
        .ok_or_else(|| AppError::not_found("Berkas tidak ditemukan"))?;

    Ok(([(CONTENT_TYPE, mime)], Bytes::from(bytes)).into_response())
}

pub async fn events_handler(AxumState(state): AxumState<Arc<State>>) -> ApiResult {
    let db = state.db();
    let events: Vec<_> = db
        .events
        .iter()
        .filter(|event| event.status != EventStatus::Draft)
        .collect();

    success(&events)
}

pub async fn event_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<u64>,
) -> ApiResult {
    let mut db = state.db();

    match db.event(id) {
        Some(event) if event.status != EventStatus::Draft => success(&*event),
        _ => Err(AppError::not_found("Event tidak ditemukan")),
    }
}

pub async fn create_payment_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreatePayment>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;

    if !request.payment_method.accepts(&request.payment_channel) {
        return Err(AppError::unprocessable("Silakan pilih metode pembayaran"));
    }

    let mut db = state.db();

    let amount = match request.event_id {
        Some(event_id) => {
            let event = db
                .event(event_id)
                .filter(|event| event.status == EventStatus::Published)
                .ok_or_else(|| AppError::not_found("Event tidak ditemukan"))?;

            if event.is_full() {
                return Err(AppError::unprocessable("Kuota event sudah penuh"));
            }
            if event.is_free() {
                return Err(AppError::unprocessable("Event ini gratis, tidak perlu pembayaran"));
            }
            let price = event.price;

            if db.is_registered(user.id, event_id) {
                return Err(AppError::unprocessable("Anda sudah terdaftar di event ini"));
            }

            price
        }
        None => {
            if user.role != Role::User {
                return Err(AppError::unprocessable(
                    "Akun Anda sudah memiliki akses penyelenggara",
                ));
            }

            UPGRADE_PRICE
        }
    };

    let now = Utc::now();
    let sequence = db.next_sequence();
    let payment = Payment {
        invoice_number: invoice_number(now, sequence),
        amount,
        status: PaymentStatus::Pending,
        payment_method: request.payment_method,
        payment_channel: request.payment_channel,
        event_id: request.event_id,
        created_at: now,
        paid_at: None,
        expired_at: Some(now + state.config.payment_ttl),
    };

    info!("{} created payment {}", user.email, payment.invoice_number);
    db.payments.push(StoredPayment {
        owner: user.id,
        payment: payment.clone(),
    });

    success(&payment)
}

pub async fn payment_status_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(invoice): Path<String>,
) -> ApiResult {
    let mut db = state.db();
    db.expire_payments();

    let stored = db
        .payment(&invoice)
        .filter(|stored| stored.owner == user.id || user.role == Role::Admin)
        .ok_or_else(|| AppError::not_found("Pembayaran tidak ditemukan"))?;

    success(&stored.payment)
}

pub async fn simulate_success_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(invoice): Path<String>,
) -> ApiResult {
    if !state.config.dev_mode {
        warn!("Simulated payment for {invoice} rejected, dev mode disabled");
        return Err(AppError::Forbidden);
    }

    let mut db = state.db();
    db.expire_payments();

    let stored = db
        .payment(&invoice)
        .filter(|stored| stored.owner == user.id || user.role == Role::Admin)
        .ok_or_else(|| AppError::not_found("Pembayaran tidak ditemukan"))?;

    if stored.payment.status != PaymentStatus::Pending {
        return Err(AppError::unprocessable("Pembayaran sudah diproses"));
    }

    stored.payment.status = PaymentStatus::Success;
    stored.payment.paid_at = Some(Utc::now());
    let owner = stored.owner;
    let payment = stored.payment.clone();
    info!("Payment {invoice} marked as paid");

    match payment.event_id {
        Some(event_id) => {
            let title = match db.event(event_id) {
                Some(event) => {
                    event.registered_count += 1;
                    event.title.clone()
                }
                None => String::new(),
            };
            let participant_name = db
                .account(owner)
                .map(|account| account.user.name.clone())
                .unwrap_or_default();
            let id = db.next_sequence() + 1000;

            db.certificates.push(StoredCertificate {
                owner,
                certificate: Certificate {
                    id,
                    event_id,
                    event_title: title,
                    participant_name,
                    is_ready: false,
                    download_count: 0,
                },
            });
        }
        None => {
            if let Some(account) = db.account(owner) {
                account.user.role = Role::EventOrganizer;
                info!("{} upgraded to event organizer", account.user.email);
            }
        }
    }

    success(&payment)
}

pub async fn admin_payments_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    let mut db = state.db();
    db.expire_payments();

    let payments: Vec<&Payment> = db.payments.iter().map(|stored| &stored.payment).collect();

    success(&payments)
}

pub async fn certificates_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    let db = state.db();
    let certificates: Vec<_> = db
        .certificates
        .iter()
        .filter(|stored| stored.owner == user.id)
        .map(|stored| &stored.certificate)
        .collect();

    success(&certificates)
}

pub async fn download_certificate_handler(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let mut db = state.db();

    let stored = db
        .certificates
        .iter_mut()
        .find(|stored| stored.certificate.id == id && stored.owner == user.id)
        .ok_or_else(|| AppError::not_found("Sertifikat tidak ditemukan"))?;

    if !stored.certificate.is_ready {
        return Err(AppError::unprocessable("Sertifikat belum tersedia"));
    }

    stored.certificate.download_count += 1;
    let pdf = render_certificate(&stored.certificate);

    Ok((StatusCode::OK, [(CONTENT_TYPE, "application/pdf")], pdf).into_response())
}

fn check_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::unprocessable("Password minimal 8 karakter"));
    }
    if password != confirmation {
        return Err(AppError::unprocessable("Konfirmasi password tidak cocok"));
    }

    Ok(())
}
