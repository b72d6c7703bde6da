//! # Forms
//!
//! Every form follows the same line: fields pre-populated from the session, local
//! validation, one submit, then either a success message (and a session update) or the
//! server's message unchanged. Nothing is retried.
use std::{future::Future, sync::LazyLock};

use api::{ApiError, AuthService};
use models::{
    ChangePasswordRequest, ForgotPasswordRequest, ProfileUpdate, ResetPasswordRequest, User,
};
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("valid phone pattern"));

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The five composition rules, each checked on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordChecklist {
    pub min_length: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_special: bool,
}

impl PasswordChecklist {
    pub fn evaluate(password: &str) -> Self {
        Self {
            min_length: password.chars().count() >= MIN_PASSWORD_LENGTH,
            has_upper: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lower: password.chars().any(|c| c.is_ascii_lowercase()),
            has_digit: password.chars().any(|c| c.is_ascii_digit()),
            has_special: password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.min_length && self.has_upper && self.has_lower && self.has_digit && self.has_special
    }

    /// Labels in display order, paired with whether each rule holds.
    pub fn items(&self) -> [(&'static str, bool); 5] {
        [
            ("Minimal 8 karakter", self.min_length),
            ("Huruf besar (A-Z)", self.has_upper),
            ("Huruf kecil (a-z)", self.has_lower),
            ("Angka (0-9)", self.has_digit),
            ("Karakter spesial (!@#$...)", self.has_special),
        ]
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Local validation failures, in field order.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", first_message(.fields))]
pub struct FormErrors {
    fields: Vec<FieldError>,
}

fn first_message(fields: &[FieldError]) -> &str {
    fields.first().map(|error| error.message.as_str()).unwrap_or_default()
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.fields.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<FormErrors> for ApiError {
    fn from(errors: FormErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
    Succeeded(String),
    Failed(String),
}

/// Submission lifecycle shared by every form.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    state: FormState,
}

impl Submission {
    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn message(&self) -> Option<&str> {
        match &self.state {
            FormState::Succeeded(message) | FormState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Enters `Submitting`; false when a submission is already running.
    pub fn begin(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }

        self.state = FormState::Submitting;
        true
    }

    pub fn finish<T>(&mut self, result: Result<T, ApiError>, success: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.state = FormState::Succeeded(success.to_string());
                Some(value)
            }
            Err(e) => {
                warn!("Form submission failed: {e}");
                self.state = FormState::Failed(e.to_string());
                None
            }
        }
    }

    pub async fn run<T, F>(&mut self, success: &str, request: F) -> Option<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if !self.begin() {
            return None;
        }

        let result = request.await;
        self.finish(result, success)
    }

    /// Clears the transient message.
    pub fn dismiss(&mut self) {
        if !self.is_submitting() {
            self.state = FormState::Idle;
        }
    }
}

fn check_new_password(errors: &mut FormErrors, password: &str, confirmation: &str) {
    if !PasswordChecklist::evaluate(password).is_satisfied() {
        errors.add("password", "Password belum memenuhi syarat");
    }
    if password != confirmation {
        errors.add("password_confirmation", "Konfirmasi password tidak cocok");
    }
}

fn check_email(errors: &mut FormErrors, email: &str) {
    let email = email.trim();

    if email.is_empty() {
        errors.add("email", "Email wajib diisi");
    } else if !EMAIL.is_match(email) {
        errors.add("email", "Format email tidak valid");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirmation: String,
    pub submission: Submission,
}

impl ChangePasswordForm {
    pub fn checklist(&self) -> PasswordChecklist {
        PasswordChecklist::evaluate(&self.new_password)
    }

    pub fn validate(&self) -> Result<ChangePasswordRequest, FormErrors> {
        let mut errors = FormErrors::default();

        if self.current_password.is_empty() {
            errors.add("current_password", "Password saat ini wajib diisi");
        }
        check_new_password(&mut errors, &self.new_password, &self.confirmation);

        errors.into_result(ChangePasswordRequest {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
            new_password_confirmation: self.confirmation.clone(),
        })
    }

    pub fn can_submit(&self) -> bool {
        !self.submission.is_submitting() && self.validate().is_ok()
    }

    pub async fn submit(&mut self, auth: &AuthService) -> bool {
        let request = match self.validate() {
            Ok(request) => request,
            Err(errors) => return self.submission.finish::<()>(Err(errors.into()), "").is_some(),
        };

        let done = self
            .submission
            .run("Password berhasil diubah", auth.change_password(&request))
            .await
            .is_some();

        if done {
            info!("Password changed");
            self.current_password.clear();
            self.new_password.clear();
            self.confirmation.clear();
        }
        done
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub email: String,
    pub password: String,
    pub confirmation: String,
    pub submission: Submission,
}

impl ResetPasswordForm {
    /// Token and email normally arrive through the reset link.
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn checklist(&self) -> PasswordChecklist {
        PasswordChecklist::evaluate(&self.password)
    }

    pub fn validate(&self) -> Result<ResetPasswordRequest, FormErrors> {
        let mut errors = FormErrors::default();

        if self.token.trim().is_empty() {
            errors.add("token", "Token reset tidak valid");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "Email wajib diisi");
        }
        check_new_password(&mut errors, &self.password, &self.confirmation);

        errors.into_result(ResetPasswordRequest {
            token: self.token.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            password_confirmation: self.confirmation.clone(),
        })
    }

    pub fn can_submit(&self) -> bool {
        !self.submission.is_submitting() && self.validate().is_ok()
    }

    pub async fn submit(&mut self, auth: &AuthService) -> bool {
        let request = match self.validate() {
            Ok(request) => request,
            Err(errors) => return self.submission.finish::<()>(Err(errors.into()), "").is_some(),
        };

        self.submission
            .run(
                "Password berhasil direset. Silakan masuk.",
                auth.reset_password(&request),
            )
            .await
            .is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
    pub submission: Submission,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<ForgotPasswordRequest, FormErrors> {
        let mut errors = FormErrors::default();
        check_email(&mut errors, &self.email);

        errors.into_result(ForgotPasswordRequest {
            email: self.email.trim().to_string(),
        })
    }

    pub fn can_submit(&self) -> bool {
        !self.submission.is_submitting() && self.validate().is_ok()
    }

    pub async fn submit(&mut self, auth: &AuthService) -> bool {
        let request = match self.validate() {
            Ok(request) => request,
            Err(errors) => return self.submission.finish::<()>(Err(errors.into()), "").is_some(),
        };

        self.submission
            .run(
                "Link reset password telah dikirim ke email Anda",
                auth.forgot_password(&request),
            )
            .await
            .is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    email: String,
    pub submission: Submission,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            email: user.email.clone(),
            submission: Submission::default(),
        }
    }

    /// Shown read-only, never part of the update.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn validate(&self) -> Result<ProfileUpdate, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Nama wajib diisi");
        }

        let phone = self.phone.trim();
        if !phone.is_empty() && !PHONE.is_match(phone) {
            errors.add("phone", "Nomor telepon tidak valid");
        }

        errors.into_result(ProfileUpdate {
            name: name.to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        })
    }

    pub fn can_submit(&self) -> bool {
        !self.submission.is_submitting() && self.validate().is_ok()
    }

    /// On success the session user is replaced by the server's copy.
    pub async fn submit(&mut self, auth: &AuthService) -> Option<User> {
        let update = match self.validate() {
            Ok(update) => update,
            Err(errors) => return self.submission.finish(Err(errors.into()), ""),
        };

        let user = self
            .submission
            .run("Profil berhasil diperbarui", auth.update_profile(&update))
            .await?;

        *self = Self {
            submission: self.submission.clone(),
            ..Self::from_user(&user)
        };
        Some(user)
    }

    pub async fn upload_picture(
        &mut self,
        auth: &AuthService,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Option<User> {
        self.submission
            .run(
                "Foto profil berhasil diperbarui",
                auth.upload_picture(file_name, bytes, mime),
            )
            .await
    }
}
