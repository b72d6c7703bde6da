use models::{
    AuthToken, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ProfileUpdate,
    ResetPasswordRequest, User,
};
use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::{
    client::{HttpClient, LOGIN_PATH},
    error::ApiError,
};

/// Login, password recovery and profile endpoints. Every call that returns a user
/// refreshes the session copy.
#[derive(Clone)]
pub struct AuthService {
    client: HttpClient,
}

impl AuthService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let auth: AuthToken = self.client.post(LOGIN_PATH, &request).await?;
        let user = auth.user.clone();
        self.client.session().sign_in(auth)?;

        info!("Signed in as {} ({})", user.email, user.role.label());
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.session().sign_out()
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let user: User = self.client.get("/auth/me").await?;
        self.client.session().update_user(user.clone())?;

        Ok(user)
    }

    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), ApiError> {
        self.client.post("/auth/forgot-password", request).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.client.post("/auth/reset-password", request).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ApiError> {
        self.client.post("/auth/change-password", request).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.client.put("/profile", update).await?;
        self.client.session().update_user(user.clone())?;

        Ok(user)
    }

    pub async fn upload_picture(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<User, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|_| ApiError::validation(format!("Tipe file tidak didukung: {mime}")))?;
        let form = Form::new().part("picture", part);

        let user: User = self.client.post_multipart("/profile/picture", form).await?;
        self.client.session().update_user(user.clone())?;

        Ok(user)
    }
}
