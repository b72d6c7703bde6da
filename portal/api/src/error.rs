use thiserror::Error;

/// Shown when the server rejects a request without saying why.
pub const FALLBACK_MESSAGE: &str = "Terjadi kesalahan. Silakan coba lagi.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Tidak dapat terhubung ke server. Periksa koneksi Anda.")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    /// Business error reported by the backend, message shown verbatim.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Sesi Anda telah berakhir. Silakan masuk kembali.")]
    Unauthorized,

    #[error("Respons server tidak valid: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Gagal menyimpan sesi: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    pub fn server(status: u16, message: Option<String>) -> Self {
        ApiError::Server {
            status,
            message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Whether the session token should be discarded.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::Server { status: 401, .. }
        )
    }
}
