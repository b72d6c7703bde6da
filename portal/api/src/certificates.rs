use models::Certificate;
use tracing::info;

use crate::{client::HttpClient, error::ApiError};

#[derive(Clone)]
pub struct CertificateService {
    client: HttpClient,
}

impl CertificateService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Certificate>, ApiError> {
        self.client.get("/certificates").await
    }

    /// PDF bytes. A certificate that is not ready is rejected before any request.
    pub async fn download(&self, certificate: &Certificate) -> Result<Vec<u8>, ApiError> {
        if !certificate.action().enabled {
            return Err(ApiError::validation("Sertifikat belum tersedia"));
        }

        let bytes = self
            .client
            .download(&format!("/certificates/{}/download", certificate.id))
            .await?;
        info!("Downloaded certificate {} for event {}", certificate.id, certificate.event_id);

        Ok(bytes)
    }
}
