use models::{CreatePayment, Payment};
use tracing::{info, warn};

use crate::{client::HttpClient, error::ApiError};

#[derive(Clone)]
pub struct PaymentService {
    client: HttpClient,
}

impl PaymentService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreatePayment) -> Result<Payment, ApiError> {
        if !request.payment_method.accepts(&request.payment_channel) {
            return Err(ApiError::validation("Silakan pilih metode pembayaran"));
        }

        let payment: Payment = self.client.post("/payments", request).await?;
        info!(
            "Created payment {} ({} via {})",
            payment.invoice_number, payment.payment_method, payment.payment_channel
        );

        Ok(payment)
    }

    pub async fn status(&self, invoice: &str) -> Result<Payment, ApiError> {
        let invoice = invoice_segment(invoice)?;

        self.client.get(&format!("/payments/{invoice}")).await
    }

    /// Confirms a payment without a real provider. Refused unless developer mode is on.
    pub async fn simulate_success(&self, invoice: &str) -> Result<Payment, ApiError> {
        if !self.client.config().dev_mode {
            warn!("Refusing to simulate payment {invoice} outside developer mode");
            return Err(ApiError::validation(
                "Simulasi pembayaran hanya tersedia pada mode pengembangan",
            ));
        }

        let invoice = invoice_segment(invoice)?;

        self.client
            .post_empty(&format!("/payments/{invoice}/simulate-success"))
            .await
    }

    pub async fn admin_list(&self) -> Result<Vec<Payment>, ApiError> {
        self.client.get("/admin/payments").await
    }
}

fn invoice_segment(invoice: &str) -> Result<&str, ApiError> {
    let invoice = invoice.trim();

    if invoice.is_empty() || !invoice.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ApiError::validation("Nomor invoice tidak valid"));
    }

    Ok(invoice)
}
