use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// `{ status, data, message }` wrapper around every JSON body the backend sends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: EnvelopeStatus,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum EnvelopeError {
    /// `status` was `error`; carries the server message when one was sent.
    Rejected(Option<String>),

    /// `status` was `success` but `data` did not match the expected shape.
    Data(serde_json::Error),
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data,
            message: None,
        }
    }

    pub fn success_with_message(data: Value, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    /// Checks `status` before trusting `data`. A missing `data` decodes as JSON
    /// `null`, so unit and `Option` payloads need nothing from the server.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, EnvelopeError> {
        match self.status {
            EnvelopeStatus::Error => Err(EnvelopeError::Rejected(
                self.message.filter(|message| !message.trim().is_empty()),
            )),
            EnvelopeStatus::Success => serde_json::from_value(self.data).map_err(EnvelopeError::Data),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::payment::{Payment, PaymentStatus};

    #[test]
    fn test_success_payload() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "success",
            "data": {
                "invoice_number": "INV-001",
                "amount": 150000,
                "status": "pending",
                "payment_method": "bank_transfer",
                "payment_channel": "bca",
                "created_at": "2026-10-01T08:00:00Z"
            }
        }))
        .unwrap();

        let payment: Payment = envelope.into_result().unwrap();
        assert_eq!(payment.invoice_number, "INV-001");
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_error_keeps_server_message() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": "error", "message": "Kuota penuh"})).unwrap();

        match envelope.into_result::<Payment>() {
            Err(EnvelopeError::Rejected(Some(message))) => assert_eq!(message, "Kuota penuh"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_blank_message_is_absent() {
        let envelope = Envelope::error("  ");

        assert!(matches!(
            envelope.into_result::<()>(),
            Err(EnvelopeError::Rejected(None))
        ));
    }

    #[test]
    fn test_missing_data_for_unit() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": "success", "message": "Email terkirim"})).unwrap();

        assert!(envelope.into_result::<()>().is_ok());
    }

    #[test]
    fn test_wrong_shape_is_data_error() {
        let envelope = Envelope::success(json!({"unexpected": true}));

        assert!(matches!(
            envelope.into_result::<Payment>(),
            Err(EnvelopeError::Data(_))
        ));
    }
}
