use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::format_rupiah;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub invoice_number: String,
    pub amount: u64,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_channel: String,

    /// Absent for an organizer upgrade.
    #[serde(default)]
    pub event_id: Option<u64>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expired_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn amount_label(&self) -> String {
        format_rupiah(self.amount)
    }

    pub fn is_upgrade(&self) -> bool {
        self.event_id.is_none()
    }
}

/// Body of `POST /payments`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatePayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u64>,
    pub payment_method: PaymentMethod,
    pub payment_channel: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Orange,
    Green,
    Red,
    Gray,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Orange => "orange",
            StatusColor::Green => "green",
            StatusColor::Red => "red",
            StatusColor::Gray => "gray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPresentation {
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: StatusColor,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        }
    }

    /// Status page headline, description, icon and color.
    pub fn presentation(&self) -> StatusPresentation {
        match self {
            PaymentStatus::Pending => StatusPresentation {
                label: "Menunggu Pembayaran",
                description: "Silakan selesaikan pembayaran sebelum batas waktu berakhir.",
                icon: "clock",
                color: StatusColor::Orange,
            },
            PaymentStatus::Success => StatusPresentation {
                label: "Pembayaran Berhasil!",
                description: "Terima kasih, pembayaran Anda telah dikonfirmasi.",
                icon: "check-circle",
                color: StatusColor::Green,
            },
            PaymentStatus::Failed => StatusPresentation {
                label: "Pembayaran Gagal",
                description: "Pembayaran tidak dapat diproses. Silakan coba lagi.",
                icon: "x-circle",
                color: StatusColor::Red,
            },
            PaymentStatus::Expired => StatusPresentation {
                label: "Pembayaran Kedaluwarsa",
                description: "Batas waktu pembayaran telah habis.",
                icon: "alert-circle",
                color: StatusColor::Gray,
            },
        }
    }

    /// Short label for table badges.
    pub fn badge(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Menunggu",
            PaymentStatus::Success => "Berhasil",
            PaymentStatus::Failed => "Gagal",
            PaymentStatus::Expired => "Kedaluwarsa",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    #[serde(rename = "bank_transfer")]
    BankTransfer,
    #[serde(rename = "ewallet")]
    EWallet,
    #[serde(rename = "qris")]
    Qris,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::BankTransfer,
        PaymentMethod::EWallet,
        PaymentMethod::Qris,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "ewallet",
            PaymentMethod::Qris => "qris",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Transfer Bank",
            PaymentMethod::EWallet => "E-Wallet",
            PaymentMethod::Qris => "QRIS",
        }
    }

    pub fn channels(&self) -> &'static [&'static str] {
        match self {
            PaymentMethod::BankTransfer => &["bca", "bni", "bri", "mandiri"],
            PaymentMethod::EWallet => &["ovo", "dana", "gopay", "shopeepay"],
            PaymentMethod::Qris => &["qris"],
        }
    }

    pub fn accepts(&self, channel: &str) -> bool {
        self.channels().contains(&channel)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown payment method: {s}"))
    }
}
