use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: u64,
    pub event_id: u64,
    pub event_title: String,
    pub participant_name: String,
    pub is_ready: bool,

    #[serde(default)]
    pub download_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateAction {
    pub label: &'static str,
    pub enabled: bool,
}

impl Certificate {
    /// Download button state; a certificate that is not ready yet cannot be fetched.
    pub fn action(&self) -> CertificateAction {
        if self.is_ready {
            CertificateAction {
                label: "Download Sertifikat",
                enabled: true,
            }
        } else {
            CertificateAction {
                label: "Belum Tersedia",
                enabled: false,
            }
        }
    }

    pub fn file_name(&self) -> String {
        format!("sertifikat-{}-{}.pdf", self.event_id, self.id)
    }
}
