use std::path::Path;

use flows::{PasswordChecklist, PollSnapshot};
use models::{Certificate, EventData, Payment, User};

pub fn user_line(user: &User) -> String {
    let phone = user.phone.as_deref().unwrap_or("-");

    format!("{} <{}> | {} | {phone}", user.name, user.email, user.role.label())
}

pub fn event_line(event: &EventData) -> String {
    let seats = if event.is_full() {
        "Penuh".to_string()
    } else {
        format!("{} kursi tersisa", event.remaining_seats())
    };

    format!(
        "#{} {} | {} | {} | {} | {seats}",
        event.id,
        event.title,
        event.schedule_label(),
        event.location,
        event.price_label()
    )
}

pub fn payment_line(payment: &Payment) -> String {
    let purpose = match payment.event_id {
        Some(id) => format!("event #{id}"),
        None => "upgrade penyelenggara".to_string(),
    };

    format!(
        "{} | {} | {} | {}/{} | {purpose}",
        payment.invoice_number,
        payment.amount_label(),
        payment.status.badge(),
        payment.payment_method.label(),
        payment.payment_channel
    )
}

pub fn certificate_line(certificate: &Certificate) -> String {
    let action = certificate.action();
    let marker = if action.enabled { "*" } else { "-" };

    format!(
        "{marker} #{} {} [{}]",
        certificate.id, certificate.event_title, action.label
    )
}

/// Spinner message while a payment is watched.
pub fn snapshot_line(snapshot: &PollSnapshot) -> String {
    let mut line = match (&snapshot.payment, snapshot.presentation()) {
        (Some(payment), Some(presentation)) => format!(
            "{} {} | {}",
            payment.invoice_number, presentation.label, presentation.description
        ),
        _ if snapshot.loading => "Memuat status pembayaran...".to_string(),
        _ => "Status pembayaran belum diketahui".to_string(),
    };

    if let Some(error) = &snapshot.error {
        line.push_str(&format!(" ({error})"));
    }
    line
}

pub fn checklist_lines(checklist: &PasswordChecklist) -> Vec<String> {
    checklist
        .items()
        .iter()
        .map(|(label, ok)| format!("[{}] {label}", if *ok { "x" } else { " " }))
        .collect()
}

pub fn picture_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use models::{EventStatus, PaymentMethod, PaymentStatus};

    use super::*;

    fn payment(status: PaymentStatus) -> Payment {
        Payment {
            invoice_number: "INV-001".to_string(),
            amount: 150_000,
            status,
            payment_method: PaymentMethod::BankTransfer,
            payment_channel: "bca".to_string(),
            event_id: Some(1),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap(),
            paid_at: None,
            expired_at: None,
        }
    }

    #[test]
    fn test_payment_line() {
        let line = payment_line(&payment(PaymentStatus::Pending));

        assert!(line.starts_with("INV-001 | Rp 150.000 | Menunggu"));
        assert!(line.ends_with("/bca | event #1"));
    }

    #[test]
    fn test_certificate_line() {
        let mut certificate = Certificate {
            id: 3,
            event_id: 1,
            event_title: "Workshop Rust".to_string(),
            participant_name: "Budi".to_string(),
            is_ready: false,
            download_count: 0,
        };
        assert_eq!(certificate_line(&certificate), "- #3 Workshop Rust [Belum Tersedia]");

        certificate.is_ready = true;
        assert_eq!(
            certificate_line(&certificate),
            "* #3 Workshop Rust [Download Sertifikat]"
        );
    }

    #[test]
    fn test_event_line_full() {
        let event = EventData {
            id: 2,
            title: "Seminar".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 11, 21).unwrap(),
            start_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            location: "Online".to_string(),
            capacity: 10,
            registered_count: 10,
            price: 0,
            status: EventStatus::Published,
        };

        let line = event_line(&event);
        assert!(line.starts_with("#2 Seminar |"));
        assert!(line.contains("Gratis"));
        assert!(line.ends_with("Penuh"));
    }

    #[test]
    fn test_snapshot_line() {
        let mut snapshot = PollSnapshot {
            loading: true,
            ..PollSnapshot::default()
        };
        assert_eq!(snapshot_line(&snapshot), "Memuat status pembayaran...");

        snapshot.loading = false;
        snapshot.payment = Some(payment(PaymentStatus::Pending));
        snapshot.error = Some("Gateway sibuk".to_string());
        let line = snapshot_line(&snapshot);

        assert!(line.starts_with("INV-001 Menunggu Pembayaran"));
        assert!(line.ends_with("(Gateway sibuk)"));
    }

    #[test]
    fn test_checklist_lines() {
        let lines = checklist_lines(&PasswordChecklist::evaluate("Abcdef1"));

        assert_eq!(lines[0], "[ ] Minimal 8 karakter");
        assert_eq!(lines[1], "[x] Huruf besar (A-Z)");
        assert_eq!(lines[4], "[ ] Karakter spesial (!@#$...)");
    }

    #[test]
    fn test_picture_mime() {
        assert_eq!(picture_mime(Path::new("me.JPG")), Some("image/jpeg"));
        assert_eq!(picture_mime(Path::new("me.webp")), Some("image/webp"));
        assert_eq!(picture_mime(Path::new("notes.txt")), None);
        assert_eq!(picture_mime(Path::new("README")), None);
    }
}
