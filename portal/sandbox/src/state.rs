use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{NaiveDate, NaiveTime, Utc};
use models::{Certificate, EventData, EventStatus, Payment, PaymentStatus, Role, User};
use tracing::info;

use super::config::Config;

pub struct Account {
    pub user: User,
    pub password: String,
}

pub struct StoredPayment {
    pub owner: u64,
    pub payment: Payment,
}

pub struct StoredCertificate {
    pub owner: u64,
    pub certificate: Certificate,
}

/// Everything the sandbox knows. Guarded by one mutex, never held across an await.
#[derive(Default)]
pub struct Db {
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, u64>,
    pub reset_tokens: HashMap<String, String>,
    pub events: Vec<EventData>,
    pub payments: Vec<StoredPayment>,
    pub certificates: Vec<StoredCertificate>,
    pub pictures: HashMap<String, (String, Vec<u8>)>,
    pub sequence: u64,
}

impl Db {
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn account_by_email(&mut self, email: &str) -> Option<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|account| account.user.email.eq_ignore_ascii_case(email.trim()))
    }

    pub fn account(&mut self, id: u64) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.user.id == id)
    }

    pub fn event(&mut self, id: u64) -> Option<&mut EventData> {
        self.events.iter_mut().find(|event| event.id == id)
    }

    pub fn payment(&mut self, invoice: &str) -> Option<&mut StoredPayment> {
        self.payments
            .iter_mut()
            .find(|stored| stored.payment.invoice_number == invoice)
    }

    /// Holding a certificate for the event, or a settled payment for it.
    pub fn is_registered(&self, owner: u64, event_id: u64) -> bool {
        let certified = self.certificates.iter().any(|stored| {
            stored.owner == owner && stored.certificate.event_id == event_id
        });
        let paid = self.payments.iter().any(|stored| {
            stored.owner == owner
                && stored.payment.event_id == Some(event_id)
                && stored.payment.status == PaymentStatus::Success
        });

        certified || paid
    }

    /// Pending payments past their deadline become `expired` when next looked at.
    pub fn expire_payments(&mut self) {
        let now = Utc::now();

        for stored in self.payments.iter_mut() {
            let payment = &mut stored.payment;

            if payment.status == PaymentStatus::Pending
                && payment.expired_at.is_some_and(|deadline| deadline <= now)
            {
                info!("Payment {} expired", payment.invoice_number);
                payment.status = PaymentStatus::Expired;
            }
        }
    }
}

pub struct State {
    pub config: Config,
    db: Mutex<Db>,
}

impl State {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            db: Mutex::new(seed()),
        })
    }

    pub fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn user(id: u64, name: &str, email: &str, phone: Option<&str>, role: Role) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
        role,
        profile_picture: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn event(
    id: u64,
    title: &str,
    date: (i32, u32, u32),
    hours: (u32, u32),
    location: &str,
    capacity: u32,
    registered_count: u32,
    price: u64,
    status: EventStatus,
) -> EventData {
    EventData {
        id,
        title: title.to_string(),
        description: None,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap_or_default(),
        start_time: NaiveTime::from_hms_opt(hours.0, 0, 0).unwrap_or_default(),
        end_time: NaiveTime::from_hms_opt(hours.1, 0, 0).unwrap_or_default(),
        location: location.to_string(),
        capacity,
        registered_count,
        price,
        status,
    }
}

fn seed() -> Db {
    let accounts = vec![
        Account {
            user: user(1, "Admin Acara", "admin@acara.test", None, Role::Admin),
            password: "Admin123!".to_string(),
        },
        Account {
            user: user(
                2,
                "Budi Santoso",
                "budi@acara.test",
                Some("081234567890"),
                Role::User,
            ),
            password: "Peserta123!".to_string(),
        },
        Account {
            user: user(3, "Sari Wulandari", "sari@acara.test", None, Role::EventOrganizer),
            password: "Panitia123!".to_string(),
        },
    ];

    let events = vec![
        event(
            1,
            "Workshop Rust untuk Pemula",
            (2026, 11, 14),
            (9, 12),
            "Aula Gedung A",
            40,
            12,
            75_000,
            EventStatus::Published,
        ),
        event(
            2,
            "Seminar Keamanan Siber",
            (2026, 11, 21),
            (13, 16),
            "Online (Zoom)",
            200,
            200,
            50_000,
            EventStatus::Published,
        ),
        event(
            3,
            "Meetup Komunitas Open Source",
            (2026, 11, 28),
            (15, 17),
            "Co-working Space Kota",
            50,
            5,
            0,
            EventStatus::Published,
        ),
        event(
            4,
            "Hackathon Akhir Tahun",
            (2026, 12, 12),
            (8, 20),
            "Gedung Serbaguna",
            100,
            0,
            25_000,
            EventStatus::Draft,
        ),
        event(
            5,
            "Pelatihan Dasar Git",
            (2026, 9, 5),
            (9, 15),
            "Lab Komputer 2",
            30,
            30,
            35_000,
            EventStatus::Completed,
        ),
    ];

    let certificates = vec![
        StoredCertificate {
            owner: 2,
            certificate: Certificate {
                id: 1,
                event_id: 5,
                event_title: "Pelatihan Dasar Git".to_string(),
                participant_name: "Budi Santoso".to_string(),
                is_ready: true,
                download_count: 0,
            },
        },
        StoredCertificate {
            owner: 2,
            certificate: Certificate {
                id: 2,
                event_id: 3,
                event_title: "Meetup Komunitas Open Source".to_string(),
                participant_name: "Budi Santoso".to_string(),
                is_ready: false,
                download_count: 0,
            },
        },
    ];

    Db {
        accounts,
        events,
        certificates,
        ..Db::default()
    }
}
