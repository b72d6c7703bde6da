use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::currency::format_rupiah;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    pub id: u64,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    pub capacity: u32,

    #[serde(default)]
    pub registered_count: u32,

    #[serde(default)]
    pub price: u64,

    pub status: EventStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draf",
            EventStatus::Published => "Dibuka",
            EventStatus::Ongoing => "Berlangsung",
            EventStatus::Completed => "Selesai",
            EventStatus::Cancelled => "Dibatalkan",
        }
    }
}

impl EventData {
    pub fn remaining_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.registered_count)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_seats() == 0
    }

    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    pub fn price_label(&self) -> String {
        if self.is_free() {
            "Gratis".to_string()
        } else {
            format_rupiah(self.price)
        }
    }

    /// Date and time range, e.g. `2026-11-02 09:00-12:00`.
    pub fn schedule_label(&self) -> String {
        format!(
            "{} {}-{}",
            self.date.format("%Y-%m-%d"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}
