use models::EventData;

use crate::{client::HttpClient, error::ApiError};

#[derive(Clone)]
pub struct EventService {
    client: HttpClient,
}

impl EventService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<EventData>, ApiError> {
        self.client.get("/events").await
    }

    pub async fn get(&self, id: u64) -> Result<EventData, ApiError> {
        self.client.get(&format!("/events/{id}")).await
    }
}
