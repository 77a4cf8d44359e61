use async_trait::async_trait;

use crate::contract::model::{
    Attendee, EventFilter, EventView, Registration, RegistrationWithEvent,
};

/// In-process API of the events module for other modules.
///
/// Errors are [`EventsError`](crate::contract::error::EventsError) values
/// wrapped in `anyhow`.
#[async_trait]
pub trait EventsApi: Send + Sync {
    async fn list_events(&self, filter: EventFilter) -> anyhow::Result<Vec<EventView>>;

    async fn get_event(&self, id: u64) -> anyhow::Result<EventView>;

    async fn enroll(&self, event_id: u64, attendee: Attendee) -> anyhow::Result<Registration>;

    async fn registrations_for(&self, email: &str) -> anyhow::Result<Vec<RegistrationWithEvent>>;

    async fn delete_registration(&self, id: u64) -> anyhow::Result<Registration>;
}
