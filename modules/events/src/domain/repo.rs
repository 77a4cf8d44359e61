use async_trait::async_trait;

use crate::contract::model::{Event, Registration, User};

/// Persistence for events. Ids come from a per-repository monotonic sequence.
#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Reserve the next id; ids are never reused.
    fn next_id(&self) -> u64;
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Event>>;
    async fn list(&self) -> anyhow::Result<Vec<Event>>;
    async fn insert(&self, e: Event) -> anyhow::Result<()>;
    /// Replace an existing event (by `e.id`).
    async fn update(&self, e: Event) -> anyhow::Result<()>;
}

#[async_trait]
pub trait RegistrationsRepository: Send + Sync {
    fn next_id(&self) -> u64;
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Registration>>;
    async fn list_by_event(&self, event_id: u64) -> anyhow::Result<Vec<Registration>>;
    /// Case-insensitive on `email`.
    async fn list_by_email(&self, email: &str) -> anyhow::Result<Vec<Registration>>;
    async fn count_confirmed(&self, event_id: u64) -> anyhow::Result<usize>;
    /// Confirmed registration for `(event_id, email)`, case-insensitive on email.
    async fn find_confirmed(
        &self,
        event_id: u64,
        email: &str,
    ) -> anyhow::Result<Option<Registration>>;
    async fn insert(&self, r: Registration) -> anyhow::Result<()>;
    async fn update(&self, r: Registration) -> anyhow::Result<()>;
    /// Returns the removed record, if any.
    async fn delete(&self, id: u64) -> anyhow::Result<Option<Registration>>;
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    fn next_id(&self) -> u64;
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>>;
    /// Case-insensitive.
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Case-insensitive.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// All users ordered by id.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn insert(&self, u: User) -> anyhow::Result<()>;
    async fn update(&self, u: User) -> anyhow::Result<()>;
    /// Returns true if a user was deleted.
    async fn delete(&self, id: u64) -> anyhow::Result<bool>;
}
