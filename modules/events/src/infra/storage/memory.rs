//! Process-local repositories. All state is lost on restart.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::contract::model::{Event, Registration, User};
use crate::domain::repo::{EventsRepository, RegistrationsRepository, UsersRepository};

/// Monotonic id source; the first id handed out is 1.
#[derive(Debug, Default)]
struct Sequence(AtomicU64);

impl Sequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn sorted_by_id<T>(mut items: Vec<T>, id: impl Fn(&T) -> u64) -> Vec<T> {
    items.sort_by_key(|t| id(t));
    items
}

#[derive(Debug, Default)]
pub struct InMemoryEventsRepo {
    rows: DashMap<u64, Event>,
    seq: Sequence,
}

impl InMemoryEventsRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventsRepository for InMemoryEventsRepo {
    fn next_id(&self) -> u64 {
        self.seq.next()
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Event>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> anyhow::Result<Vec<Event>> {
        let all = self.rows.iter().map(|r| r.value().clone()).collect();
        Ok(sorted_by_id(all, |e: &Event| e.id))
    }

    async fn insert(&self, e: Event) -> anyhow::Result<()> {
        if self.rows.contains_key(&e.id) {
            bail!("event {} already exists", e.id);
        }
        self.rows.insert(e.id, e);
        Ok(())
    }

    async fn update(&self, e: Event) -> anyhow::Result<()> {
        match self.rows.get_mut(&e.id) {
            Some(mut row) => {
                *row = e;
                Ok(())
            }
            None => bail!("event {} does not exist", e.id),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRegistrationsRepo {
    rows: DashMap<u64, Registration>,
    seq: Sequence,
}

impl InMemoryRegistrationsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, pred: impl Fn(&Registration) -> bool) -> Vec<Registration> {
        let hits = self
            .rows
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| r.value().clone())
            .collect();
        sorted_by_id(hits, |r: &Registration| r.id)
    }
}

#[async_trait]
impl RegistrationsRepository for InMemoryRegistrationsRepo {
    fn next_id(&self) -> u64 {
        self.seq.next()
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Registration>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn list_by_event(&self, event_id: u64) -> anyhow::Result<Vec<Registration>> {
        Ok(self.select(|r| r.event_id == event_id))
    }

    async fn list_by_email(&self, email: &str) -> anyhow::Result<Vec<Registration>> {
        let email = email.to_lowercase();
        Ok(self.select(|r| r.attendee.email.to_lowercase() == email))
    }

    async fn count_confirmed(&self, event_id: u64) -> anyhow::Result<usize> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.event_id == event_id && r.is_confirmed())
            .count())
    }

    async fn find_confirmed(
        &self,
        event_id: u64,
        email: &str,
    ) -> anyhow::Result<Option<Registration>> {
        let email = email.to_lowercase();
        Ok(self
            .select(|r| {
                r.event_id == event_id
                    && r.is_confirmed()
                    && r.attendee.email.to_lowercase() == email
            })
            .into_iter()
            .next())
    }

    async fn insert(&self, r: Registration) -> anyhow::Result<()> {
        if self.rows.contains_key(&r.id) {
            bail!("registration {} already exists", r.id);
        }
        self.rows.insert(r.id, r);
        Ok(())
    }

    async fn update(&self, r: Registration) -> anyhow::Result<()> {
        match self.rows.get_mut(&r.id) {
            Some(mut row) => {
                *row = r;
                Ok(())
            }
            None => bail!("registration {} does not exist", r.id),
        }
    }

    async fn delete(&self, id: u64) -> anyhow::Result<Option<Registration>> {
        Ok(self.rows.remove(&id).map(|(_, r)| r))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsersRepo {
    rows: DashMap<u64, User>,
    seq: Sequence,
}

impl InMemoryUsersRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        let hits = self
            .rows
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| r.value().clone())
            .collect();
        sorted_by_id(hits, |u: &User| u.id).into_iter().next()
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepo {
    fn next_id(&self) -> u64 {
        self.seq.next()
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let username = username.to_lowercase();
        Ok(self.find_where(|u| u.username.to_lowercase() == username))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.find_where(|u| u.email.to_lowercase() == email))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let all = self.rows.iter().map(|r| r.value().clone()).collect();
        Ok(sorted_by_id(all, |u: &User| u.id))
    }

    async fn insert(&self, u: User) -> anyhow::Result<()> {
        if self.rows.contains_key(&u.id) {
            bail!("user {} already exists", u.id);
        }
        self.rows.insert(u.id, u);
        Ok(())
    }

    async fn update(&self, u: User) -> anyhow::Result<()> {
        match self.rows.get_mut(&u.id) {
            Some(mut row) => {
                *row = u;
                Ok(())
            }
            None => bail!("user {} does not exist", u.id),
        }
    }

    async fn delete(&self, id: u64) -> anyhow::Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{Attendee, RegistrationStatus};
    use chrono::Utc;

    fn registration(id: u64, event_id: u64, email: &str) -> Registration {
        Registration {
            id,
            event_id,
            event_name: "Oratoria".into(),
            attendee: Attendee {
                name: "Ana".into(),
                email: email.into(),
                phone: "987654321".into(),
            },
            status: RegistrationStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn sequence_starts_at_one_and_never_repeats() {
        let repo = InMemoryRegistrationsRepo::new();
        assert_eq!(repo.next_id(), 1);
        assert_eq!(repo.next_id(), 2);
        assert_eq!(repo.next_id(), 3);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let repo = InMemoryRegistrationsRepo::new();
        let id = repo.next_id();
        repo.insert(registration(id, 1, "a@x.com")).await.unwrap();
        assert!(repo.delete(id).await.unwrap().is_some());
        assert_eq!(repo.next_id(), id + 1);
        assert!(repo.delete(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn confirmed_lookup_ignores_case_and_status() {
        let repo = InMemoryRegistrationsRepo::new();
        repo.insert(registration(1, 5, "a@x.com")).await.unwrap();
        let mut cancelled = registration(2, 5, "b@x.com");
        cancelled.status = RegistrationStatus::Cancelled;
        repo.insert(cancelled).await.unwrap();

        assert!(repo.find_confirmed(5, "A@X.COM").await.unwrap().is_some());
        assert!(repo.find_confirmed(5, "b@x.com").await.unwrap().is_none());
        assert!(repo.find_confirmed(6, "a@x.com").await.unwrap().is_none());
        assert_eq!(repo.count_confirmed(5).await.unwrap(), 1);
        assert_eq!(repo.list_by_event(5).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_of_missing_row_fails() {
        let repo = InMemoryRegistrationsRepo::new();
        assert!(repo.update(registration(9, 1, "a@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let repo = InMemoryRegistrationsRepo::new();
        repo.insert(registration(1, 1, "a@x.com")).await.unwrap();
        assert!(repo.insert(registration(1, 1, "b@x.com")).await.is_err());
    }
}
