use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{
    Attendee, Registration, RegistrationStatus, RegistrationWithEvent,
};
use crate::domain::catalog::EventCatalog;
use crate::domain::error::DomainError;
use crate::domain::locks::EventLocks;
use crate::domain::repo::RegistrationsRepository;
use crate::domain::validation::{self, normalize_email};

/// Owns registrations and keeps occupancy within capacity.
///
/// Every write holds the lock of each event whose occupancy it reads or
/// changes, from the first check until the repository write completes.
#[derive(Clone)]
pub struct RegistrationLedger {
    catalog: EventCatalog,
    registrations: Arc<dyn RegistrationsRepository>,
    locks: Arc<EventLocks>,
}

impl RegistrationLedger {
    pub fn new(
        catalog: EventCatalog,
        registrations: Arc<dyn RegistrationsRepository>,
        locks: Arc<EventLocks>,
    ) -> Self {
        Self {
            catalog,
            registrations,
            locks,
        }
    }

    async fn find(&self, id: u64) -> Result<Option<Registration>, DomainError> {
        self.registrations
            .find_by_id(id)
            .await
            .map_err(DomainError::storage)
    }

    async fn find_confirmed(
        &self,
        event_id: u64,
        email: &str,
    ) -> Result<Option<Registration>, DomainError> {
        self.registrations
            .find_confirmed(event_id, email)
            .await
            .map_err(DomainError::storage)
    }

    pub async fn compute_occupancy(&self, event_id: u64) -> Result<usize, DomainError> {
        self.catalog.occupancy(event_id).await
    }

    #[instrument(
        name = "events.ledger.enroll",
        skip(self, attendee),
        fields(email = tracing::field::Empty)
    )]
    pub async fn enroll(
        &self,
        event_id: u64,
        attendee: Attendee,
    ) -> Result<Registration, DomainError> {
        let attendee = validation::validate_attendee(&attendee)?;
        tracing::Span::current().record("email", tracing::field::display(&attendee.email));
        // Resolve first so unknown ids never get a lock entry.
        self.catalog.find_active(event_id).await?;

        let _guard = self.locks.lock(event_id).await;
        let event = self.catalog.find_active(event_id).await?;

        let occupancy = self.catalog.occupancy(event_id).await?;
        if occupancy >= event.capacity as usize {
            info!(occupancy, capacity = event.capacity, "Event is full");
            return Err(DomainError::capacity_exceeded(event_id, event.capacity));
        }
        if self.find_confirmed(event_id, &attendee.email).await?.is_some() {
            return Err(DomainError::duplicate_registration(event_id, attendee.email));
        }

        let registration = Registration {
            id: self.registrations.next_id(),
            event_id,
            event_name: event.name,
            attendee,
            status: RegistrationStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.registrations
            .insert(registration.clone())
            .await
            .map_err(DomainError::storage)?;

        info!(registration_id = registration.id, "Registration confirmed");
        Ok(registration)
    }

    /// Registrations for `email` joined with their current event, newest first.
    #[instrument(name = "events.ledger.list_by_attendee", skip(self))]
    pub async fn list_by_attendee(
        &self,
        email: &str,
    ) -> Result<Vec<RegistrationWithEvent>, DomainError> {
        if email.trim().is_empty() {
            return Err(DomainError::invalid_field("email", "Email requerido"));
        }
        let email = normalize_email(email);

        let mut found = self
            .registrations
            .list_by_email(&email)
            .await
            .map_err(DomainError::storage)?;
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut out = Vec::with_capacity(found.len());
        for registration in found {
            let event = self.catalog.find_by_id(registration.event_id).await?;
            out.push(RegistrationWithEvent {
                registration,
                event,
            });
        }
        debug!("Found {} registrations", out.len());
        Ok(out)
    }

    /// Overwrites attendee data and optionally moves the registration to
    /// another event. Moving re-checks the target's capacity.
    #[instrument(
        name = "events.ledger.update",
        skip(self, attendee),
        fields(registration_id = id, event_id = new_event_id)
    )]
    pub async fn update(
        &self,
        id: u64,
        attendee: Attendee,
        new_event_id: u64,
    ) -> Result<Registration, DomainError> {
        let attendee = validation::validate_registration_update(&attendee, new_event_id)?;

        loop {
            let seen = self
                .find(id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(id))?;
            self.catalog.find_active(new_event_id).await?;

            let _guard = self.locks.lock_pair(seen.event_id, new_event_id).await;

            let current = self
                .find(id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(id))?;
            if current.event_id != seen.event_id {
                // Moved by a concurrent update while we waited; lock again.
                warn!("Registration moved concurrently, retrying");
                continue;
            }
            let target = self.catalog.find_active(new_event_id).await?;

            let moving = current.event_id != new_event_id;
            if moving && current.is_confirmed() {
                let occupancy = self.catalog.occupancy(new_event_id).await?;
                if occupancy >= target.capacity as usize {
                    return Err(DomainError::capacity_exceeded(new_event_id, target.capacity));
                }
            }
            if moving || current.attendee.email != attendee.email {
                let clash = self
                    .find_confirmed(new_event_id, &attendee.email)
                    .await?
                    .filter(|r| r.id != id);
                if clash.is_some() {
                    return Err(DomainError::duplicate_registration(
                        new_event_id,
                        attendee.email,
                    ));
                }
            }

            let updated = Registration {
                event_id: new_event_id,
                event_name: target.name,
                attendee,
                updated_at: Some(Utc::now()),
                ..current
            };
            self.registrations
                .update(updated.clone())
                .await
                .map_err(DomainError::storage)?;

            info!("Registration updated");
            return Ok(updated);
        }
    }

    /// Removes the registration and returns it; occupancy drops immediately.
    #[instrument(name = "events.ledger.delete", skip(self), fields(registration_id = id))]
    pub async fn delete(&self, id: u64) -> Result<Registration, DomainError> {
        loop {
            let seen = self
                .find(id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(id))?;

            let _guard = self.locks.lock(seen.event_id).await;
            match self.find(id).await? {
                None => return Err(DomainError::registration_not_found(id)),
                Some(r) if r.event_id != seen.event_id => continue,
                Some(_) => {}
            }

            let removed = self
                .registrations
                .delete(id)
                .await
                .map_err(DomainError::storage)?
                .ok_or_else(|| DomainError::registration_not_found(id))?;
            info!(event_id = removed.event_id, "Registration deleted");
            return Ok(removed);
        }
    }
}
