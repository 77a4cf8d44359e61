use async_trait::async_trait;

use crate::contract::{
    client::EventsApi,
    error::{EventsError, Resource},
    model::{Attendee, EventFilter, EventView, Registration, RegistrationWithEvent},
};
use crate::domain::{catalog::EventCatalog, error::DomainError, ledger::RegistrationLedger};

/// In-process [`EventsApi`] backed directly by the domain services.
pub struct EventsLocalClient {
    catalog: EventCatalog,
    ledger: RegistrationLedger,
}

impl EventsLocalClient {
    pub fn new(catalog: EventCatalog, ledger: RegistrationLedger) -> Self {
        Self { catalog, ledger }
    }
}

#[async_trait]
impl EventsApi for EventsLocalClient {
    async fn list_events(&self, filter: EventFilter) -> anyhow::Result<Vec<EventView>> {
        self.catalog
            .list(&filter)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn get_event(&self, id: u64) -> anyhow::Result<EventView> {
        self.catalog
            .get_view(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn enroll(&self, event_id: u64, attendee: Attendee) -> anyhow::Result<Registration> {
        self.ledger
            .enroll(event_id, attendee)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn registrations_for(&self, email: &str) -> anyhow::Result<Vec<RegistrationWithEvent>> {
        self.ledger
            .list_by_attendee(email)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn delete_registration(&self, id: u64) -> anyhow::Result<Registration> {
        self.ledger
            .delete(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::EventNotFound { id } | DomainError::EventUnavailable { id } => {
            EventsError::NotFound(Resource::Event, id)
        }
        DomainError::RegistrationNotFound { id } => EventsError::NotFound(Resource::Registration, id),
        DomainError::UserNotFound { id } => EventsError::NotFound(Resource::User, id),
        e @ (DomainError::CapacityExceeded { .. }
        | DomainError::DuplicateRegistration { .. }
        | DomainError::CapacityBelowOccupancy { .. }
        | DomainError::UsernameTaken { .. }
        | DomainError::EmailTaken { .. }) => EventsError::Conflict(e.to_string()),
        e @ DomainError::Validation { .. } => EventsError::Invalid(e.to_string()),
        e @ (DomainError::InvalidCredentials
        | DomainError::AccountDisabled { .. }
        | DomainError::WrongPassword
        | DomainError::Forbidden { .. }
        | DomainError::PrimaryAdminProtected { .. }) => EventsError::Denied(e.to_string()),
        DomainError::Internal { message } => {
            tracing::error!(%message, "events internal error");
            EventsError::Internal
        }
    };

    anyhow::Error::new(contract_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(e: DomainError) -> EventsError {
        map_domain_error_to_anyhow(e)
            .downcast::<EventsError>()
            .unwrap()
    }

    #[test]
    fn unavailable_event_is_not_found() {
        assert_eq!(
            contract(DomainError::event_unavailable(3)),
            EventsError::NotFound(Resource::Event, 3)
        );
    }

    #[test]
    fn capacity_is_a_conflict() {
        assert!(matches!(
            contract(DomainError::capacity_exceeded(1, 2)),
            EventsError::Conflict(_)
        ));
    }

    #[test]
    fn internal_detail_is_dropped() {
        assert_eq!(
            contract(DomainError::internal("lock poisoned")),
            EventsError::Internal
        );
    }
}
