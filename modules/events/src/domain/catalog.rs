use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::contract::model::{
    Event, EventDetail, EventFilter, EventPatch, EventStatus, EventView, NewEvent,
};
use crate::domain::error::DomainError;
use crate::domain::locks::EventLocks;
use crate::domain::repo::{EventsRepository, RegistrationsRepository};
use crate::domain::validation::{self, parse_date};

/// Read side of events plus the admin create/update operations.
#[derive(Clone)]
pub struct EventCatalog {
    events: Arc<dyn EventsRepository>,
    registrations: Arc<dyn RegistrationsRepository>,
    locks: Arc<EventLocks>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

impl EventCatalog {
    pub fn new(
        events: Arc<dyn EventsRepository>,
        registrations: Arc<dyn RegistrationsRepository>,
        locks: Arc<EventLocks>,
    ) -> Self {
        Self {
            events,
            registrations,
            locks,
        }
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Option<Event>, DomainError> {
        self.events.find_by_id(id).await.map_err(DomainError::storage)
    }

    /// Missing and inactive events are both reported as unavailable.
    pub async fn find_active(&self, id: u64) -> Result<Event, DomainError> {
        self.find_by_id(id)
            .await?
            .filter(Event::is_active)
            .ok_or_else(|| DomainError::event_unavailable(id))
    }

    pub async fn occupancy(&self, event_id: u64) -> Result<usize, DomainError> {
        self.registrations
            .count_confirmed(event_id)
            .await
            .map_err(DomainError::storage)
    }

    async fn view(&self, event: Event) -> Result<EventView, DomainError> {
        let n = self.occupancy(event.id).await?;
        Ok(EventView::new(event, n))
    }

    #[instrument(name = "events.catalog.list", skip(self, filter))]
    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<EventView>, DomainError> {
        let wanted_date = filter.date.as_deref().map(parse_date);
        let mut events: Vec<Event> = self
            .events
            .list()
            .await
            .map_err(DomainError::storage)?
            .into_iter()
            .filter(|e| e.status == filter.status)
            .filter(|e| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| contains_ci(&e.category, c))
            })
            .filter(|e| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |l| contains_ci(&e.location, l))
            })
            .filter(|e| match wanted_date {
                None => true,
                Some(Some(d)) => e.date == d,
                // An unparseable date matches nothing.
                Some(None) => false,
            })
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        let mut out = Vec::with_capacity(events.len());
        for e in events {
            out.push(self.view(e).await?);
        }
        debug!("Listed {} events", out.len());
        Ok(out)
    }

    pub async fn get_view(&self, id: u64) -> Result<EventView, DomainError> {
        let event = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(id))?;
        self.view(event).await
    }

    /// Event of any status with occupancy and all of its registrations.
    #[instrument(name = "events.catalog.get_detail", skip(self), fields(event_id = id))]
    pub async fn get_detail(&self, id: u64) -> Result<EventDetail, DomainError> {
        let view = self.get_view(id).await?;
        let mut registrations = self
            .registrations
            .list_by_event(id)
            .await
            .map_err(DomainError::storage)?;
        registrations.sort_by_key(|r| r.id);
        Ok(EventDetail {
            view,
            registrations,
        })
    }

    #[instrument(name = "events.catalog.create_event", skip(self, new_event), fields(name = %new_event.name))]
    pub async fn create_event(&self, new_event: NewEvent) -> Result<EventView, DomainError> {
        let valid = validation::validate_new_event(&new_event)?;
        let event = Event {
            id: self.events.next_id(),
            name: valid.name,
            description: valid.description,
            location: valid.location,
            date: valid.date,
            time: valid.time,
            capacity: valid.capacity,
            price: valid.price,
            category: valid.category,
            image: valid.image,
            status: EventStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.events
            .insert(event.clone())
            .await
            .map_err(DomainError::storage)?;
        info!(event_id = event.id, "Event created");
        Ok(EventView::new(event, 0))
    }

    /// Applies a patch under the event's lock so capacity cannot drop below
    /// a concurrently growing occupancy.
    #[instrument(name = "events.catalog.update_event", skip(self, patch), fields(event_id = id))]
    pub async fn update_event(&self, id: u64, patch: EventPatch) -> Result<EventView, DomainError> {
        let patch = validation::validate_event_patch(&patch)?;
        if self.find_by_id(id).await?.is_none() {
            return Err(DomainError::event_not_found(id));
        }

        let _guard = self.locks.lock(id).await;
        let mut event = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(id))?;
        let occupancy = self.occupancy(id).await?;

        if let Some(cap) = patch.capacity.and_then(|c| u32::try_from(c).ok()) {
            if (cap as usize) < occupancy {
                return Err(DomainError::CapacityBelowOccupancy {
                    event_id: id,
                    requested: cap,
                    occupancy,
                });
            }
            event.capacity = cap;
        }
        if let Some(name) = patch.name {
            event.name = name;
        }
        if let Some(d) = patch.description {
            event.description = Some(d).filter(|s| !s.is_empty());
        }
        if let Some(loc) = patch.location {
            event.location = loc;
        }
        if let Some(date) = patch.date.as_deref().and_then(parse_date) {
            event.date = date;
        }
        if let Some(time) = patch.time {
            event.time = time;
        }
        if let Some(price) = patch.price {
            event.price = price;
        }
        if let Some(cat) = patch.category {
            event.category = cat;
        }
        if let Some(img) = patch.image {
            event.image = Some(img).filter(|s| !s.is_empty());
        }
        if let Some(status) = patch.status {
            event.status = status;
        }
        event.updated_at = Some(Utc::now());

        self.events
            .update(event.clone())
            .await
            .map_err(DomainError::storage)?;
        info!("Event updated");
        Ok(EventView::new(event, occupancy))
    }
}
