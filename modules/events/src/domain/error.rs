use thiserror::Error;

use crate::domain::validation::FieldViolation;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Event not found: {id}")]
    EventNotFound { id: u64 },

    /// Missing or inactive event on a registration write.
    #[error("Event {id} not found or not active")]
    EventUnavailable { id: u64 },

    #[error("Registration not found: {id}")]
    RegistrationNotFound { id: u64 },

    #[error("User not found: {id}")]
    UserNotFound { id: u64 },

    #[error("Event {event_id} is full (capacity {capacity})")]
    CapacityExceeded { event_id: u64, capacity: u32 },

    #[error("'{email}' is already registered for event {event_id}")]
    DuplicateRegistration { event_id: u64, email: String },

    #[error("Capacity {requested} is below current occupancy {occupancy} of event {event_id}")]
    CapacityBelowOccupancy {
        event_id: u64,
        requested: u32,
        occupancy: usize,
    },

    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    #[error("Email '{email}' is already taken")]
    EmailTaken { email: String },

    #[error("Validation failed: {}", summarize(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account {id} is disabled")]
    AccountDisabled { id: u64 },

    #[error("Current password does not match")]
    WrongPassword,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("The primary admin cannot be {action}")]
    PrimaryAdminProtected { action: &'static str },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn event_not_found(id: u64) -> Self {
        Self::EventNotFound { id }
    }

    pub fn event_unavailable(id: u64) -> Self {
        Self::EventUnavailable { id }
    }

    pub fn registration_not_found(id: u64) -> Self {
        Self::RegistrationNotFound { id }
    }

    pub fn user_not_found(id: u64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn capacity_exceeded(event_id: u64, capacity: u32) -> Self {
        Self::CapacityExceeded { event_id, capacity }
    }

    pub fn duplicate_registration(event_id: u64, email: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            event_id,
            email: email.into(),
        }
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Repository failures surface as internal errors.
    pub fn storage(err: anyhow::Error) -> Self {
        Self::Internal {
            message: format!("storage: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_fields() {
        let e = DomainError::validation(vec![
            FieldViolation::new("email", "Debe ser un email válido"),
            FieldViolation::new("telefono", "El teléfono debe tener exactamente 9 dígitos"),
        ]);
        let s = e.to_string();
        assert!(s.starts_with("Validation failed: email:"));
        assert!(s.contains("; telefono:"));
    }

    #[test]
    fn storage_errors_are_internal() {
        let e = DomainError::storage(anyhow::anyhow!("disk gone"));
        assert!(matches!(e, DomainError::Internal { ref message } if message.contains("disk gone")));
    }
}
