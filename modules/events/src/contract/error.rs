use std::fmt;
use thiserror::Error;

/// Kind of record a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Event,
    Registration,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Event => "event",
            Resource::Registration => "registration",
            Resource::User => "user",
        })
    }
}

/// What callers of [`EventsApi`](crate::contract::client::EventsApi) see.
/// Internal failures are reported without detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventsError {
    #[error("{0} {1} not found")]
    NotFound(Resource, u64),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("denied: {0}")]
    Denied(String),

    #[error("internal error")]
    Internal,
}
