//! CorvoEvents registration service.
//!
//! `contract` is the stable surface for other modules: an in-process
//! [`EventsApi`](contract::client::EventsApi) plus its models and errors.
//! Everything else is wired together by [`EventsModule`] and only public so
//! the integration tests can build services directly.

pub mod contract;
pub use contract::{client, error, model};

pub mod module;
pub use module::{EventsModule, Services, MODULE_NAME};

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
