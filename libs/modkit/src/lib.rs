//! # ModKit - module wiring for the CorvoEvents server
//!
//! - **Contracts**: `Module`, `RestfulModule`, `RestHostModule`, `StatefulModule`
//! - **Lifecycle**: init → REST → start → wait → stop, driven by [`runtime::run`]
//! - **API helpers**: the `{success, message, data, errors}` response envelope
//!   and extractors that reject malformed input with the same envelope

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod contracts;
pub use contracts::*;

pub mod api;
pub use api::envelope::{
    bad_request, conflict, forbidden, internal_error, not_found, too_many_requests, unauthorized,
    Envelope, Failure, FieldError, Pagination,
};
pub use api::extract::{JsonBody, PathParam, QueryParams};
pub use api::response::{created, ok, ApiOk};

pub mod runtime;
pub use runtime::{
    run, ModuleEntry, ModuleRegistry, Phase, RegistryError, RunOptions, ShutdownOptions,
};
