//! Capabilities a module can expose to the runner.
//!
//! Every module implements [`Module`]. The rest are optional and are attached
//! to a [`crate::ModuleEntry`] explicitly when the module is registered.

use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;

/// Reads its configuration section and builds its services.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()>;
}

/// Contributes routes to the shared router. Called once, after every `init`.
pub trait RestfulModule: Send + Sync {
    fn register_rest(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;
}

/// The single module that owns the HTTP listener.
///
/// `rest_prepare` runs before any [`RestfulModule`] and `rest_finalize` after
/// all of them. Neither may start serving; that happens in [`StatefulModule::start`].
pub trait RestHostModule: Send + Sync + 'static {
    fn rest_prepare(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    fn rest_finalize(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;
}

/// Background work that lives between the start and stop phases.
#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Must return once the work has wound down; the runner does not wait past it.
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
