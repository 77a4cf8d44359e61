//! Lifecycle driver: init, REST wiring, start, wait for cancellation, stop.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

use super::registry::{ModuleEntry, ModuleRegistry};
use super::shutdown;
use crate::context::{ConfigProvider, ModuleCtxBuilder};

/// What ends a [`run`].
pub enum ShutdownOptions {
    /// SIGTERM or Ctrl+C.
    Signals,
    /// The caller cancels this token.
    Token(CancellationToken),
    /// Completion of this future.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub modules_cfg: Arc<dyn ConfigProvider>,
    pub shutdown: ShutdownOptions,
    /// Phase order follows this order.
    pub modules: Vec<ModuleEntry>,
}

/// Returns the token that ends the run, spawning a watcher when the trigger
/// is not a caller-owned token.
fn shutdown_token(trigger: ShutdownOptions) -> CancellationToken {
    let wait: Pin<Box<dyn Future<Output = ()> + Send>> = match trigger {
        ShutdownOptions::Token(token) => return token,
        ShutdownOptions::Future(fut) => fut,
        ShutdownOptions::Signals => Box::pin(async {
            if let Err(error) = shutdown::wait_for_shutdown().await {
                tracing::warn!(%error, "signal handler unavailable, waiting on Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }),
    };

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        wait.await;
        tracing::info!("shutdown requested");
        cancel.cancel();
    });
    token
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        modules_cfg,
        shutdown,
        modules,
    } = opts;

    let cancel = shutdown_token(shutdown);
    let registry = ModuleRegistry::build(modules)?;
    tracing::debug!(?registry, "modules registered");

    let ctx = ModuleCtxBuilder::new(cancel.clone())
        .with_config_provider(modules_cfg)
        .build();

    tracing::info!(phase = "init", "lifecycle");
    registry.run_init_phase(&ctx).await?;

    tracing::info!(phase = "rest", "lifecycle");
    registry.run_rest_phase(&ctx, axum::Router::new())?;

    tracing::info!(phase = "start", "lifecycle");
    let started = registry.run_start_phase(cancel.clone()).await;
    if started.is_ok() {
        cancel.cancelled().await;
    } else {
        cancel.cancel();
    }

    tracing::info!(phase = "stop", "lifecycle");
    registry.run_stop_phase(cancel).await;
    started.map_err(Into::into)
}
