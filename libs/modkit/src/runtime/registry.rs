use axum::Router;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{Module, RestHostModule, RestfulModule, StatefulModule};

/// A module plus whichever optional capabilities it was registered with.
pub struct ModuleEntry {
    pub name: &'static str,
    pub core: Arc<dyn Module>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub rest_host: Option<Arc<dyn RestHostModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

impl ModuleEntry {
    pub fn new(name: &'static str, core: Arc<dyn Module>) -> Self {
        Self {
            name,
            core,
            rest: None,
            rest_host: None,
            stateful: None,
        }
    }

    pub fn with_rest(self, rest: Arc<dyn RestfulModule>) -> Self {
        Self {
            rest: Some(rest),
            ..self
        }
    }

    pub fn with_rest_host(self, host: Arc<dyn RestHostModule>) -> Self {
        Self {
            rest_host: Some(host),
            ..self
        }
    }

    pub fn with_stateful(self, stateful: Arc<dyn StatefulModule>) -> Self {
        Self {
            stateful: Some(stateful),
            ..self
        }
    }

    fn capabilities(&self) -> Vec<&'static str> {
        [
            self.rest.as_ref().map(|_| "rest"),
            self.rest_host.as_ref().map(|_| "rest_host"),
            self.stateful.as_ref().map(|_| "stateful"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Lifecycle step a module failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    RestPrepare,
    RestRegister,
    RestFinalize,
    Start,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::RestPrepare => "REST prepare",
            Phase::RestRegister => "REST registration",
            Phase::RestFinalize => "REST finalize",
            Phase::Start => "start",
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    Duplicate(&'static str),
    #[error("multiple REST host modules: '{0}' and '{1}'")]
    MultipleRestHosts(&'static str, &'static str),
    #[error("REST modules are present but no REST host is registered")]
    RestRequiresHost,
    #[error("{phase} failed for module '{module}'")]
    Phase {
        phase: Phase,
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl RegistryError {
    fn phase(phase: Phase, module: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| RegistryError::Phase {
            phase,
            module,
            source,
        }
    }
}

/// Validated set of modules. Phases visit them in registration order and
/// stop visits them in reverse.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.modules).finish()
    }
}

impl ModuleRegistry {
    /// Rejects duplicate names, a second REST host, and REST modules without a host.
    pub fn build(modules: Vec<ModuleEntry>) -> Result<Self, RegistryError> {
        let mut names = HashSet::with_capacity(modules.len());
        let mut hosts = modules.iter().filter(|e| e.rest_host.is_some());

        if let Some(dup) = modules.iter().find(|e| !names.insert(e.name)) {
            return Err(RegistryError::Duplicate(dup.name));
        }
        match (hosts.next(), hosts.next()) {
            (Some(first), Some(second)) => {
                return Err(RegistryError::MultipleRestHosts(first.name, second.name));
            }
            (None, _) if modules.iter().any(|e| e.rest.is_some()) => {
                return Err(RegistryError::RestRequiresHost);
            }
            _ => {}
        }
        Ok(Self { modules })
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| Arc::clone(&e.core))
    }

    fn rest_host(&self) -> Option<(&'static str, &Arc<dyn RestHostModule>)> {
        self.modules
            .iter()
            .find_map(|e| e.rest_host.as_ref().map(|h| (e.name, h)))
    }

    pub async fn run_init_phase(&self, base_ctx: &ModuleCtx) -> Result<(), RegistryError> {
        for entry in &self.modules {
            let ctx = base_ctx.clone().for_module(entry.name);
            entry
                .core
                .init(&ctx)
                .await
                .map_err(RegistryError::phase(Phase::Init, entry.name))?;
            tracing::debug!(module = entry.name, "init done");
        }
        Ok(())
    }

    /// Host prepare, then every REST module, then host finalize.
    pub fn run_rest_phase(
        &self,
        base_ctx: &ModuleCtx,
        router: Router,
    ) -> Result<Router, RegistryError> {
        let Some((host_name, host)) = self.rest_host() else {
            return Ok(router);
        };
        let host_ctx = base_ctx.clone().for_module(host_name);

        let mut router = host
            .rest_prepare(&host_ctx, router)
            .map_err(RegistryError::phase(Phase::RestPrepare, host_name))?;

        for entry in &self.modules {
            let Some(rest) = &entry.rest else { continue };
            let ctx = base_ctx.clone().for_module(entry.name);
            router = rest
                .register_rest(&ctx, router)
                .map_err(RegistryError::phase(Phase::RestRegister, entry.name))?;
            tracing::debug!(module = entry.name, "routes registered");
        }

        host.rest_finalize(&host_ctx, router)
            .map_err(RegistryError::phase(Phase::RestFinalize, host_name))
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for entry in &self.modules {
            if let Some(stateful) = &entry.stateful {
                stateful
                    .start(cancel.clone())
                    .await
                    .map_err(RegistryError::phase(Phase::Start, entry.name))?;
            }
        }
        Ok(())
    }

    /// Best-effort: a failing module is logged and the rest still stop.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for entry in self.modules.iter().rev() {
            let Some(stateful) = &entry.stateful else { continue };
            if let Err(error) = stateful.stop(cancel.clone()).await {
                tracing::warn!(module = entry.name, error = %error, "module stop failed");
            }
        }
    }
}
