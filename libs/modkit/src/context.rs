//! Per-module view of the process: its configuration section and the root
//! cancellation token.

use anyhow::{anyhow, Context as _};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Source of raw per-module configuration sections, keyed by module name.
pub trait ConfigProvider: Send + Sync {
    fn get_module_config(&self, module_name: &str) -> Option<&Value>;
}

impl ConfigProvider for ::runtime::AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        ::runtime::AppConfigProvider::get_module_config(self, module_name)
    }
}

/// Cheap to clone; the runner hands every module its own scoped copy.
#[derive(Clone)]
pub struct ModuleCtx {
    config: Option<Arc<dyn ConfigProvider>>,
    cancel: CancellationToken,
    module: Option<Arc<str>>,
}

impl ModuleCtx {
    pub(crate) fn for_module(mut self, name: &str) -> Self {
        self.module = Some(name.into());
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn section(&self) -> Option<(&str, &Value)> {
        let name = self.module.as_deref()?;
        let value = self.config.as_ref()?.get_module_config(name)?;
        Some((name, value))
    }

    /// Deserializes this module's section, or `T::default()` when it is
    /// absent. An unparsable section is logged and also yields the default.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        let Some((name, value)) = self.section() else {
            return T::default();
        };
        match T::deserialize(value) {
            Ok(cfg) => cfg,
            Err(error) => {
                tracing::warn!(module = name, %error, "invalid module config, falling back to defaults");
                T::default()
            }
        }
    }

    /// Like [`module_config`](Self::module_config) but every gap is an error.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .current_module()
            .ok_or_else(|| anyhow!("context is not scoped to a module"))?;
        let provider = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow!("no config provider attached"))?;
        let value = provider
            .get_module_config(name)
            .ok_or_else(|| anyhow!("missing module config: {name}"))?;
        T::deserialize(value).with_context(|| format!("invalid {name} config"))
    }
}

pub struct ModuleCtxBuilder {
    ctx: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            ctx: ModuleCtx {
                config: None,
                cancel,
                module: None,
            },
        }
    }

    pub fn with_config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.ctx.config = Some(provider);
        self
    }

    pub fn for_module(mut self, name: &str) -> Self {
        self.ctx = self.ctx.for_module(name);
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.ctx
    }
}
