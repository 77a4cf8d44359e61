//! Lifecycle ordering and failure handling for the runner.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

use super::{run, ModuleEntry, ModuleRegistry, RegistryError, RunOptions, ShutdownOptions};
use crate::context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
use crate::contracts::{Module, RestHostModule, RestfulModule, StatefulModule};

type Journal = Arc<Mutex<Vec<String>>>;

struct EmptyConfig;
impl ConfigProvider for EmptyConfig {
    fn get_module_config(&self, _module_name: &str) -> Option<&serde_json::Value> {
        None
    }
}

struct Recorder {
    name: &'static str,
    journal: Journal,
    fail_start: bool,
}

impl Recorder {
    fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail_start: false,
        })
    }

    fn log(&self, phase: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{phase}", self.name));
    }
}

#[async_trait::async_trait]
impl Module for Recorder {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        assert_eq!(ctx.current_module(), Some(self.name));
        self.log("init");
        Ok(())
    }
}

impl RestfulModule for Recorder {
    fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.log("rest");
        Ok(router)
    }
}

impl RestHostModule for Recorder {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.log("prepare");
        Ok(router)
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        self.log("finalize");
        Ok(router)
    }
}

#[async_trait::async_trait]
impl StatefulModule for Recorder {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.log("start");
        if self.fail_start {
            anyhow::bail!("boom");
        }
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.log("stop");
        Ok(())
    }
}

fn host_entry(m: &Arc<Recorder>) -> ModuleEntry {
    ModuleEntry::new(m.name, m.clone())
        .with_rest_host(m.clone())
        .with_stateful(m.clone())
}

fn rest_entry(m: &Arc<Recorder>) -> ModuleEntry {
    ModuleEntry::new(m.name, m.clone()).with_rest(m.clone())
}

#[tokio::test]
async fn phases_run_in_order_and_stop_in_reverse() {
    let journal: Journal = Arc::default();
    let host = Recorder::new("host", &journal);
    let app = Recorder::new("app", &journal);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    run(RunOptions {
        modules_cfg: Arc::new(EmptyConfig),
        shutdown: ShutdownOptions::Token(cancel),
        modules: vec![host_entry(&host), rest_entry(&app)],
    })
    .await
    .unwrap();

    let got = journal.lock().unwrap().clone();
    assert_eq!(
        got,
        vec![
            "host:init",
            "app:init",
            "host:prepare",
            "app:rest",
            "host:finalize",
            "host:start",
            "host:stop",
        ]
    );
}

#[tokio::test]
async fn future_shutdown_completes_run() {
    let journal: Journal = Arc::default();
    let host = Recorder::new("host", &journal);

    let res = tokio::time::timeout(
        Duration::from_secs(1),
        run(RunOptions {
            modules_cfg: Arc::new(EmptyConfig),
            shutdown: ShutdownOptions::Future(Box::pin(async {})),
            modules: vec![host_entry(&host)],
        }),
    )
    .await;

    assert!(matches!(res, Ok(Ok(()))));
    assert!(journal.lock().unwrap().contains(&"host:stop".to_string()));
}

#[tokio::test]
async fn failed_start_still_stops_modules() {
    let journal: Journal = Arc::default();
    let host = Arc::new(Recorder {
        name: "host",
        journal: journal.clone(),
        fail_start: true,
    });

    let err = run(RunOptions {
        modules_cfg: Arc::new(EmptyConfig),
        shutdown: ShutdownOptions::Token(CancellationToken::new()),
        modules: vec![host_entry(&host)],
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("start failed"));
    assert_eq!(journal.lock().unwrap().last().map(String::as_str), Some("host:stop"));
}

#[test]
fn duplicate_names_are_rejected() {
    let journal: Journal = Arc::default();
    let a = Recorder::new("same", &journal);
    let b = Recorder::new("same", &journal);
    let err = ModuleRegistry::build(vec![
        ModuleEntry::new(a.name, a.clone()),
        ModuleEntry::new(b.name, b.clone()),
    ])
    .unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate("same")));
}

#[test]
fn rest_without_host_is_rejected() {
    let journal: Journal = Arc::default();
    let app = Recorder::new("app", &journal);
    let err = ModuleRegistry::build(vec![rest_entry(&app)]).unwrap_err();
    assert!(matches!(err, RegistryError::RestRequiresHost));
}

#[test]
fn two_hosts_are_rejected() {
    let journal: Journal = Arc::default();
    let a = Recorder::new("a", &journal);
    let b = Recorder::new("b", &journal);
    let err = ModuleRegistry::build(vec![host_entry(&a), host_entry(&b)]).unwrap_err();
    assert!(matches!(err, RegistryError::MultipleRestHosts("a", "b")));
}

#[test]
fn rest_phase_without_host_returns_router_untouched() {
    let journal: Journal = Arc::default();
    let solo = Recorder::new("solo", &journal);
    let registry = ModuleRegistry::build(vec![ModuleEntry::new(solo.name, solo.clone())]).unwrap();
    let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
    registry.run_rest_phase(&ctx, Router::new()).unwrap();
    assert!(journal.lock().unwrap().is_empty());
    assert!(registry.get_module("solo").is_some());
}
