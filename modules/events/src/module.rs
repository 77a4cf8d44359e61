use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::Duration;
use modkit::{Module, ModuleCtx, RestfulModule};
use tracing::{debug, info, warn};

use crate::api::rest::routes;
use crate::config::EventsConfig;
use crate::contract::client::EventsApi;
use crate::domain::{
    accounts::AccountService, catalog::EventCatalog, ledger::RegistrationLedger,
    locks::EventLocks, ports::PasswordHasher, session::SessionIssuer,
};
use crate::gateways::local::EventsLocalClient;
use crate::infra::{
    password::Argon2Hasher,
    rate_limit::LoginRateLimiter,
    storage::{seed, InMemoryEventsRepo, InMemoryRegistrationsRepo, InMemoryUsersRepo},
};

pub const MODULE_NAME: &str = "events";

/// Everything the REST layer needs, wired once at init.
pub struct Services {
    pub catalog: EventCatalog,
    pub ledger: RegistrationLedger,
    pub accounts: AccountService,
    pub sessions: Arc<SessionIssuer>,
    pub limiter: Arc<LoginRateLimiter>,
}

impl Services {
    /// Builds fresh in-memory stores, seeds the primary admin and, if
    /// enabled, the demo catalog.
    pub async fn build(cfg: &EventsConfig, hasher: Arc<dyn PasswordHasher>) -> anyhow::Result<Self> {
        let events = Arc::new(InMemoryEventsRepo::new());
        let registrations = Arc::new(InMemoryRegistrationsRepo::new());
        let users = Arc::new(InMemoryUsersRepo::new());
        let locks = Arc::new(EventLocks::new());

        let catalog = EventCatalog::new(events.clone(), registrations.clone(), locks.clone());
        let ledger = RegistrationLedger::new(catalog.clone(), registrations, locks);
        let accounts = AccountService::new(users, hasher);

        accounts
            .seed_admin(cfg.admin_password.clone())
            .await
            .context("seeding primary admin")?;
        if cfg.seed_demo_events {
            seed::seed_demo_events(&*events).await?;
        }

        let ttl_hours = i64::try_from(cfg.token_ttl_hours).context("token_ttl_hours too large")?;
        let ttl = Duration::hours(ttl_hours);
        let sessions = match cfg.token_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => SessionIssuer::new(secret.as_bytes(), ttl),
            None => {
                warn!("No token_secret configured; using a random key, sessions end on restart");
                SessionIssuer::with_random_key(ttl)
            }
        };

        let limiter = LoginRateLimiter::new(
            cfg.login_max_attempts,
            StdDuration::from_secs(cfg.login_window_secs),
        );

        Ok(Self {
            catalog,
            ledger,
            accounts,
            sessions: Arc::new(sessions),
            limiter: Arc::new(limiter),
        })
    }
}

/// Event catalog, registration ledger and user accounts.
pub struct EventsModule {
    services: ArcSwapOption<Services>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Default for EventsModule {
    fn default() -> Self {
        Self::with_hasher(Arc::new(Argon2Hasher::new()))
    }
}

impl EventsModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            services: ArcSwapOption::empty(),
            hasher,
        }
    }

    pub fn services(&self) -> Option<Arc<Services>> {
        self.services.load_full()
    }

    /// In-process client for other modules; `None` before init.
    pub fn client(&self) -> Option<Arc<dyn EventsApi>> {
        self.services().map(|s| {
            Arc::new(EventsLocalClient::new(s.catalog.clone(), s.ledger.clone()))
                as Arc<dyn EventsApi>
        })
    }
}

#[async_trait]
impl Module for EventsModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing events module");

        let cfg: EventsConfig = ctx.module_config();
        debug!(
            token_ttl_hours = cfg.token_ttl_hours,
            login_max_attempts = cfg.login_max_attempts,
            login_window_secs = cfg.login_window_secs,
            seed_demo_events = cfg.seed_demo_events,
            "Loaded events config"
        );

        let services = Services::build(&cfg, self.hasher.clone()).await?;
        self.services.store(Some(Arc::new(services)));
        info!("Events services ready");
        Ok(())
    }
}

impl RestfulModule for EventsModule {
    fn register_rest(&self, _ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering events REST routes");
        let services = self
            .services()
            .ok_or_else(|| anyhow::anyhow!("Services not initialized"))?;
        let router = routes::register_routes(router, services)?;
        info!("Events REST routes registered successfully");
        Ok(router)
    }
}
