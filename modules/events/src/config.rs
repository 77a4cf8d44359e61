use serde::{Deserialize, Serialize};

/// Configuration for the events module (`modules.events`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// HMAC key for session tokens. A random key is generated when absent,
    /// so tokens do not survive a restart.
    #[serde(default)]
    pub token_secret: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,
    /// Password of the primary admin. When absent the admin cannot log in.
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default = "default_seed_demo_events")]
    pub seed_demo_events: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            login_max_attempts: default_login_max_attempts(),
            login_window_secs: default_login_window_secs(),
            admin_password: None,
            seed_demo_events: default_seed_demo_events(),
        }
    }
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_window_secs() -> u64 {
    15 * 60
}

fn default_seed_demo_events() -> bool {
    true
}
