use std::net::SocketAddr;

/// Upper bound for `max_items` under the normal profile.
pub const MAX_ITEMS_CEILING: usize = 500;
/// Upper bound for `max_items` under the low-memory profile.
pub const LOW_MEMORY_MAX_ITEMS_CEILING: usize = 50;
/// Live per-cycle cap applied on top of `max_items` under the low-memory profile.
pub const LOW_MEMORY_CYCLE_CAP: usize = 20;

const SAMPLE_COUNT: usize = 10;
const LOW_MEMORY_SAMPLE_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub search_terms: Vec<String>,
    pub max_items: usize,
    pub low_memory: bool,
    pub cors_origins: CorsOrigins,
    pub max_stored: usize,
    pub demo_interval_secs: u64,
    pub live_interval_secs: u64,
    pub error_cooldown_secs: u64,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub user_agent: String,
    pub sentiment_model_url: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
}

impl AppConfig {
    /// Ceiling applied to `max_items` on load and on every update.
    #[must_use]
    pub fn max_items_ceiling(&self) -> usize {
        if self.low_memory {
            LOW_MEMORY_MAX_ITEMS_CEILING
        } else {
            MAX_ITEMS_CEILING
        }
    }

    /// Number of synthetic items generated per demo cycle.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        if self.low_memory {
            LOW_MEMORY_SAMPLE_COUNT
        } else {
            SAMPLE_COUNT
        }
    }

    /// Extra per-cycle cap for live collection, if the profile imposes one.
    #[must_use]
    pub fn live_cycle_cap(&self) -> Option<usize> {
        self.low_memory.then_some(LOW_MEMORY_CYCLE_CAP)
    }

    /// The statistical model is only used when configured and memory allows.
    #[must_use]
    pub fn use_sentiment_model(&self) -> bool {
        self.sentiment_model_url.is_some() && !self.low_memory
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("search_terms", &self.search_terms)
            .field("max_items", &self.max_items)
            .field("low_memory", &self.low_memory)
            .field("cors_origins", &self.cors_origins)
            .field("max_stored", &self.max_stored)
            .field("demo_interval_secs", &self.demo_interval_secs)
            .field("live_interval_secs", &self.live_interval_secs)
            .field("error_cooldown_secs", &self.error_cooldown_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("user_agent", &self.user_agent)
            .field("sentiment_model_url", &self.sentiment_model_url)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_client_id", &self.reddit_client_id)
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .finish()
    }
}
