use common::supabase::SupabaseConfig;
use common::telemetry::{LogFormat, TelemetryConfig};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Console log style (json, pretty)
    #[serde(default)]
    pub log_format: LogFormat,

    // Supabase configuration
    /// Supabase project URL
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,

    /// Public anon key for the project
    #[serde(default)]
    pub supabase_anon_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // Local persistence
    /// Directory holding the persisted user snapshot
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Entry name of the persisted user snapshot
    #[serde(default = "default_snapshot_entry")]
    pub snapshot_entry: String,

    /// Restricts test logins to the admin account; defaults to on for release builds
    #[serde(default = "default_production")]
    pub production: bool,

    /// Interval between listing refreshes in seconds, 0 disables refresh
    #[serde(default = "default_listing_refresh_secs")]
    pub listing_refresh_secs: u64,

    /// Time allowed for closers on shutdown in seconds
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    // OpenTelemetry configuration
    /// Enable OTLP export of traces and logs
    #[serde(default)]
    pub otel_enabled: bool,

    /// OTLP collector endpoint
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Service name reported to the collector
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_supabase_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".just-a-drop")
}

fn default_snapshot_entry() -> String {
    "just-a-drop-user".to_string()
}

fn default_production() -> bool {
    !cfg!(debug_assertions)
}

fn default_listing_refresh_secs() -> u64 {
    300
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "just-a-drop".to_string()
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("snapshot_entry", &self.snapshot_entry)
            .field("production", &self.production)
            .field("listing_refresh_secs", &self.listing_refresh_secs)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .field("otel_enabled", &self.otel_enabled)
            .field("otel_endpoint", &self.otel_endpoint)
            .field("otel_service_name", &self.otel_service_name)
            .finish()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("JUST_A_DROP"))
            .build()?
            .try_deserialize()
    }

    pub fn supabase(&self) -> SupabaseConfig {
        SupabaseConfig {
            url: self.supabase_url.clone(),
            anon_key: self.supabase_anon_key.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.otel_service_name.clone(),
            otel_endpoint: self.otel_endpoint.clone(),
            otel_enabled: self.otel_enabled,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }

    pub fn listing_refresh(&self) -> Option<Duration> {
        (self.listing_refresh_secs > 0).then(|| Duration::from_secs(self.listing_refresh_secs))
    }
}
