use std::env;

/// Process-wide configuration loaded once at startup. Per spec §9 this and
/// the OAuth settings catalog are the only global mutable-at-init state;
/// nothing here is mutated after `from_env()` returns.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres DSN backing the entity ledger and sync cursor tables.
    pub database_url: String,

    /// Redis URL backing the progress publisher's pub/sub channel.
    pub redis_url: String,

    /// Symmetric key (hex-encoded, 32 bytes) used to encrypt credentials at
    /// rest. Process-wide per spec §6.
    pub credential_encryption_key: String,

    /// Path to the OAuth settings catalog YAML (spec §4.9/§6).
    pub oauth_catalog_path: String,

    /// Durable workflow task queue name (spec §6).
    pub task_queue: String,

    /// Default worker pool concurrency cap (spec §4.5); per-job overridable.
    pub default_max_workers: usize,

    /// Async source stream bounded-queue capacity (spec §4.4).
    pub stream_queue_capacity: usize,

    /// Root of the temp-file materialization tree (spec §6).
    pub temp_dir: String,

    /// Port the Restate workflow endpoint binds; the SSE progress server
    /// binds `port + 1` (teacher's `rootsignal-server` dual-port pattern).
    pub port: u16,

    /// Restate admin API base URL, used to auto-register this deployment
    /// at startup. Absent in local `restate-server --dev` setups that
    /// register deployments manually.
    pub restate_admin_url: Option<String>,

    /// Self-reachable URL advertised to the Restate admin during
    /// registration; defaults to `http://localhost:<port>`.
    pub restate_self_url: Option<String>,

    /// Bearer token for the Restate admin API, if it requires one.
    pub restate_auth_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables. Panics with a named
    /// message if a required var is missing — deliberately fail fast at
    /// process start rather than deep inside a sync job.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            redis_url: required_env("REDIS_URL"),
            credential_encryption_key: required_env("CREDENTIAL_ENCRYPTION_KEY"),
            oauth_catalog_path: env::var("OAUTH_CATALOG_PATH")
                .unwrap_or_else(|_| "oauth_catalog.yaml".to_string()),
            task_queue: env::var("AIRWEAVE_TASK_QUEUE")
                .unwrap_or_else(|_| "airweave-sync".to_string()),
            default_max_workers: env::var("AIRWEAVE_MAX_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            stream_queue_capacity: env::var("AIRWEAVE_STREAM_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            temp_dir: env::var("AIRWEAVE_TEMP_DIR").unwrap_or_else(|_| "/tmp".to_string()),
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(9080),
            restate_admin_url: env::var("RESTATE_ADMIN_URL").ok(),
            restate_self_url: env::var("RESTATE_SELF_URL").ok(),
            restate_auth_token: env::var("RESTATE_AUTH_TOKEN").ok(),
        }
    }

    /// Log only the length of each sensitive var, never its value.
    pub fn log_redacted(&self) {
        let vars = [
            ("DATABASE_URL", &self.database_url),
            ("REDIS_URL", &self.redis_url),
            ("CREDENTIAL_ENCRYPTION_KEY", &self.credential_encryption_key),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

pub fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Initialize the global tracing subscriber. Call once, at process start.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "AIRWEAVE_TEST_MISSING_VAR environment variable is required")]
    fn required_env_panics_with_var_name() {
        std::env::remove_var("AIRWEAVE_TEST_MISSING_VAR");
        required_env("AIRWEAVE_TEST_MISSING_VAR");
    }
}
