use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CqlMiddlewareDbError;

/// Settings handed to the engine when a session connects.
///
/// Loadable from JSON; missing fields take the defaults below.
///
/// ```rust
/// use cql_middleware::prelude::*;
///
/// let cfg = ClusterConfig::from_json(r#"{ "contact_points": ["10.0.0.1"], "port": 9142 }"#)?;
/// assert_eq!(cfg.port, 9142);
/// assert_eq!(cfg.num_threads_io, 1);
/// # Ok::<(), CqlMiddlewareDbError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub contact_points: Vec<String>,
    pub port: u16,
    pub core_connections_per_host: u32,
    pub max_connections_per_host: u32,
    pub num_threads_io: u32,
    pub queue_size_io: u32,
    pub pending_requests_low_water_mark: u32,
    pub pending_requests_high_water_mark: u32,
    pub write_bytes_low_water_mark: u32,
    pub write_bytes_high_water_mark: u32,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            contact_points: Vec::new(),
            port: 9042,
            core_connections_per_host: 1,
            max_connections_per_host: 2,
            num_threads_io: 1,
            queue_size_io: 4096,
            pending_requests_low_water_mark: 128,
            pending_requests_high_water_mark: 256,
            write_bytes_low_water_mark: 32 * 1024,
            write_bytes_high_water_mark: 64 * 1024,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 12_000,
        }
    }
}

impl ClusterConfig {
    #[must_use]
    pub fn builder() -> ClusterConfigBuilder {
        ClusterConfigBuilder::new()
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::ConfigError` for malformed JSON or invalid settings.
    pub fn from_json(json: &str) -> Result<Self, CqlMiddlewareDbError> {
        let cfg: ClusterConfig = serde_json::from_str(json)
            .map_err(|e| CqlMiddlewareDbError::ConfigError(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check the settings for combinations the engine would reject.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::ConfigError` describing the first problem found.
    pub fn validate(&self) -> Result<(), CqlMiddlewareDbError> {
        let fail = |msg: String| Err(CqlMiddlewareDbError::ConfigError(msg));
        if self.contact_points.is_empty() {
            return fail("no contact points configured".into());
        }
        if self.contact_points.iter().any(|c| c.trim().is_empty()) {
            return fail("empty contact point".into());
        }
        if self.port == 0 {
            return fail("port must be nonzero".into());
        }
        if self.num_threads_io == 0 {
            return fail("num_threads_io must be at least 1".into());
        }
        if self.core_connections_per_host > self.max_connections_per_host {
            return fail(format!(
                "core_connections_per_host ({}) exceeds max_connections_per_host ({})",
                self.core_connections_per_host, self.max_connections_per_host
            ));
        }
        if self.pending_requests_low_water_mark > self.pending_requests_high_water_mark {
            return fail(format!(
                "pending requests low water mark ({}) exceeds high water mark ({})",
                self.pending_requests_low_water_mark, self.pending_requests_high_water_mark
            ));
        }
        if self.write_bytes_low_water_mark > self.write_bytes_high_water_mark {
            return fail(format!(
                "write bytes low water mark ({}) exceeds high water mark ({})",
                self.write_bytes_low_water_mark, self.write_bytes_high_water_mark
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ClusterConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClusterConfigBuilder {
    cfg: ClusterConfig,
}

impl ClusterConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Comma-separated hosts, e.g. `"10.0.0.1, 10.0.0.2"`. Appends to any already set.
    #[must_use]
    pub fn contact_points(mut self, hosts: &str) -> Self {
        self.cfg.contact_points.extend(
            hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        );
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    #[must_use]
    pub fn core_connections_per_host(mut self, n: u32) -> Self {
        self.cfg.core_connections_per_host = n;
        self
    }

    #[must_use]
    pub fn max_connections_per_host(mut self, n: u32) -> Self {
        self.cfg.max_connections_per_host = n;
        self
    }

    #[must_use]
    pub fn num_threads_io(mut self, n: u32) -> Self {
        self.cfg.num_threads_io = n;
        self
    }

    #[must_use]
    pub fn queue_size_io(mut self, n: u32) -> Self {
        self.cfg.queue_size_io = n;
        self
    }

    #[must_use]
    pub fn pending_requests_low_water_mark(mut self, n: u32) -> Self {
        self.cfg.pending_requests_low_water_mark = n;
        self
    }

    #[must_use]
    pub fn pending_requests_high_water_mark(mut self, n: u32) -> Self {
        self.cfg.pending_requests_high_water_mark = n;
        self
    }

    #[must_use]
    pub fn write_bytes_low_water_mark(mut self, n: u32) -> Self {
        self.cfg.write_bytes_low_water_mark = n;
        self
    }

    #[must_use]
    pub fn write_bytes_high_water_mark(mut self, n: u32) -> Self {
        self.cfg.write_bytes_high_water_mark = n;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The config as built, without validation.
    #[must_use]
    pub fn finish(self) -> ClusterConfig {
        self.cfg
    }

    /// Validate and return the config.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::ConfigError` if validation fails.
    pub fn build(self) -> Result<ClusterConfig, CqlMiddlewareDbError> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
