//! Configuration management for repoint
//!
//! Configuration comes from a TOML file, with secrets and the schedule
//! optionally overridden from the environment. Every section has defaults,
//! including the Tokyo and Singapore locations, so a file only needs credentials.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::cloud::LightsailConfig;
use crate::dns::CloudflareConfig;
use crate::models::RegionProfile;
use crate::scheduler::CronSchedule;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// DNS provider credentials and zone
    pub cloudflare: CloudflareConfig,

    /// Address provider credentials
    pub lightsail: LightsailConfig,

    /// Managed record selection
    pub inventory: InventoryConfig,

    /// Supported locations
    pub locations: Vec<RegionProfile>,

    /// Liveness probe settings
    pub probe: ProbeConfig,

    /// Reconfiguration call settings
    pub notify: NotifyConfig,

    /// Reconciliation cadence
    pub schedule: ScheduleConfig,

    /// Metrics surface
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Managed record selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Token a record name must contain to be managed
    pub management_token: String,
}

/// Port the managed hosts serve on
pub const DEFAULT_ENDPOINT_PORT: u16 = 8762;

/// Liveness probe target on each managed host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub port: u16,
    pub path: String,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_ENDPOINT_PORT,
            path: String::from("/actuator/info"),
            timeout_secs: 10,
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reconfiguration endpoint on a freshly addressed host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub port: u16,
    pub path: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_ENDPOINT_PORT,
            path: String::from("/updateIp"),
            timeout_secs: 10,
        }
    }
}

impl NotifyConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reconciliation cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression (5 or 6 fields)
    pub expression: String,

    /// Run one cycle immediately at startup
    pub run_on_startup: bool,
}

/// Metrics/health HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cloudflare: CloudflareConfig::default(),
            lightsail: LightsailConfig::default(),
            inventory: InventoryConfig {
                management_token: String::from("nasi-campur"),
            },
            locations: vec![
                RegionProfile::new("jp", "ap-northeast-1", "Ubuntu-1GB-Tokyo-1"),
                RegionProfile::new("sg", "ap-southeast-1", "CentOS-1GB-Singapore-1"),
            ],
            probe: ProbeConfig::default(),
            notify: NotifyConfig::default(),
            schedule: ScheduleConfig {
                expression: String::from("*/5 * * * *"),
                run_on_startup: false,
            },
            server: ServerConfig {
                bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from a file if it exists, otherwise start from defaults; then
    /// apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override secrets and cadence from environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(email) = std::env::var("REPOINT_CF_EMAIL") {
            self.cloudflare.email = email;
        }
        if let Ok(key) = std::env::var("REPOINT_CF_KEY") {
            self.cloudflare.api_key = key;
        }
        if let Ok(zone) = std::env::var("REPOINT_CF_ZONE_ID") {
            self.cloudflare.zone_id = zone;
        }
        if let Ok(id) = std::env::var("AWS_ACCESS_KEY_ID") {
            self.lightsail.access_key_id = id;
        }
        if let Ok(secret) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            self.lightsail.secret_access_key = secret;
        }
        if let Ok(token) = std::env::var("AWS_SESSION_TOKEN") {
            self.lightsail.session_token = Some(token);
        }
        if let Ok(expression) = std::env::var("REPOINT_SCHEDULE") {
            self.schedule.expression = expression;
        }
        if let Ok(addr) = std::env::var("REPOINT_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid REPOINT_BIND_ADDRESS: {addr}"))?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            anyhow::bail!("at least one location must be configured");
        }

        // One reservation per region, so a region can back only one location
        let mut seen = HashSet::new();
        let mut regions = HashSet::new();
        for location in &self.locations {
            if location.code.is_empty() {
                anyhow::bail!("location code must not be empty");
            }
            if !seen.insert(location.code.as_str()) {
                anyhow::bail!("duplicate location code: {}", location.code);
            }
            if location.region.is_empty() || location.instance.is_empty() {
                anyhow::bail!("location {} needs both region and instance", location.code);
            }
            if !regions.insert(location.region.as_str()) {
                anyhow::bail!(
                    "location {} reuses region {}; each region can serve one location",
                    location.code,
                    location.region
                );
            }
        }

        if self.inventory.management_token.is_empty() {
            anyhow::bail!("management_token must not be empty");
        }

        if self.probe.timeout_secs == 0 || self.notify.timeout_secs == 0 {
            anyhow::bail!("probe and notify timeouts must be greater than 0");
        }

        if self.cloudflare.per_page == 0 {
            anyhow::bail!("cloudflare.per_page must be greater than 0");
        }

        if self.cloudflare.timeout_secs == 0 || self.lightsail.timeout_secs == 0 {
            anyhow::bail!("provider timeouts must be greater than 0");
        }

        CronSchedule::parse(&self.schedule.expression)
            .with_context(|| format!("invalid schedule expression: {}", self.schedule.expression))?;

        Ok(())
    }

    /// Check that provider credentials are present
    pub fn validate_credentials(&self) -> Result<()> {
        if self.cloudflare.email.is_empty()
            || self.cloudflare.api_key.is_empty()
            || self.cloudflare.zone_id.is_empty()
        {
            anyhow::bail!("cloudflare email, api_key and zone_id are required");
        }
        if self.lightsail.access_key_id.is_empty() || self.lightsail.secret_access_key.is_empty() {
            anyhow::bail!("lightsail access_key_id and secret_access_key are required");
        }
        Ok(())
    }

    /// Region profile for a location code
    pub fn region_for(&self, code: &str) -> Option<&RegionProfile> {
        self.locations.iter().find(|l| l.code == code)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Config::default().inventory
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Config::default().schedule
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Config::default().server
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Config::default().logging
    }
}
