//! Configuration for clipmaker-service
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML/YAML/JSON
//! file, then `CLIPMAKER__SECTION__KEY` environment variables. The CLI applies
//! its own overrides on top (see `main.rs`).

use clipmaker_adapters::{HttpPlatformConfig, PlatformFixtures};
use clipmaker_core::{LinkTemplates, UrlPolicy, DEFAULT_SUBMIT_DELAY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ServiceError;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub links: LinkTemplates,

    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Users and experiences served by the `static` platform backend
    #[serde(default)]
    pub fixtures: PlatformFixtures,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            platform: PlatformConfig::default(),
            links: LinkTemplates::default(),
            form: FormConfig::default(),
            logging: LoggingConfig::default(),
            fixtures: PlatformFixtures::demo(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}

/// Where identity, access and profile lookups go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformBackend {
    /// The platform API over HTTPS
    Http,
    /// Fixtures from the `fixtures` section
    #[default]
    Static,
}

/// Platform credentials and identifiers
#[derive(Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub backend: PlatformBackend,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Application id, used for token audience and the install link
    #[serde(default)]
    pub app_id: String,

    /// Company id, used for the dashboard link
    #[serde(default)]
    pub company_id: String,

    /// Header carrying the user token
    #[serde(default = "default_token_header")]
    pub token_header: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: PlatformBackend::default(),
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            app_id: String::new(),
            company_id: String::new(),
            token_header: default_token_header(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("PlatformConfig")
            .field("backend", &self.backend)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &api_key)
            .field("app_id", &self.app_id)
            .field("company_id", &self.company_id)
            .field("token_header", &self.token_header)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl PlatformConfig {
    pub fn http_client_config(&self) -> HttpPlatformConfig {
        HttpPlatformConfig {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            app_id: self.app_id.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Clip request form configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub url_policy: UrlPolicy,

    /// Simulated processing time in milliseconds
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            url_policy: UrlPolicy::default(),
            submit_delay_ms: default_submit_delay_ms(),
        }
    }
}

impl FormConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.whop.com/api/".to_string()
}

fn default_token_header() -> String {
    "x-whop-user-token".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_submit_delay_ms() -> u64 {
    DEFAULT_SUBMIT_DELAY.as_millis() as u64
}

fn default_log_level() -> String {
    "clipmaker_service=info,clipmaker_core=info,info".to_string()
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CLIPMAKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject combinations that cannot serve a request
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.platform.token_header.trim().is_empty() {
            return Err(ServiceError::Config(
                "platform.token_header must not be empty".to_string(),
            ));
        }
        if self.platform.backend == PlatformBackend::Http {
            if self.platform.api_key.trim().is_empty() {
                return Err(ServiceError::Config(
                    "platform.api_key is required for the http backend".to_string(),
                ));
            }
            if self.platform.app_id.trim().is_empty() {
                return Err(ServiceError::Config(
                    "platform.app_id is required for the http backend".to_string(),
                ));
            }
            if self.platform.request_timeout_secs == 0 {
                return Err(ServiceError::Config(
                    "platform.request_timeout_secs must be at least 1 for the http backend"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}
