use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
/// Small-screen breakpoint of the browser client.
pub const DEFAULT_CONSTRAINED_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    #[serde(default)]
    pub graph_limit: Option<u32>,
    #[serde(default)]
    pub search_limit: Option<u32>,
    #[serde(default)]
    pub expand_depth: Option<u8>,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            graph_limit: None,
            search_limit: None,
            expand_depth: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub constrained_breakpoint_px: u32,
    /// Forces the constrained policy on or off regardless of viewport width.
    #[serde(default)]
    pub constrained: Option<bool>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            constrained_breakpoint_px: DEFAULT_CONSTRAINED_BREAKPOINT_PX,
            constrained: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub gateway: GatewayConfig,
    pub surface: SurfaceConfig,
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Layers `<dir>/default`, `<dir>/<RUN_MODE>` and `KGVIEW__*` variables over the defaults.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let default_file = dir.join("default");
        let mode_file = dir.join(&run_mode);

        let builder = Config::builder()
            .set_default("gateway.api_base", DEFAULT_API_BASE)?
            .set_default("gateway.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS as i64)?
            .set_default("gateway.connect_timeout_ms", DEFAULT_CONNECT_TIMEOUT_MS as i64)?
            .set_default(
                "surface.constrained_breakpoint_px",
                DEFAULT_CONSTRAINED_BREAKPOINT_PX as i64,
            )?
            .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(File::with_name(&mode_file.to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("KGVIEW").separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(
            run_mode = %run_mode,
            dir = %dir.display(),
            api_base = %config.gateway.api_base,
            "client configuration loaded"
        );
        Ok(config)
    }
}
