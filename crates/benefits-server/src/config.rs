use std::net::SocketAddr;

use benefits_core::sheets::SheetClientConfig;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 3000;

/// Which surface the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// JSON HTTP API.
    Http,
    /// MCP JSON-RPC on stdin/stdout.
    Stdio,
}

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    /// Listen address for the HTTP transport.
    pub bind_addr: SocketAddr,
    pub sheets: SheetClientConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `BENEFITS_TRANSPORT`: `http` (default) or `stdio`
    /// - `BENEFITS_BIND`: listen address, e.g. `127.0.0.1:8080`
    /// - `PORT`: port on `0.0.0.0`, used when `BENEFITS_BIND` is absent (default 3000)
    ///
    /// Sheet fetch settings are read by `SheetClientConfig::from_env`.
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::from_vars(|key| std::env::var(key).ok())?;
        config.sheets = SheetClientConfig::from_env();
        Ok(config)
    }

    fn from_vars<F>(var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = match var("BENEFITS_TRANSPORT").as_deref().map(str::trim) {
            None | Some("") | Some("http") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "BENEFITS_TRANSPORT must be \"http\" or \"stdio\", got {other:?}"
                )))
            }
        };

        let bind_addr = match var("BENEFITS_BIND") {
            Some(bind) => bind
                .parse::<SocketAddr>()
                .map_err(|e| AppError::Config(format!("invalid BENEFITS_BIND {bind:?}: {e}")))?,
            None => {
                let port = match var("PORT") {
                    Some(port) => port
                        .parse::<u16>()
                        .map_err(|e| AppError::Config(format!("invalid PORT {port:?}: {e}")))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            transport,
            bind_addr,
            sheets: SheetClientConfig::default(),
        })
    }
}
