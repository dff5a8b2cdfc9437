use anyhow::{Context, Result};
use clap::Args;
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Where and how to reach the search backend
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    /// No timeout unless set; failures surface only from the transport
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL '{}'", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL '{}' cannot be used as a base", base_url);
        }

        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Command line / environment options for the backend connection
#[derive(Args, Debug, Clone)]
pub struct GatewayArgs {
    /// Base URL of the search API
    #[arg(long = "url", env = "FTS_CONSOLE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds (none by default)
    #[arg(long = "timeout", env = "FTS_CONSOLE_TIMEOUT")]
    pub timeout_secs: Option<u64>,
}

impl TryFrom<&GatewayArgs> for GatewayConfig {
    type Error = anyhow::Error;

    fn try_from(args: &GatewayArgs) -> Result<Self> {
        let config = GatewayConfig::new(&args.base_url)?;
        Ok(match args.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        })
    }
}
