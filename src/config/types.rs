use serde::{Deserialize, Serialize};

use crate::submitters::dispatch::{DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub pacing: PacingConfig,
    pub http: HttpConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PacingConfig {
    pub wait_s: u64,
    pub jitter_s: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            wait_s: 10,
            jitter_s: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub max_redirects: u32,
    /// 0 keeps the transport default
    pub connect_timeout_s: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout_s: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub depth: u8,
}
