//! Runner configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::login::LoginPage;
use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Top-level configuration, usually loaded from `e2e.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Application under test
    pub target: TargetConfig,

    /// Browser automation
    pub browser: BrowserConfig,

    /// Login page layout used by the `login` command
    pub login: LoginPage,

    /// Health endpoint used by the `checkApiHealth` command
    pub health: HealthConfig,

    /// Optional server to spawn before the run
    pub server: ServerConfig,

    /// Run layout
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL that relative paths are resolved against
    pub base_url: String,

    /// Timeout applied to every HTTP request
    pub request_timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// How long an action waits for its element before failing
    pub element_timeout_ms: u64,

    /// Where browser storage state is kept between action batches
    pub session_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            element_timeout_ms: 4_000,
            session_dir: PathBuf::from("test-results/session"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/api/health".to_string(),
        }
    }
}

/// Application server spawned for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Binary to spawn; no server is started when unset
    pub binary_path: Option<PathBuf>,

    /// Arguments passed to the binary
    pub args: Vec<String>,

    /// Extra environment for the server process
    pub env: BTreeMap<String, String>,

    /// Port to listen on (None = find free port). Exported as `PORT`.
    pub port: Option<u16>,

    /// Path polled until the server answers 2xx
    pub ready_path: String,

    pub startup_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            port: None,
            ready_path: "/api/health".to_string(),
            startup_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory of YAML test specs
    pub specs_dir: PathBuf,

    /// Directory for `test-results.json`
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("tests/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl E2eConfig {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| E2eError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that are not enforced by the types. Run again after
    /// applying command-line overrides.
    pub fn validate(&self) -> E2eResult<()> {
        validate_base_url(&self.target.base_url)?;
        if !self.health.path.starts_with('/') {
            return Err(E2eError::Config(format!(
                "health.path must start with '/', got '{}'",
                self.health.path
            )));
        }
        Ok(())
    }
}

/// An absolute http(s) URL with a host
pub fn validate_base_url(base_url: &str) -> E2eResult<()> {
    let invalid = |reason: &str| {
        E2eError::Config(format!("base_url must be an http(s) URL ({}), got '{}'", reason, base_url))
    };

    let url = reqwest::Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("unsupported scheme"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}
