//! Playwright browser automation
//!
//! Each batch of actions is rendered to a standalone Node script and run
//! with `node`. Cookies and local storage are carried from one batch to the
//! next through a Playwright storage-state file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::config::BrowserConfig;
use crate::driver::{Action, BrowserDriver};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Failure report printed by the generated script on stderr
#[derive(Debug, Deserialize)]
struct ScriptFailure {
    step: i64,
    #[serde(default)]
    name: String,
    error: String,
}

/// Driver that runs each batch through Playwright
pub struct PlaywrightDriver {
    base_url: String,
    browser: Browser,
    headless: bool,
    viewport_width: u32,
    viewport_height: u32,
    element_timeout_ms: u64,
    state_path: PathBuf,
}

impl PlaywrightDriver {
    /// Create a driver for the given base URL
    pub fn new(base_url: &str, config: &BrowserConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.session_dir)?;
        let state_path = config.session_dir.join("storage-state.json");
        // Each run starts logged out.
        if state_path.exists() {
            std::fs::remove_file(&state_path)?;
        }

        Ok(Self {
            base_url: base_url.to_string(),
            browser: config.browser,
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            element_timeout_ms: config.element_timeout_ms,
            state_path,
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a batch of actions
    pub fn build_script(&self, actions: &[Action]) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const fs = require('fs');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const statePath = {state_path};
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }},
    baseURL: {base_url},
    storageState: fs.existsSync(statePath) ? statePath : undefined,
  }});
  context.setDefaultTimeout({timeout});
  const page = await context.newPage();
  let step = -1;

  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            state_path = js_string(&self.state_path.to_string_lossy()),
            width = self.viewport_width,
            height = self.viewport_height,
            base_url = js_string(&self.base_url),
            timeout = self.element_timeout_ms,
        ));

        for (i, action) in actions.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, action.name()));
            script.push_str(&format!("    step = {};\n", i));
            script.push_str(&action_to_js(action));
            script.push('\n');
        }

        script.push_str(
            r#"
    await context.storageState({ path: statePath });
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, step, name: error.name, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Execute a script via node
    async fn run_script(&self, script: &str, actions: &[Action]) -> E2eResult<()> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("batch.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path);

        // The script lives in a temp dir, so point module resolution back at
        // the project's node_modules.
        if std::env::var_os("NODE_PATH").is_none() {
            let node_modules = std::env::current_dir()?.join("node_modules");
            cmd.env("NODE_PATH", node_modules);
        }

        let output = cmd.output().await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Err(classify_failure(actions, &stdout, &stderr))
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightDriver {
    async fn perform(&mut self, actions: &[Action]) -> E2eResult<()> {
        if actions.is_empty() {
            return Ok(());
        }
        let script = self.build_script(actions);
        self.run_script(&script, actions).await
    }
}

/// Render a Rust string as a JavaScript string literal
fn js_string(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    serde_json::Value::String(value.to_string()).to_string()
}

fn action_to_js(action: &Action) -> String {
    match action {
        Action::Visit { path } => format!("    await page.goto({});", js_string(path)),
        Action::Type { selector, text } => format!(
            "    await page.type({}, {});",
            js_string(selector),
            js_string(text)
        ),
        Action::Click { selector } => format!("    await page.click({});", js_string(selector)),
    }
}

/// Turn the script's failure output into an error for the failing action
fn classify_failure(actions: &[Action], stdout: &str, stderr: &str) -> E2eError {
    let failure = stderr
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<ScriptFailure>(line.trim()).ok());

    let Some(failure) = failure else {
        return E2eError::Playwright(format!(
            "Script failed:\nstdout: {}\nstderr: {}",
            stdout, stderr
        ));
    };

    let action = usize::try_from(failure.step)
        .ok()
        .and_then(|i| actions.get(i));

    match action {
        Some(action) if failure.name == "TimeoutError" => match action.selector() {
            Some(selector) => E2eError::ElementNotFound {
                selector: selector.to_string(),
            },
            None => E2eError::Timeout(action.name()),
        },
        Some(action) => E2eError::Playwright(format!("{}: {}", action.name(), failure.error)),
        None => {
            warn!("Playwright failed outside any action: {}", failure.error);
            E2eError::Playwright(failure.error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> PlaywrightDriver {
        PlaywrightDriver {
            base_url: "http://127.0.0.1:8080".to_string(),
            browser: Browser::Firefox,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            element_timeout_ms: 4000,
            state_path: PathBuf::from("/tmp/session/storage-state.json"),
        }
    }

    #[test]
    fn test_script_contains_actions_in_order() {
        let script = driver().build_script(&[
            Action::visit("/login"),
            Action::type_into("#username", "alice"),
            Action::click("button[type=\"submit\"]"),
        ]);

        let goto = script.find(r#"await page.goto("/login");"#).unwrap();
        let typed = script.find(r##"await page.type("#username", "alice");"##).unwrap();
        let click = script.find(r#"await page.click("button[type=\"submit\"]");"#).unwrap();
        assert!(goto < typed && typed < click);
        assert!(script.contains("firefox.launch({ headless: true })"));
        assert!(script.contains("context.setDefaultTimeout(4000)"));
    }

    #[test]
    fn test_script_escapes_typed_text() {
        let script = driver().build_script(&[Action::type_into("#password", "it's \"quoted\"\n")]);
        assert!(script.contains(r##"await page.type("#password", "it's \"quoted\"\n");"##));
    }

    #[test]
    fn test_timeout_on_selector_is_element_not_found() {
        let actions = [Action::visit("/login"), Action::type_into("#username", "alice")];
        let stderr = r#"{"success":false,"step":1,"name":"TimeoutError","error":"Timeout 4000ms exceeded."}"#;

        let err = classify_failure(&actions, "", stderr);
        assert!(matches!(err, E2eError::ElementNotFound { selector } if selector == "#username"));
    }

    #[test]
    fn test_timeout_on_navigation_is_timeout() {
        let actions = [Action::visit("/login")];
        let stderr = "some node warning\n{\"success\":false,\"step\":0,\"name\":\"TimeoutError\",\"error\":\"x\"}\n";

        let err = classify_failure(&actions, "", stderr);
        assert!(matches!(err, E2eError::Timeout(name) if name == "visit:/login"));
    }

    #[test]
    fn test_unstructured_failure_is_playwright_error() {
        let err = classify_failure(&[], "", "Error: Cannot find module 'playwright'");
        assert!(matches!(err, E2eError::Playwright(msg) if msg.contains("Cannot find module")));
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("webkit".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("opera".parse::<Browser>().is_err());
    }
}
