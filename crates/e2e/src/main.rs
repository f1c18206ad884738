//! e2e-commands - run YAML E2E specs with the `login` and
//! `checkApiHealth` commands

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use e2e_commands::commands::{HealthBody, HealthCheckCommand};
use e2e_commands::driver::{BrowserDriver, RecordingDriver};
use e2e_commands::http::ReqwestClient;
use e2e_commands::playwright::{Browser, PlaywrightDriver};
use e2e_commands::server::ServerHandle;
use e2e_commands::{CommandSet, E2eConfig, E2eResult, FailureKind, TestRunner};

#[derive(Parser)]
#[command(name = "e2e-commands")]
#[command(about = "E2E test runner with login and API health-check commands")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "e2e.toml")]
    config: PathBuf,

    /// Base URL of the application under test
    #[arg(long, env = "E2E_BASE_URL")]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test specs
    Run {
        /// Path to test specs directory
        #[arg(short, long)]
        specs: Option<PathBuf>,

        /// Run only tests matching this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Run only a specific test by name
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Browser to use (chromium, firefox, webkit)
        #[arg(long)]
        browser: Option<String>,

        /// Record browser actions instead of driving a browser
        #[arg(long)]
        dry_run: bool,
    },

    /// Check the API health endpoint once
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = E2eConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(base_url) = cli.base_url {
        config.target.base_url = base_url;
    }
    config.validate()?;

    // Kept alive for the whole run; dropping it stops the server.
    let _server = match config.server.binary_path {
        Some(_) => {
            let server = ServerHandle::spawn(&config.server).await?;
            config.target.base_url = server.base_url().to_string();
            Some(server)
        }
        None => None,
    };

    let http = ReqwestClient::new(&config.target.base_url, config.target.request_timeout())?;

    match cli.command {
        Commands::Health => {
            let command = HealthCheckCommand::new(config.health.path.clone());
            health_outcome(command.path(), command.check(&http).await)
        }
        Commands::Run {
            specs,
            tag,
            name,
            output,
            browser,
            dry_run,
        } => {
            if let Some(specs) = specs {
                config.run.specs_dir = specs;
            }
            if let Some(output) = output {
                config.run.output_dir = output;
            }
            if let Some(browser) = browser {
                config.browser.browser = browser.parse::<Browser>()?;
            }

            let driver: Box<dyn BrowserDriver> = if dry_run {
                Box::new(RecordingDriver::new())
            } else {
                Box::new(PlaywrightDriver::new(&config.target.base_url, &config.browser)?)
            };

            let commands = CommandSet::with_defaults(&config);
            info!("Commands available: {}", commands.names().join(", "));

            let mut runner = TestRunner::new(commands, driver, Box::new(http), config.run.clone());

            let results = if let Some(name) = name {
                runner.run_test(&name).await?
            } else if let Some(tag) = tag {
                runner.run_tagged(&tag).await?
            } else {
                runner.run_all().await?
            };

            runner.write_results(&results)?;
            Ok(results.success())
        }
    }
}

/// A failed check is a failed test (exit 1); anything else is a harness
/// error (exit 2)
fn health_outcome(path: &str, result: E2eResult<HealthBody>) -> anyhow::Result<bool> {
    match result {
        Ok(body) => {
            info!("{} reports status '{}'", path, body.status);
            Ok(true)
        }
        Err(e) if e.kind() == FailureKind::ContractViolation => {
            error!("{} is not healthy: {}", path, e);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use e2e_commands::E2eError;

    #[test]
    fn test_health_outcome_exit_classes() {
        let healthy = Ok(HealthBody { status: "healthy".to_string() });
        assert!(health_outcome("/api/health", healthy).unwrap());

        let unhealthy = Err(E2eError::StatusMismatch { expected: 200, actual: 500 });
        assert!(!health_outcome("/api/health", unhealthy).unwrap());

        let misconfigured = Err(E2eError::Config("bad base_url".to_string()));
        assert!(health_outcome("/api/health", misconfigured).is_err());
    }
}
