//! Named, reusable test commands
//!
//! A [`CommandSet`] is built once at startup and handed to the runner.
//! Test specs invoke commands by name; each invocation gets a
//! [`CommandContext`] borrowing the run's browser driver and HTTP client.

pub mod health;
pub mod login;

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::E2eConfig;
use crate::driver::BrowserDriver;
use crate::error::{E2eError, E2eResult};
use crate::http::HttpClient;

pub use health::{HealthBody, HealthCheckCommand};
pub use login::{Credentials, LoginCommand, LoginPage};

/// Collaborators a command may use during one invocation
pub struct CommandContext<'a> {
    pub driver: &'a mut dyn BrowserDriver,
    pub http: &'a dyn HttpClient,
}

impl<'a> CommandContext<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver, http: &'a dyn HttpClient) -> Self {
        Self { driver, http }
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Name the command is invoked by
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> E2eResult<()>;
}

/// Registry of commands available to test specs
#[derive(Default)]
pub struct CommandSet {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command set with `login` and `checkApiHealth` registered
    pub fn with_defaults(config: &E2eConfig) -> Self {
        let mut set = Self::new();
        let defaults: [Box<dyn Command>; 2] = [
            Box::new(LoginCommand::new(config.login.clone())),
            Box::new(HealthCheckCommand::new(config.health.path.clone())),
        ];
        for command in defaults {
            set.commands.insert(command.name().to_string(), command);
        }
        set
    }

    /// Add a command; a name can only be registered once
    pub fn register(&mut self, command: Box<dyn Command>) -> E2eResult<()> {
        let name = command.name().to_string();
        if self.commands.contains_key(&name) {
            return Err(E2eError::DuplicateCommand(name));
        }
        debug!("Registered command '{}'", name);
        self.commands.insert(name, command);
        Ok(())
    }

    /// Replace an already registered command
    pub fn overwrite(&mut self, command: Box<dyn Command>) -> E2eResult<()> {
        let name = command.name().to_string();
        match self.commands.get_mut(&name) {
            Some(slot) => {
                debug!("Overwrote command '{}'", name);
                *slot = command;
                Ok(())
            }
            None => Err(E2eError::UnknownCommand(name)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a command by name
    pub async fn invoke(
        &self,
        name: &str,
        ctx: &mut CommandContext<'_>,
        args: &[String],
    ) -> E2eResult<()> {
        let command = self
            .get(name)
            .ok_or_else(|| E2eError::UnknownCommand(name.to_string()))?;

        info!("Running command '{}'", name);
        command.run(ctx, args).await
    }
}

/// Ensure a command received exactly `expected` arguments
pub(crate) fn expect_args(command: &str, args: &[String], expected: usize) -> E2eResult<()> {
    if args.len() != expected {
        return Err(E2eError::InvalidArguments {
            command: command.to_string(),
            reason: format!("expected {} argument(s), got {}", expected, args.len()),
        });
    }
    Ok(())
}
