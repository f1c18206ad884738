//! `login` command: fill in and submit the login form

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::{expect_args, Command, CommandContext};
use crate::driver::Action;
use crate::error::E2eResult;

/// Where the login form lives and how its elements are addressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginPage {
    pub path: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            path: "/login".to_string(),
            username_selector: "#username".to_string(),
            password_selector: "#password".to_string(),
            submit_selector: r#"button[type="submit"]"#.to_string(),
        }
    }
}

/// Username and password for one login; values are used exactly as given
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct LoginCommand {
    page: LoginPage,
}

impl LoginCommand {
    pub const NAME: &'static str = "login";

    pub fn new(page: LoginPage) -> Self {
        Self { page }
    }

    /// The actions that make up one login
    pub fn plan(&self, credentials: &Credentials) -> Vec<Action> {
        vec![
            Action::visit(&self.page.path),
            Action::type_into(&self.page.username_selector, &credentials.username),
            Action::type_into(&self.page.password_selector, &credentials.password),
            Action::click(&self.page.submit_selector),
        ]
    }

    pub async fn login(&self, ctx: &mut CommandContext<'_>, credentials: &Credentials) -> E2eResult<()> {
        info!(username = %credentials.username, path = %self.page.path, "Logging in");
        ctx.driver.perform(&self.plan(credentials)).await
    }
}

impl Default for LoginCommand {
    fn default() -> Self {
        Self::new(LoginPage::default())
    }
}

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> E2eResult<()> {
        expect_args(Self::NAME, args, 2)?;
        let credentials = Credentials::new(args[0].clone(), args[1].clone());
        self.login(ctx, &credentials).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RecordingDriver;
    use crate::error::E2eError;
    use crate::http::{HttpResponse, StubClient};

    const SUBMIT: &str = r#"button[type="submit"]"#;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_login_fills_form_and_submits_once() {
        let mut driver = RecordingDriver::new();
        let http = StubClient::new(HttpResponse::new(200, ""));
        let mut ctx = CommandContext::new(&mut driver, &http);

        LoginCommand::default()
            .run(&mut ctx, &args(&["alice", "secret"]))
            .await
            .unwrap();

        assert_eq!(driver.visits(), vec!["/login"]);
        assert_eq!(driver.typed_into("#username"), "alice");
        assert_eq!(driver.typed_into("#password"), "secret");
        assert_eq!(driver.clicks_on(SUBMIT), 1);
        assert_eq!(driver.batches(), 1);
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_comes_first_and_submit_last() {
        let mut driver = RecordingDriver::new();
        let http = StubClient::new(HttpResponse::new(200, ""));
        let mut ctx = CommandContext::new(&mut driver, &http);

        LoginCommand::default()
            .login(&mut ctx, &Credentials::new("bob", "pw"))
            .await
            .unwrap();

        let actions = driver.actions();
        assert_eq!(actions.first(), Some(&Action::visit("/login")));
        assert_eq!(actions.last(), Some(&Action::click(SUBMIT)));
    }

    #[test]
    fn test_values_are_not_transformed() {
        let plan = LoginCommand::default().plan(&Credentials::new("  Bob ", " p@ss word\t"));
        assert_eq!(plan[1], Action::type_into("#username", "  Bob "));
        assert_eq!(plan[2], Action::type_into("#password", " p@ss word\t"));
    }

    #[tokio::test]
    async fn test_missing_element_propagates() {
        let mut driver = RecordingDriver::with_elements(["#username", SUBMIT]);
        let http = StubClient::new(HttpResponse::new(200, ""));
        let mut ctx = CommandContext::new(&mut driver, &http);

        let err = LoginCommand::default()
            .run(&mut ctx, &args(&["alice", "secret"]))
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::ElementNotFound { selector } if selector == "#password"));
        assert_eq!(driver.clicks_on(SUBMIT), 0);
    }

    #[tokio::test]
    async fn test_wrong_arity_is_rejected() {
        let mut driver = RecordingDriver::new();
        let http = StubClient::new(HttpResponse::new(200, ""));
        let mut ctx = CommandContext::new(&mut driver, &http);

        let err = LoginCommand::default()
            .run(&mut ctx, &args(&["alice"]))
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::InvalidArguments { .. }));
        assert!(driver.actions().is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "secret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }
}
