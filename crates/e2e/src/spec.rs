//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::driver::Action;
use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a path (relative to base)
    Navigate { url: String },

    /// Type text into an element
    Type { selector: String, text: String },

    /// Click an element
    Click { selector: String },

    /// Invoke a registered command by name
    Command {
        name: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Log a message (for debugging)
    Log { message: String },
}

/// What a step asks the runner to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind<'a> {
    /// A browser action, batched with its neighbours
    Browser(Action),
    Command { name: &'a str, args: &'a [String] },
    Log(&'a str),
}

impl TestStep {
    pub fn kind(&self) -> StepKind<'_> {
        match self {
            TestStep::Navigate { url } => StepKind::Browser(Action::visit(url)),
            TestStep::Type { selector, text } => StepKind::Browser(Action::type_into(selector, text)),
            TestStep::Click { selector } => StepKind::Browser(Action::click(selector)),
            TestStep::Command { name, args } => StepKind::Command { name, args },
            TestStep::Log { message } => StepKind::Log(message),
        }
    }

    /// Short name used in results. Never includes typed text or arguments.
    pub fn name(&self) -> String {
        match self.kind() {
            StepKind::Browser(action) => action.name(),
            StepKind::Command { name, .. } => format!("command:{}", name),
            StepKind::Log(message) => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        if spec.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("test '{}' has no steps", spec.name)));
        }
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, sorted by path.
    ///
    /// A missing directory, an unreadable entry or a directory without any
    /// spec files is an error.
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::SpecParse(format!(
                "specs directory not found: {}",
                dir.display()
            )));
        }

        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_spec = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);

            if is_spec && entry.file_type().is_file() {
                specs.push(Self::from_file(entry.path())?);
            }
        }

        if specs.is_empty() {
            return Err(E2eError::SpecParse(format!(
                "no test specs in {}",
                dir.display()
            )));
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}
