//! Browser driver abstraction
//!
//! Commands describe UI work as a batch of [`Action`]s and hand it to a
//! [`BrowserDriver`]. A batch runs in order in a single page; a driver is
//! free to start a fresh page for the next batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{E2eError, E2eResult};

/// One browser primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Navigate to a path relative to the base URL
    Visit { path: String },

    /// Type text into an element, keystroke by keystroke
    Type { selector: String, text: String },

    /// Click an element
    Click { selector: String },
}

impl Action {
    pub fn visit(path: impl Into<String>) -> Self {
        Action::Visit { path: path.into() }
    }

    pub fn type_into(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Action::Type {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Action::Click {
            selector: selector.into(),
        }
    }

    /// Selector this action targets, if any
    pub fn selector(&self) -> Option<&str> {
        match self {
            Action::Visit { .. } => None,
            Action::Type { selector, .. } | Action::Click { selector } => Some(selector),
        }
    }

    /// Short name used in logs and step results. Never includes typed text.
    pub fn name(&self) -> String {
        match self {
            Action::Visit { path } => format!("visit:{}", path),
            Action::Type { selector, .. } => format!("type:{}", selector),
            Action::Click { selector } => format!("click:{}", selector),
        }
    }
}

#[async_trait]
pub trait BrowserDriver: Send {
    /// Perform a batch of actions in order, failing on the first one that fails
    async fn perform(&mut self, actions: &[Action]) -> E2eResult<()>;
}

/// In-memory driver that records every action it performs.
///
/// With [`RecordingDriver::with_elements`] the driver only knows the listed
/// selectors and fails like a real browser would for anything else.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    actions: Vec<Action>,
    batches: usize,
    elements: Option<HashSet<String>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: Some(selectors.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Everything typed into `selector`, concatenated
    pub fn typed_into(&self, selector: &str) -> String {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Type { selector: s, text } if s == selector => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Click { selector: s } if s == selector))
            .count()
    }

    pub fn visits(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Visit { path } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BrowserDriver for RecordingDriver {
    async fn perform(&mut self, actions: &[Action]) -> E2eResult<()> {
        self.batches += 1;
        for action in actions {
            if let (Some(elements), Some(selector)) = (&self.elements, action.selector()) {
                if !elements.contains(selector) {
                    return Err(E2eError::ElementNotFound {
                        selector: selector.to_string(),
                    });
                }
            }
            self.actions.push(action.clone());
        }
        Ok(())
    }
}
