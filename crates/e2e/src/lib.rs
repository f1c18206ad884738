//! E2E test commands
//!
//! Reusable commands for end-to-end tests of a web application:
//! - `login` drives the UI login form through a browser driver
//! - `checkApiHealth` asserts the API health endpoint reports `healthy`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TestRunner                            │
//! │    ├── CommandSet (built at startup, injected)              │
//! │    │     ├── login(username, password)                      │
//! │    │     └── checkApiHealth()                               │
//! │    ├── BrowserDriver: PlaywrightDriver | RecordingDriver    │
//! │    └── HttpClient:    ReqwestClient    | StubClient         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── type { selector, text }                        │
//! │          ├── click { selector }                             │
//! │          ├── command { name, args }                         │
//! │          └── log { message }                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use commands::{Command, CommandContext, CommandSet};
pub use config::E2eConfig;
pub use error::{E2eError, E2eResult, FailureKind};
pub use runner::TestRunner;
pub use spec::{TestSpec, TestStep};
