//! `checkApiHealth` command: assert the API reports itself healthy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{expect_args, Command, CommandContext};
use crate::error::{E2eError, E2eResult};
use crate::http::{HttpClient, HttpResponse};

const EXPECTED_STATUS: u16 = 200;
const HEALTHY: &str = "healthy";

/// Expected shape of the health endpoint's body. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

impl HealthBody {
    /// Decode a raw body, reporting which part of the schema is not met
    pub fn decode(body: &[u8]) -> E2eResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| E2eError::InvalidBody(format!("not JSON: {}", e)))?;

        let Some(object) = value.as_object() else {
            return Err(E2eError::InvalidBody(format!("expected a JSON object, got {}", value)));
        };

        match object.get("status") {
            None => Err(E2eError::MissingProperty {
                property: "status".to_string(),
            }),
            Some(serde_json::Value::String(status)) => Ok(Self {
                status: status.clone(),
            }),
            Some(other) => Err(E2eError::PropertyMismatch {
                property: "status".to_string(),
                expected: HEALTHY.to_string(),
                actual: other.to_string(),
            }),
        }
    }
}

pub struct HealthCheckCommand {
    path: String,
}

impl HealthCheckCommand {
    pub const NAME: &'static str = "checkApiHealth";

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Issue one request and validate it. No retries.
    pub async fn check(&self, http: &dyn HttpClient) -> E2eResult<HealthBody> {
        let response = http.get(&self.path).await?;
        let body = verify(&response)?;
        info!(path = %self.path, status = %body.status, "API is healthy");
        Ok(body)
    }
}

impl Default for HealthCheckCommand {
    fn default() -> Self {
        Self::new("/api/health")
    }
}

/// Status first, then body schema, then the field value
fn verify(response: &HttpResponse) -> E2eResult<HealthBody> {
    if response.status != EXPECTED_STATUS {
        warn!("Health check returned {}", response.status);
        return Err(E2eError::StatusMismatch {
            expected: EXPECTED_STATUS,
            actual: response.status,
        });
    }

    let body = HealthBody::decode(&response.body)?;
    if body.status != HEALTHY {
        return Err(E2eError::PropertyMismatch {
            property: "status".to_string(),
            expected: HEALTHY.to_string(),
            actual: body.status,
        });
    }

    Ok(body)
}

#[async_trait]
impl Command for HealthCheckCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> E2eResult<()> {
        expect_args(Self::NAME, args, 0)?;
        self.check(ctx.http).await.map(|_| ())
    }
}
