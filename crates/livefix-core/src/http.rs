//! HTTP transport for the correction service.

use std::io;
use std::time::Duration;

use crate::service::{CorrectionRequest, CorrectionResponse, CorrectionService, ServiceFailure};
use crate::settings::ServiceSettings;

/// POSTs `{"text", "operation"}` as JSON to a fixed endpoint.
pub struct HttpCorrectionService {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpCorrectionService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self::new(
            settings.endpoint.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CorrectionService for HttpCorrectionService {
    fn correct(&self, request: &CorrectionRequest) -> Result<CorrectionResponse, ServiceFailure> {
        let body =
            serde_json::to_string(request).map_err(|e| ServiceFailure::Malformed(e.to_string()))?;
        tracing::debug!(endpoint = %self.endpoint, operation = %request.operation, "http: POST");
        let text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(failure_from)?
            .into_body()
            .read_to_string()
            .map_err(failure_from)?;
        serde_json::from_str(&text).map_err(|e| ServiceFailure::Malformed(e.to_string()))
    }
}

fn failure_from(err: ureq::Error) -> ServiceFailure {
    match err {
        ureq::Error::StatusCode(code) => ServiceFailure::Status(code),
        ureq::Error::Timeout(_) => ServiceFailure::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => ServiceFailure::Timeout,
        other => ServiceFailure::Network(other.to_string()),
    }
}
