use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::IdeConfig;
use crate::error::app_error::AppError;
use crate::models::session::SessionSpec;

/// State report for one session as the orchestrator sees it. `data` is the
/// connection/status detail passed through to clients untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: String,
    #[serde(default)]
    pub data: Value,
}

/// Contract this API expects from the platform that actually provisions and
/// destroys compute environments. Scheduling, networking and storage are
/// its problem; we only submit, observe and request teardown.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Submit session creation. Returns once the request is accepted, with
    /// the initial phase; readiness is observed through `fetch_status`.
    /// Capacity rejection here is authoritative over any pre-check.
    async fn create_session(&self, spec: &SessionSpec) -> Result<StatusReport, AppError>;

    async fn fetch_status(&self, session_id: &Uuid) -> Result<StatusReport, AppError>;

    /// Request teardown. Reclaims partially-created resources too, so it is
    /// legal for sessions that never finished converging.
    async fn stop_session(&self, session_id: &Uuid) -> Result<(), AppError>;
}

/// Client for the orchestrator's internal HTTP API.
pub struct HttpOrchestrator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrchestrator {
    pub fn new(config: &IdeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.orchestrator_url.trim_end_matches('/').to_string(),
        }
    }

    fn session_url(&self, session_id: &Uuid) -> String {
        format!("{}/sessions/{}", self.base_url, session_id)
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn create_session(&self, spec: &SessionSpec) -> Result<StatusReport, AppError> {
        let url = format!("{}/sessions", self.base_url);
        let response = self.client.post(&url).json(spec).send().await?;

        // The orchestrator re-checks capacity at submit time; a conflict
        // here overrides whatever the capacity pre-check said.
        if response.status() == reqwest::StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_else(|_| "capacity exhausted".to_string());
            return Err(AppError::OrchestratorRejected(message));
        }

        let report = response.error_for_status()?.json::<StatusReport>().await?;
        Ok(report)
    }

    async fn fetch_status(&self, session_id: &Uuid) -> Result<StatusReport, AppError> {
        let response = self.client.get(self.session_url(session_id)).send().await?;
        let report = response.error_for_status()?.json::<StatusReport>().await?;
        Ok(report)
    }

    async fn stop_session(&self, session_id: &Uuid) -> Result<(), AppError> {
        let response = self.client.delete(self.session_url(session_id)).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_report_data_defaults_to_null() {
        let report: StatusReport = serde_json::from_str(r#"{"state": "Initializing"}"#).unwrap();
        assert_eq!(report.state, "Initializing");
        assert_eq!(report.data, Value::Null);
    }

    #[test]
    fn session_url_joins_cleanly() {
        let config = IdeConfig {
            orchestrator_url: "http://orchestrator.internal/".to_string(),
            ..IdeConfig::default()
        };
        let orchestrator = HttpOrchestrator::new(&config);
        let id = Uuid::nil();
        assert_eq!(
            orchestrator.session_url(&id),
            format!("http://orchestrator.internal/sessions/{}", id)
        );
    }
}
