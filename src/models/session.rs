use crate::models::assignment::ResourceLimits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

/// Display hint attached to status messages passed back to the frontend.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusVariant {
    Success,
    Warning,
    Error,
}

/// Orchestration phase of a session as last reported by the backend.
///
/// The backend reports an open set of phases; anything outside the three
/// settled phases means the session is still converging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Running,
    Ended,
    Failed,
    Other(String),
}

impl SessionState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Initializing" => SessionState::Initializing,
            "Running" => SessionState::Running,
            "Ended" => SessionState::Ended,
            "Failed" => SessionState::Failed,
            other => SessionState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SessionState::Initializing => "Initializing",
            SessionState::Running => "Running",
            SessionState::Ended => "Ended",
            SessionState::Failed => "Failed",
            SessionState::Other(raw) => raw,
        }
    }

    /// Settled phases are the only ones the frontend stops polling on.
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Ended | SessionState::Failed)
    }

    /// Fixed phase-to-message lookup. Ended intentionally carries no
    /// message; the loading flag alone communicates progress for every
    /// phase without an entry here.
    pub fn status_hint(&self) -> Option<(&'static str, StatusVariant)> {
        match self {
            SessionState::Running => Some(("Session is now ready.", StatusVariant::Success)),
            SessionState::Failed => Some(("Session failed to start. Please try again.", StatusVariant::Error)),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One IDE session row. The configuration snapshot columns (image through
/// credentials) are immutable after creation; only `active`, `state`,
/// `ended` and `data` change afterwards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub assignment_id: Uuid,
    pub course_id: Uuid,
    pub active: bool,
    pub state: String,
    pub created: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub image: String,
    pub resources: Json<ResourceLimits>,
    pub network_policy: String,
    pub network_locked: bool,
    pub repo_url: Option<String>,
    pub persistent_storage: bool,
    pub autosave: bool,
    pub privileged: bool,
    pub admin: bool,
    pub credentials: bool,
    pub data: Value,
}

impl IdeSession {
    pub fn view(&self) -> SessionView {
        SessionView::from(self)
    }
}

/// Client-facing projection of a session. Also the value stored in the
/// poll cache, so repeated polls within the TTL return identical payloads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub course_id: Uuid,
    pub active: bool,
    pub state: String,
    pub created: DateTime<Utc>,
    pub autosave: bool,
    pub persistent_storage: bool,
    pub repo_url: Option<String>,
    pub data: Value,
}

impl From<&IdeSession> for SessionView {
    fn from(session: &IdeSession) -> Self {
        SessionView {
            id: session.id,
            assignment_id: session.assignment_id,
            course_id: session.course_id,
            active: session.active,
            state: session.state.clone(),
            created: session.created,
            autosave: session.autosave,
            persistent_storage: session.persistent_storage,
            repo_url: session.repo_url.clone(),
            data: session.data.clone(),
        }
    }
}

/// Immutable configuration snapshot submitted to the orchestrator when a
/// session is created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSpec {
    pub session_id: Uuid,
    pub owner_id: Uuid,
    pub assignment_id: Uuid,
    pub course_id: Uuid,
    pub image: String,
    pub repo_url: Option<String>,
    pub network_locked: bool,
    pub network_policy: String,
    pub persistent_storage: bool,
    pub autosave: bool,
    pub resources: ResourceLimits,
    pub privileged: bool,
    pub admin: bool,
    pub credentials: bool,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct InitializeResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<StatusVariant>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AvailableResponse {
    pub session_available: bool,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct ActiveResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct StopResponse {
    pub status: String,
    pub variant: StatusVariant,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct PollResponse {
    pub loading: bool,
    pub session: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<StatusVariant>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct RedirectResponse {
    pub redirect: String,
}
