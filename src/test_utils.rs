use crate::auth::CurrentUser;
use crate::database::assignment::AssignmentRepository;
use crate::database::course::CourseRepository;
use crate::database::image::ImageRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::assignment::{Assignment, AssignmentRepo, DEFAULT_NETWORK_POLICY, IdeOptions, ResourceLimits};
use crate::models::image::IdeImage;
use crate::models::session::IdeSession;
use crate::orchestrator::{Orchestrator, StatusReport};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::types::Json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub struct MockRepository {
    pub sessions: Mutex<Vec<IdeSession>>,
    pub assignments: Vec<Assignment>,
    pub repos: Vec<AssignmentRepo>,
    /// (user_id, course_id) pairs with course-admin rights.
    pub admins: Vec<(Uuid, Uuid)>,
    pub images: Vec<IdeImage>,
}

#[async_trait::async_trait]
impl SessionRepository for MockRepository {
    async fn insert_session(&self, session: &IdeSession) -> Result<(), AppError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn find_active_session(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.owner_id == *owner_id && s.assignment_id == *assignment_id && s.active)
            .cloned())
    }

    async fn find_session_for_owner(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == *session_id && s.owner_id == *owner_id)
            .cloned())
    }

    async fn find_latest_inactive_session(&self, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.owner_id == *owner_id && !s.active)
            .max_by_key(|s| s.created)
            .cloned())
    }

    async fn count_active_sessions(&self) -> Result<i64, AppError> {
        Ok(self.sessions.lock().unwrap().iter().filter(|s| s.active).count() as i64)
    }

    async fn record_session_status(&self, session_id: &Uuid, state: &str, data: &Value) -> Result<(), AppError> {
        if let Some(session) = self.sessions.lock().unwrap().iter_mut().find(|s| s.id == *session_id) {
            session.state = state.to_string();
            session.data = data.clone();
        }
        Ok(())
    }

    async fn mark_session_ended(&self, session_id: &Uuid, ended: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(session) = self.sessions.lock().unwrap().iter_mut().find(|s| s.id == *session_id) {
            session.active = false;
            session.state = "Ended".to_string();
            session.ended = Some(ended);
        }
        Ok(())
    }

    async fn list_active_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<IdeSession>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.active && s.created < cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl AssignmentRepository for MockRepository {
    async fn get_assignment(&self, id: &Uuid) -> Result<Option<Assignment>, AppError> {
        Ok(self.assignments.iter().find(|a| a.id == *id).cloned())
    }

    async fn get_assignment_repo(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<AssignmentRepo>, AppError> {
        Ok(self
            .repos
            .iter()
            .find(|r| r.owner_id == *owner_id && r.assignment_id == *assignment_id)
            .cloned())
    }
}

#[async_trait::async_trait]
impl CourseRepository for MockRepository {
    async fn is_course_admin(&self, user_id: &Uuid, course_id: &Uuid) -> Result<bool, AppError> {
        Ok(self.admins.contains(&(*user_id, *course_id)))
    }
}

#[async_trait::async_trait]
impl ImageRepository for MockRepository {
    async fn list_public_images(&self) -> Result<Vec<IdeImage>, AppError> {
        Ok(self.images.iter().filter(|i| i.public).cloned().collect())
    }
}

/// Scriptable orchestrator double. Counters record how often the service
/// actually reached the backend.
pub struct MockOrchestrator {
    pub state: Mutex<String>,
    pub data: Mutex<Value>,
    pub reject_create: bool,
    pub create_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl Default for MockOrchestrator {
    fn default() -> Self {
        Self {
            state: Mutex::new("Initializing".to_string()),
            data: Mutex::new(serde_json::json!({})),
            reject_create: false,
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }
}

impl MockOrchestrator {
    pub fn with_state(state: &str) -> Self {
        let orchestrator = Self::default();
        *orchestrator.state.lock().unwrap() = state.to_string();
        orchestrator
    }

    pub fn set_state(&self, state: &str) {
        *self.state.lock().unwrap() = state.to_string();
    }

    fn report(&self) -> StatusReport {
        StatusReport {
            state: self.state.lock().unwrap().clone(),
            data: self.data.lock().unwrap().clone(),
        }
    }
}

#[async_trait::async_trait]
impl Orchestrator for MockOrchestrator {
    async fn create_session(&self, _spec: &crate::models::session::SessionSpec) -> Result<StatusReport, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_create {
            return Err(AppError::OrchestratorRejected("session capacity exhausted".to_string()));
        }
        Ok(self.report())
    }

    async fn fetch_status(&self, _session_id: &Uuid) -> Result<StatusReport, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.report())
    }

    async fn stop_session(&self, _session_id: &Uuid) -> Result<(), AppError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn sample_user() -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        username: "abc123".to_string(),
        git_username: Some("abc123".to_string()),
    }
}

pub fn sample_assignment() -> Assignment {
    Assignment {
        id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        name: "OS homework 1".to_string(),
        ide_enabled: true,
        git_repo_required: false,
        release_date: Utc::now() - Duration::days(1),
        due_date: Utc::now() + Duration::days(7),
        image: "registry.example.edu/ide-base:latest".to_string(),
        ide_options: Json(IdeOptions::default()),
    }
}

pub fn sample_session(owner_id: &Uuid, assignment: &Assignment) -> IdeSession {
    IdeSession {
        id: Uuid::new_v4(),
        owner_id: *owner_id,
        assignment_id: assignment.id,
        course_id: assignment.course_id,
        active: true,
        state: "Running".to_string(),
        created: Utc::now(),
        ended: None,
        image: assignment.image.clone(),
        resources: Json(ResourceLimits::default()),
        network_policy: DEFAULT_NETWORK_POLICY.to_string(),
        network_locked: true,
        repo_url: None,
        persistent_storage: true,
        autosave: true,
        privileged: false,
        admin: false,
        credentials: false,
        data: serde_json::json!({}),
    }
}
