use crate::auth::CurrentUser;
use crate::cache::PollCache;
use crate::config::IdeConfig;
use crate::database::assignment::AssignmentRepository;
use crate::database::course::CourseRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::assignment::ADMIN_NETWORK_POLICY;
use crate::models::session::{IdeSession, SessionSpec, SessionView, StatusVariant};
use crate::orchestrator::Orchestrator;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::types::Json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Students may still start sessions for this long after the due date.
const DUE_DATE_GRACE_DAYS: i64 = 21;

/// Result of an initialization request. Soft declines are successful at the
/// transport level; they carry a status message instead of a session.
#[derive(Debug)]
pub enum InitializeOutcome {
    /// The caller already had an active session for this assignment; it is
    /// returned unchanged and nothing was submitted to the backend.
    Existing(SessionView),
    Created(SessionView),
    Declined { status: String, variant: StatusVariant },
}

/// The IDE session lifecycle manager: decides whether a session may start,
/// creates and polls it, and tears it down.
pub struct IdeService<'a, R> {
    repo: &'a R,
    orchestrator: Arc<dyn Orchestrator>,
    cache: Arc<PollCache>,
    config: IdeConfig,
}

impl<'a, R> IdeService<'a, R>
where
    R: SessionRepository + AssignmentRepository + CourseRepository + Sync,
{
    pub fn new(repo: &'a R, orchestrator: Arc<dyn Orchestrator>, cache: Arc<PollCache>, config: IdeConfig) -> Self {
        Self {
            repo,
            orchestrator,
            cache,
            config,
        }
    }

    /// Current count of active sessions against the configured ceiling.
    /// This is a pre-check only; the orchestrator re-verifies capacity at
    /// submit time and its rejection wins.
    pub async fn available(&self) -> Result<(i64, i64), AppError> {
        let active_count = self.repo.count_active_sessions().await?;
        Ok((active_count, i64::from(self.config.max_sessions)))
    }

    pub async fn initialize(
        &self,
        assignment_id: &Uuid,
        user: &CurrentUser,
        autosave: bool,
        persistent_storage: bool,
    ) -> Result<InitializeOutcome, AppError> {
        let assignment = self
            .repo
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("assignment does not exist".to_string()))?;

        if !assignment.ide_enabled {
            return Err(AppError::BadRequest("IDEs are not enabled for this assignment".to_string()));
        }

        // An existing active session short-circuits initialization; the
        // client gets it back unchanged.
        if let Some(active) = self.repo.find_active_session(&user.id, assignment_id).await? {
            return Ok(InitializeOutcome::Existing(active.view()));
        }

        // The last session's home volume needs time to unmount before a new
        // session can safely reattach it.
        if let Some(last) = self.repo.find_latest_inactive_session(&user.id).await?
            && last.persistent_storage
            && let Some(ended) = last.ended
        {
            let elapsed = Utc::now().signed_duration_since(ended);
            if elapsed < ChronoDuration::seconds(self.config.volume_cooldown_seconds as i64) {
                return Ok(InitializeOutcome::Declined {
                    status: "Please wait a few more seconds. Your last IDE's home volume is still unmounting.".to_string(),
                    variant: StatusVariant::Warning,
                });
            }
        }

        let (active_count, max_count) = self.available().await?;
        if active_count >= max_count {
            return Ok(InitializeOutcome::Declined {
                status: "No IDE slots are free right now. Please try again in a few minutes.".to_string(),
                variant: StatusVariant::Warning,
            });
        }

        let is_admin = self.repo.is_course_admin(&user.id, &assignment.course_id).await?;
        let now = Utc::now();

        if !is_admin {
            if assignment.release_date > now {
                return Err(AppError::BadRequest("Assignment has not been released".to_string()));
            }

            if assignment.due_date + ChronoDuration::days(DUE_DATE_GRACE_DAYS) <= now {
                return Ok(InitializeOutcome::Declined {
                    status: "Assignment due date passed over 3 weeks ago. IDEs are disabled.".to_string(),
                    variant: StatusVariant::Error,
                });
            }
        }

        let mut repo_url: Option<String> = None;
        if assignment.git_repo_required {
            if user.git_username.is_none() {
                return Err(AppError::BadRequest(
                    "Please link your git account on the profile page".to_string(),
                ));
            }

            let repo = self.repo.get_assignment_repo(&user.id, assignment_id).await?.ok_or_else(|| {
                AppError::BadRequest(
                    "Could not find your assignment repo. Please make sure your git username is set and is correct.".to_string(),
                )
            })?;
            repo_url = Some(repo.repo_url);
        }

        // Snapshot the assignment-level options; an issued session never
        // observes later edits to the assignment.
        let options = assignment.ide_options.0.clone();
        let network_policy = if is_admin {
            ADMIN_NETWORK_POLICY.to_string()
        } else {
            options.network_policy
        };

        let spec = SessionSpec {
            session_id: Uuid::new_v4(),
            owner_id: user.id,
            assignment_id: assignment.id,
            course_id: assignment.course_id,
            image: assignment.image.clone(),
            repo_url,
            network_locked: !is_admin,
            network_policy,
            persistent_storage,
            autosave,
            resources: options.resources,
            privileged: false,
            admin: is_admin,
            credentials: is_admin,
        };

        // Submit before persisting: a failed submit must not leave a
        // half-created record behind.
        let report = self.orchestrator.create_session(&spec).await?;

        let session = IdeSession {
            id: spec.session_id,
            owner_id: spec.owner_id,
            assignment_id: spec.assignment_id,
            course_id: spec.course_id,
            active: true,
            state: report.state,
            created: now,
            ended: None,
            image: spec.image,
            resources: Json(spec.resources),
            network_policy: spec.network_policy,
            network_locked: spec.network_locked,
            repo_url: spec.repo_url,
            persistent_storage: spec.persistent_storage,
            autosave: spec.autosave,
            privileged: spec.privileged,
            admin: spec.admin,
            credentials: spec.credentials,
            data: report.data,
        };
        self.repo.insert_session(&session).await?;

        info!(
            session_id = %session.id,
            owner_id = %user.id,
            assignment_id = %assignment.id,
            admin = is_admin,
            "ide session created"
        );

        Ok(InitializeOutcome::Created(session.view()))
    }

    pub async fn active_session(&self, assignment_id: &Uuid, user: &CurrentUser) -> Result<Option<SessionView>, AppError> {
        let session = self.repo.find_active_session(&user.id, assignment_id).await?;
        Ok(session.map(|s| s.view()))
    }

    /// Cached view of a session's live state. Within the TTL, repeated
    /// polls return the identical payload without touching the backend.
    pub async fn poll(&self, session_id: &Uuid, user: &CurrentUser) -> Result<SessionView, AppError> {
        let key = (*session_id, user.id);
        if let Some(view) = self.cache.get(&key).await {
            return Ok(view);
        }

        let session = self
            .repo
            .find_session_for_owner(session_id, &user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("session does not exist".to_string()))?;

        // Ended sessions are served from the store; the backend may still
        // be tearing the environment down and would report a stale phase.
        if !session.active {
            return Ok(session.view());
        }

        let report = self.orchestrator.fetch_status(session_id).await?;
        self.repo.record_session_status(session_id, &report.state, &report.data).await?;

        let mut view = session.view();
        view.state = report.state;
        view.data = report.data;

        self.cache
            .set_with_ttl(key, view.clone(), Duration::from_secs(self.config.poll_cache_ttl_seconds))
            .await;

        Ok(view)
    }

    /// Mark a session ended and hand teardown to the orchestrator. The
    /// lookup is owner-scoped but not active-scoped, so a repeated stop
    /// succeeds and re-timestamps `ended`.
    pub async fn stop(&self, session_id: &Uuid, user: &CurrentUser) -> Result<(), AppError> {
        let session = self
            .repo
            .find_session_for_owner(session_id, &user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("session does not exist".to_string()))?;

        self.repo.mark_session_ended(&session.id, Utc::now()).await?;

        // Fire-and-forget: the response does not wait for teardown, and the
        // orchestrator reclaims partially-created resources on its own.
        let orchestrator = Arc::clone(&self.orchestrator);
        let id = session.id;
        tokio::spawn(async move {
            if let Err(err) = orchestrator.stop_session(&id).await {
                warn!(session_id = %id, error = ?err, "failed to enqueue session teardown");
            }
        });

        // Drop the cached view so the next poll reports Ended instead of a
        // stale running state for the remainder of the TTL.
        self.cache.invalidate(&(session.id, user.id)).await;

        info!(session_id = %session.id, owner_id = %user.id, "ide session stopped");
        Ok(())
    }

    pub async fn redirect_target(&self, session_id: &Uuid, user: &CurrentUser) -> Result<String, AppError> {
        let session = self
            .repo
            .find_session_for_owner(session_id, &user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("session does not exist".to_string()))?;

        Ok(format!(
            "{}/ide/{}/?user={}",
            self.config.proxy_url.trim_end_matches('/'),
            session.id,
            user.username
        ))
    }
}
