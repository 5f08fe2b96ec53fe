use crate::auth::CurrentUser;
use crate::cache::PollCache;
use crate::config::IdeConfig;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::{
    ActiveResponse, AvailableResponse, InitializeResponse, PollResponse, RedirectResponse, SessionState, StatusVariant, StopResponse,
};
use crate::orchestrator::Orchestrator;
use crate::service::ide::{IdeService, InitializeOutcome};
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[allow(clippy::result_large_err)]
fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::uuid(format!("Invalid {} id", what), e))
}

fn build_service<'a>(
    repo: &'a PostgresRepository,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
) -> IdeService<'a, PostgresRepository> {
    IdeService::new(
        repo,
        Arc::clone(orchestrator.inner()),
        Arc::clone(cache.inner()),
        ide_config.inner().clone(),
    )
}

/// Start an IDE session for an assignment, or return the one already
/// running. A decline (cooldown, capacity, past the grace window) is a 200
/// with `active: false` and a status message for the client to display.
#[openapi(tag = "IDE")]
#[post("/initialize/<assignment_id>?<autosave>&<persistent_storage>")]
pub async fn initialize(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    current_user: CurrentUser,
    assignment_id: &str,
    autosave: Option<bool>,
    persistent_storage: Option<bool>,
) -> Result<Json<InitializeResponse>, AppError> {
    let assignment_uuid = parse_id(assignment_id, "assignment")?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);

    let outcome = service
        .initialize(
            &assignment_uuid,
            &current_user,
            autosave.unwrap_or(true),
            persistent_storage.unwrap_or(true),
        )
        .await?;

    let response = match outcome {
        InitializeOutcome::Existing(session) => InitializeResponse {
            active: true,
            session: Some(session),
            status: None,
            variant: None,
        },
        InitializeOutcome::Created(session) => InitializeResponse {
            active: true,
            session: Some(session),
            status: Some("Session created".to_string()),
            variant: None,
        },
        InitializeOutcome::Declined { status, variant } => InitializeResponse {
            active: false,
            session: None,
            status: Some(status),
            variant: Some(variant),
        },
    };
    Ok(Json(response))
}

/// Whether a new session could be admitted right now. Advisory only; the
/// answer can be stale by the time the client calls initialize.
#[openapi(tag = "IDE")]
#[get("/available")]
pub async fn available(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    _current_user: CurrentUser,
) -> Result<Json<AvailableResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);
    let (active_count, max_count) = service.available().await?;
    Ok(Json(AvailableResponse {
        session_available: active_count < max_count,
    }))
}

/// The caller's active session for an assignment, if any.
#[openapi(tag = "IDE")]
#[get("/active/<assignment_id>")]
pub async fn active(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    current_user: CurrentUser,
    assignment_id: &str,
) -> Result<Json<ActiveResponse>, AppError> {
    let assignment_uuid = parse_id(assignment_id, "assignment")?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);
    let session = service.active_session(&assignment_uuid, &current_user).await?;
    Ok(Json(ActiveResponse {
        active: session.is_some(),
        session,
    }))
}

/// Poll a session's provisioning state. `loading` stays true until the
/// backend reports a settled phase.
#[openapi(tag = "IDE")]
#[get("/poll/<session_id>")]
pub async fn poll(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    current_user: CurrentUser,
    session_id: &str,
) -> Result<Json<PollResponse>, AppError> {
    let session_uuid = parse_id(session_id, "session")?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);
    let session = service.poll(&session_uuid, &current_user).await?;

    let state = SessionState::parse(&session.state);
    let loading = !state.is_settled();
    let (status, variant) = match state.status_hint() {
        Some((status, variant)) => (Some(status.to_string()), Some(variant)),
        None => (None, None),
    };

    Ok(Json(PollResponse {
        loading,
        session,
        status,
        variant,
    }))
}

/// Stop a session. Teardown happens asynchronously; the response confirms
/// the session was marked ended.
#[openapi(tag = "IDE")]
#[get("/stop/<session_id>")]
pub async fn stop(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    current_user: CurrentUser,
    session_id: &str,
) -> Result<Json<StopResponse>, AppError> {
    let session_uuid = parse_id(session_id, "session")?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);
    service.stop(&session_uuid, &current_user).await?;
    Ok(Json(StopResponse {
        status: "Session stopped.".to_string(),
        variant: StatusVariant::Warning,
    }))
}

/// URL the client should open to reach the session through the proxy.
#[openapi(tag = "IDE")]
#[get("/redirect-url/<session_id>")]
pub async fn redirect_url(
    pool: &State<PgPool>,
    orchestrator: &State<Arc<dyn Orchestrator>>,
    cache: &State<Arc<PollCache>>,
    ide_config: &State<IdeConfig>,
    current_user: CurrentUser,
    session_id: &str,
) -> Result<Json<RedirectResponse>, AppError> {
    let session_uuid = parse_id(session_id, "session")?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = build_service(&repo, orchestrator, cache, ide_config);
    let redirect = service.redirect_target(&session_uuid, &current_user).await?;
    Ok(Json(RedirectResponse { redirect }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![initialize, available, active, poll, stop, redirect_url]
}

#[cfg(test)]
mod tests {
    use super::parse_id;
    use crate::error::app_error::AppError;

    #[test]
    fn parse_id_rejects_garbage() {
        let result = parse_id("not-a-uuid", "session");
        assert!(matches!(result, Err(AppError::UuidError { .. })));
    }

    #[test]
    fn parse_id_accepts_canonical_uuids() {
        assert!(parse_id("b9bbcf1e-4c49-4d41-9c3d-1b8e0b7a9f00", "assignment").is_ok());
    }
}
