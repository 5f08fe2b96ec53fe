use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRepository;
use crate::db::init_pool;
use crate::orchestrator::{HttpOrchestrator, Orchestrator};
use chrono::{Duration, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ReapResult {
    pub examined: usize,
    pub stopped: usize,
}

/// Stop active sessions older than the configured maximum age. Run from the
/// reaper binary on a schedule; sessions abandoned without an explicit stop
/// would otherwise hold their slot forever.
pub async fn reap_stale_sessions(config: &Config) -> Result<ReapResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let orchestrator = HttpOrchestrator::new(&config.ide);

    let cutoff = Utc::now() - Duration::hours(config.ide.max_session_age_hours as i64);
    let stale = repo
        .list_active_sessions_older_than(cutoff)
        .await
        .map_err(|err| format!("Failed to list stale sessions: {err:?}"))?;

    let examined = stale.len();
    let mut stopped = 0;
    for session in stale {
        repo.mark_session_ended(&session.id, Utc::now())
            .await
            .map_err(|err| format!("Failed to mark session {} ended: {err:?}", session.id))?;

        if let Err(err) = orchestrator.stop_session(&session.id).await {
            warn!(session_id = %session.id, error = ?err, "failed to enqueue teardown for stale session");
        }

        info!(session_id = %session.id, owner_id = %session.owner_id, created = %session.created, "reaped stale session");
        stopped += 1;
    }

    pool.close().await;

    Ok(ReapResult { examined, stopped })
}
