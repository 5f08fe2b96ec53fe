use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::assignment::{Assignment, AssignmentRepo};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait AssignmentRepository {
    async fn get_assignment(&self, id: &Uuid) -> Result<Option<Assignment>, AppError>;

    /// The repository bound to one (owner, assignment) pair, if the student
    /// has one provisioned.
    async fn get_assignment_repo(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<AssignmentRepo>, AppError>;
}

#[async_trait]
impl AssignmentRepository for PostgresRepository {
    async fn get_assignment(&self, id: &Uuid) -> Result<Option<Assignment>, AppError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, course_id, name, ide_enabled, git_repo_required,
                   release_date, due_date, image, ide_options
            FROM assignment
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    async fn get_assignment_repo(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<AssignmentRepo>, AppError> {
        let repo = sqlx::query_as::<_, AssignmentRepo>(
            r#"
            SELECT id, owner_id, assignment_id, repo_url
            FROM assignment_repo
            WHERE owner_id = $1
              AND assignment_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(repo)
    }
}
