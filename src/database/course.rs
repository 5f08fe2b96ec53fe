use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait CourseRepository {
    /// Whether the user is a TA/professor/superuser for the course. Course
    /// admins bypass release-date and grace-window gating.
    async fn is_course_admin(&self, user_id: &Uuid, course_id: &Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl CourseRepository for PostgresRepository {
    async fn is_course_admin(&self, user_id: &Uuid, course_id: &Uuid) -> Result<bool, AppError> {
        let admin: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM course_admin
                WHERE user_id = $1
                  AND course_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(admin)
    }
}
