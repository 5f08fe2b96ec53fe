use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::image::IdeImage;
use async_trait::async_trait;

#[async_trait]
pub trait ImageRepository {
    async fn list_public_images(&self) -> Result<Vec<IdeImage>, AppError>;
}

#[async_trait]
impl ImageRepository for PostgresRepository {
    async fn list_public_images(&self) -> Result<Vec<IdeImage>, AppError> {
        let images = sqlx::query_as::<_, IdeImage>(
            r#"
            SELECT id, image, title, description, icon, public
            FROM ide_image
            WHERE public
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}
