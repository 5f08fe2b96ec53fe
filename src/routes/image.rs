use crate::auth::CurrentUser;
use crate::database::image::ImageRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::image::ImageResponse;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;
use sqlx::PgPool;

/// List the IDE images available for self-service sessions.
#[openapi(tag = "Images")]
#[get("/")]
pub async fn list_images(pool: &State<PgPool>, _current_user: CurrentUser) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let images = repo.list_public_images().await?;
    Ok(Json(images.iter().map(ImageResponse::from).collect()))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_images]
}
