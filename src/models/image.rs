use serde::Serialize;
use schemars::JsonSchema;
use uuid::Uuid;

/// A compute image students can get an IDE session on.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeImage {
    pub id: Uuid,
    pub image: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub public: bool,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub image: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl From<&IdeImage> for ImageResponse {
    fn from(image: &IdeImage) -> Self {
        ImageResponse {
            id: image.id,
            image: image.image.clone(),
            title: image.title.clone(),
            description: image.description.clone(),
            icon: image.icon.clone(),
        }
    }
}
