use uuid::Uuid;

/// User row resolved from a valid session cookie.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub git_username: Option<String>,
}
