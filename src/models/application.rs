use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub availability: String,
    pub experience: String,
    pub resume_path: Option<String>,
    pub consent: bool,
    pub ip_hash: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// An accepted submission, ready to be written. The store assigns `id`
/// and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub availability: String,
    pub experience: String,
    pub resume_path: Option<String>,
    pub consent: bool,
    pub ip_hash: String,
    pub user_agent: String,
}

impl NewApplication {
    pub fn into_application(self, id: Uuid, created_at: DateTime<Utc>) -> Application {
        Application {
            id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            position: self.position,
            availability: self.availability,
            experience: self.experience,
            resume_path: self.resume_path,
            consent: self.consent,
            ip_hash: self.ip_hash,
            user_agent: self.user_agent,
            created_at,
        }
    }
}
