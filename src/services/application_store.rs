use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::application::{Application, NewApplication};

#[derive(Debug, Clone)]
pub struct ApplicationPage {
    pub applications: Vec<Application>,
    pub total: i64,
}

/// Durable home of accepted applications. Insert-only from the submission
/// side; there is deliberately no update or delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn save(&self, application: NewApplication) -> Result<Application>;

    /// Newest first. `page` is 1-based.
    async fn list(&self, page: i64, limit: i64) -> Result<ApplicationPage>;
}

#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn save(&self, application: NewApplication) -> Result<Application> {
        let row = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications
                (full_name, email, phone, position, availability, experience,
                 resume_path, consent, ip_hash, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, full_name, email, phone, position, availability, experience,
                      resume_path, consent, ip_hash, user_agent, created_at
            "#,
        )
        .bind(&application.full_name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.position)
        .bind(&application.availability)
        .bind(&application.experience)
        .bind(&application.resume_path)
        .bind(application.consent)
        .bind(&application.ip_hash)
        .bind(&application.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(row)
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ApplicationPage> {
        let offset = (page.max(1) - 1) * limit;
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, full_name, email, phone, position, availability, experience,
                   resume_path, consent, ip_hash, user_agent, created_at
            FROM applications
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;

        Ok(ApplicationPage {
            applications,
            total,
        })
    }
}
