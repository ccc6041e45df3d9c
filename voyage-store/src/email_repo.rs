use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use voyage_core::email::{Email, NewEmail};
use voyage_core::repository::{EmailRepository, RepoResult};

pub struct StoreEmailRepository {
    pool: PgPool,
}

impl StoreEmailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EmailRow {
    id: i32,
    subject: String,
    body: String,
    sender_email: String,
    recipient_email: String,
    is_read: bool,
    folder: String,
    sent_at: DateTime<Utc>,
}

#[async_trait]
impl EmailRepository for StoreEmailRepository {
    async fn create_email(&self, email: &NewEmail) -> RepoResult<Email> {
        // sent_at falls back to the column default when not supplied
        let row: EmailRow = sqlx::query_as(
            r#"
            INSERT INTO emails (subject, body, sender_email, recipient_email, folder, is_read, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING id, subject, body, sender_email, recipient_email, is_read, folder, sent_at
            "#,
        )
        .bind(&email.subject)
        .bind(&email.body)
        .bind(&email.sender_email)
        .bind(&email.recipient_email)
        .bind(&email.folder)
        .bind(email.is_read)
        .bind(email.sent_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Email {
            id: row.id,
            subject: row.subject,
            body: row.body,
            sender_email: row.sender_email,
            recipient_email: row.recipient_email,
            is_read: row.is_read,
            folder: row.folder,
            sent_at: row.sent_at,
        })
    }
}
