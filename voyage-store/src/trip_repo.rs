use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use voyage_core::repository::{RepoResult, TripRepository};
use voyage_core::trip::{EmailTripFilter, NewTrip, Trip, TripChanges, EMAIL_SOURCE_PREFIX, SEARCH_SOURCE};

pub struct StoreTripRepository {
    pool: PgPool,
}

impl StoreTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: i32,
    name: String,
    destination: String,
    origin: Option<String>,
    budget: Option<i32>,
    source: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_booked: bool,
    created_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            name: row.name,
            destination: row.destination,
            origin: row.origin,
            budget: row.budget,
            start_date: row.start_date,
            end_date: row.end_date,
            source: row.source,
            is_booked: row.is_booked,
            created_at: row.created_at,
        }
    }
}

const TRIP_COLUMNS: &str =
    "id, name, destination, origin, budget, source, start_date, end_date, is_booked, created_at";

fn email_source_pattern() -> String {
    format!("{}%", EMAIL_SOURCE_PREFIX)
}

#[async_trait]
impl TripRepository for StoreTripRepository {
    async fn create_trip(&self, trip: &NewTrip) -> RepoResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO potential_trips (name, destination, origin, budget, source, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&trip.name)
        .bind(&trip.destination)
        .bind(&trip.origin)
        .bind(trip.budget)
        .bind(&trip.source)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_trip(&self, id: i32) -> RepoResult<Option<Trip>> {
        let row: Option<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM potential_trips WHERE id = $1",
            TRIP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Trip::from))
    }

    async fn update_trip(&self, id: i32, changes: &TripChanges) -> RepoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE potential_trips SET
                name = COALESCE($2, name),
                destination = COALESCE($3, destination),
                origin = COALESCE($4, origin),
                budget = COALESCE($5, budget),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.destination)
        .bind(&changes.origin)
        .bind(changes.budget)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_booked(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE potential_trips SET is_booked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_email_trips(&self, filter: &EmailTripFilter) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM potential_trips
            WHERE source LIKE $1
              AND is_booked = FALSE
              AND ($2::timestamptz IS NULL OR created_at > $2)
              AND ($3::int IS NULL OR id > $3)
            "#,
        )
        .bind(email_source_pattern())
        .bind(filter.since)
        .bind(filter.after_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn latest_email_trip(&self, filter: &EmailTripFilter) -> RepoResult<Option<Trip>> {
        let row: Option<TripRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM potential_trips
            WHERE source LIKE $1
              AND is_booked = FALSE
              AND ($2::timestamptz IS NULL OR created_at > $2)
              AND ($3::int IS NULL OR id > $3)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
            TRIP_COLUMNS
        ))
        .bind(email_source_pattern())
        .bind(filter.since)
        .bind(filter.after_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Trip::from))
    }

    async fn list_email_trips(&self, limit: i64) -> RepoResult<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM potential_trips
            WHERE source LIKE $1 AND is_booked = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
            TRIP_COLUMNS
        ))
        .bind(email_source_pattern())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn list_recent_searches(&self, limit: i64) -> RepoResult<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM potential_trips
            WHERE source = $1 AND is_booked = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
            TRIP_COLUMNS
        ))
        .bind(SEARCH_SOURCE)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }
}
