//! Business (storefront) storage

use shared::models::Business;
use sqlx::PgPool;
use uuid::Uuid;

const BUSINESS_COLUMNS: &str = "id, owner_id, name, description, address, latitude, longitude, category, push_token, is_active, created_at, updated_at";

pub async fn create(pool: &PgPool, business: &Business) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO businesses (id, owner_id, name, description, address, latitude, longitude, category, push_token, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(business.id)
    .bind(business.owner_id)
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.address)
    .bind(business.latitude)
    .bind(business.longitude)
    .bind(&business.category)
    .bind(&business.push_token)
    .bind(business.is_active)
    .bind(business.created_at)
    .bind(business.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetch several businesses at once (order of the result is unspecified)
pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Business>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// All active businesses, for rebuilding the geo index
pub async fn list_active(pool: &PgPool) -> Result<Vec<Business>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE is_active"
    ))
    .fetch_all(pool)
    .await
}

pub async fn owner_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT owner_id FROM businesses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn push_token(pool: &PgPool, id: Uuid) -> Result<Option<String>, sqlx::Error> {
    let token: Option<Option<String>> =
        sqlx::query_scalar("SELECT push_token FROM businesses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(token.flatten())
}

pub async fn set_push_token(
    pool: &PgPool,
    id: Uuid,
    token: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE businesses SET push_token = $1, updated_at = $2 WHERE id = $3")
        .bind(token)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
