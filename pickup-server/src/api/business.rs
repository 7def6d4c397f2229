//! Business endpoints: register, lookup, nearby search

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Business, BusinessCreate, NearbyBusiness, PushTokenUpdate, UserRole};
use shared::util::now_millis;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::Identity;
use crate::db;
use crate::geo::{DEFAULT_RADIUS_KM, MAX_RESULTS, valid_coordinates};
use crate::state::AppState;

use super::{ApiResult, verify_business};

/// Upper bound on the search radius
const MAX_RADIUS_KM: f64 = 50.0;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_create(req: &BusinessCreate) -> Result<(), AppError> {
    let name_len = req.name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(AppError::validation("name must be 2 to 100 characters"));
    }
    if req.address.trim().is_empty() {
        return Err(AppError::validation("address is required"));
    }
    if !valid_coordinates(req.latitude, req.longitude) {
        return Err(AppError::validation("latitude/longitude out of range"));
    }
    Ok(())
}

/// POST /api/v1/businesses
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<BusinessCreate>,
) -> Result<(StatusCode, Json<Business>), AppError> {
    identity.require_role(UserRole::BusinessOwner)?;
    validate_create(&req)?;

    let now = now_millis();
    let business = Business {
        id: Uuid::new_v4(),
        owner_id: identity.user_id,
        name: req.name.trim().to_string(),
        description: non_empty(req.description),
        address: req.address.trim().to_string(),
        latitude: req.latitude,
        longitude: req.longitude,
        category: non_empty(req.category),
        push_token: non_empty(req.push_token),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    db::businesses::create(&state.pool, &business)
        .await
        .map_err(|e| {
            tracing::error!("DB error creating business: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    state.geo.upsert(
        business.id,
        business.latitude,
        business.longitude,
        business.category.clone(),
    );
    tracing::info!(
        business_id = %business.id,
        owner_id = %identity.user_id,
        owner_email = %identity.email,
        "Business registered"
    );

    Ok((StatusCode::CREATED, Json(business)))
}

/// GET /api/v1/businesses/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Business> {
    let business = db::businesses::find_by_id(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Business query error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;

    Ok(Json(business))
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub category: Option<String>,
}

/// GET /api/v1/businesses/nearby?lat=..&lng=..&radius=..&category=..
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<serde_json::Value> {
    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(AppError::validation("query params 'lat' and 'lng' are required"));
    };
    if lat == 0.0 && lng == 0.0 {
        return Err(AppError::validation("query params 'lat' and 'lng' are required"));
    }
    if !valid_coordinates(lat, lng) {
        return Err(AppError::validation("latitude/longitude out of range"));
    }

    let radius = match query.radius {
        Some(r) if r.is_finite() && r > 0.0 => r.min(MAX_RADIUS_KM),
        _ => DEFAULT_RADIUS_KM,
    };
    let category = non_empty(query.category);

    let hits = state
        .geo
        .nearby(lat, lng, radius, MAX_RESULTS, category.as_deref());
    let ids: Vec<Uuid> = hits.iter().map(|(id, _)| *id).collect();

    let mut by_id: HashMap<Uuid, Business> = db::businesses::find_by_ids(&state.pool, &ids)
        .await
        .map_err(|e| {
            tracing::error!("Nearby business query error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    // Keep the index order (nearest first); skip anything deactivated since indexing
    let data: Vec<NearbyBusiness> = hits
        .into_iter()
        .filter_map(|(id, distance_km)| {
            by_id
                .remove(&id)
                .filter(|b| b.is_active)
                .map(|business| NearbyBusiness {
                    business,
                    distance_km: (distance_km * 100.0).round() / 100.0,
                })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": data.len(),
        "data": data,
    })))
}

/// PUT /api/v1/businesses/{id}/push-token
pub async fn update_push_token(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<PushTokenUpdate>,
) -> ApiResult<serde_json::Value> {
    identity.require_role(UserRole::BusinessOwner)?;
    verify_business(&state, id, identity.user_id).await?;

    let token = non_empty(req.push_token);
    db::businesses::set_push_token(&state.pool, id, token.as_deref(), now_millis())
        .await
        .map_err(|e| {
            tracing::error!("DB error updating business push token: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    Ok(Json(serde_json::json!({ "updated": true })))
}
