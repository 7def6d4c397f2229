//! Business (storefront) Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storefront owned by a business-owner account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: Option<String>,
    /// Device token for order alerts, never exposed
    #[serde(skip_serializing, default)]
    pub push_token: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create business payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessCreate {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: Option<String>,
    pub push_token: Option<String>,
}

/// Search result for the nearby query
#[derive(Debug, Clone, Serialize)]
pub struct NearbyBusiness {
    #[serde(flatten)]
    pub business: Business,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_token_is_hidden() {
        let b = Business {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Panadería Sol".to_string(),
            description: None,
            address: "Calle 1".to_string(),
            latitude: 19.43,
            longitude: -99.13,
            category: Some("bakery".to_string()),
            push_token: Some("secret-device".to_string()),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(NearbyBusiness {
            business: b,
            distance_km: 1.5,
        })
        .unwrap();
        assert!(json.get("push_token").is_none());
        assert_eq!(json["distance_km"], 1.5);
        assert_eq!(json["name"], "Panadería Sol");
    }
}
