//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "user_role", rename_all = "snake_case"))]
pub enum UserRole {
    Customer,
    BusinessOwner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::BusinessOwner => "business_owner",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing, default)]
    pub push_token: Option<String>,
    pub created_at: i64,
}

/// Register or clear a device token for push notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTokenUpdate {
    pub push_token: Option<String>,
}
