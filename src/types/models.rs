use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A row of the permission catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    pub user_id: String,
    pub permission_id: String,
    pub permission: String,
    pub is_granted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A school campus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffPosition {
    Director,
    Coordinator,
    Secretary,
    Teacher,
}

impl StaffPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StaffPosition::Director => "director",
            StaffPosition::Coordinator => "coordinator",
            StaffPosition::Secretary => "secretary",
            StaffPosition::Teacher => "teacher",
        }
    }

    pub fn parse(s: &str) -> Option<StaffPosition> {
        match s {
            "director" => Some(StaffPosition::Director),
            "coordinator" => Some(StaffPosition::Coordinator),
            "secretary" => Some(StaffPosition::Secretary),
            "teacher" => Some(StaffPosition::Teacher),
            _ => None,
        }
    }

    /// Role given to the login account of a staff member in this position.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            StaffPosition::Director | StaffPosition::Coordinator => Role::Director,
            StaffPosition::Secretary => Role::Secretary,
            StaffPosition::Teacher => Role::Teacher,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub user_id: String,
    pub unit_id: String,
    pub name: String,
    pub position: StaffPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub unit_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentFilter {
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}
