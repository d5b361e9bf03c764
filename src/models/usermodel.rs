use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Labor,
    Tractor,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Labor => "labor",
            UserRole::Tractor => "tractor",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Phone number used at registration.
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// `"first last"`, the way hired parties are shown on a requirement.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
}

/// Splits a registration full name on the first space.
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}
