// src/models/usermodel.rs
use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    CS,
    TSO,
    NOC,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::CS, UserRole::TSO, UserRole::NOC];

    pub fn to_str(&self) -> &str {
        match self {
            UserRole::CS => "CS",
            UserRole::TSO => "TSO",
            UserRole::NOC => "NOC",
        }
    }

    pub fn parse(value: &str) -> Option<UserRole> {
        match value.to_uppercase().as_str() {
            "CS" => Some(UserRole::CS),
            "TSO" => Some(UserRole::TSO),
            "NOC" => Some(UserRole::NOC),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("TSO"), Some(UserRole::TSO));
        assert_eq!(UserRole::parse("noc"), Some(UserRole::NOC));
        assert_eq!(UserRole::parse("helpdesk"), None);
        assert_eq!(UserRole::parse(""), None);
    }

    #[test]
    fn test_role_to_str() {
        assert_eq!(UserRole::CS.to_str(), "CS");
        assert_eq!(UserRole::NOC.to_str(), "NOC");
    }
}
