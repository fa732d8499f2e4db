// src/models/ticketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::usermodel::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Pending,
    Cancel,
    Solved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::Pending,
        TicketStatus::Cancel,
        TicketStatus::Solved,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Pending => "Pending",
            TicketStatus::Cancel => "Cancel",
            TicketStatus::Solved => "Solved",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Critical,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "customer_category", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum CustomerCategory {
    Broadband,
    Dedicated,
    Reseller,
}

impl CustomerCategory {
    pub const ALL: [CustomerCategory; 3] = [
        CustomerCategory::Broadband,
        CustomerCategory::Dedicated,
        CustomerCategory::Reseller,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            CustomerCategory::Broadband => "broadband",
            CustomerCategory::Dedicated => "dedicated",
            CustomerCategory::Reseller => "reseller",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComplaintTicket {
    pub id: i32,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_category: CustomerCategory,
    pub issue_description: String,
    pub issue_priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: i32,
    pub assigned_to: Option<i32>,
    pub assigned_team: Option<UserRole>,
    pub resolution_notes: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,

    #[serde(rename = "resolvedAt")]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComplaintTicketWithUsers {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: ComplaintTicket,
    pub created_by_username: String,
    pub assigned_to_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketHistory {
    pub id: i32,
    pub ticket_id: i32,
    pub action: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub performed_by: i32,
    pub notes: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketHistoryWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: TicketHistory,
    pub performed_by_username: String,
    pub performed_by_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_strings() {
        assert_eq!(TicketStatus::New.to_str(), "New");
        assert_eq!(TicketStatus::InProgress.to_str(), "In Progress");
        assert_eq!(TicketStatus::Cancel.to_str(), "Cancel");
    }

    #[test]
    fn test_status_serde_matches_display() {
        for status in TicketStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.to_str()));
        }
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&CustomerCategory::Broadband).unwrap();
        assert_eq!(json, "\"broadband\"");
    }
}
