use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::ticketmodel::{CustomerCategory, TicketPriority, TicketStatus};
use crate::models::usermodel::UserRole;

/// Distinguishes an absent field from an explicit `null`: absent leaves the
/// column untouched, `null` clears it.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateComplaintTicketDto {
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub customer_id: String,

    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub customer_name: String,

    #[validate(length(min = 1, max = 500, message = "Customer address is required"))]
    pub customer_address: String,

    pub customer_category: CustomerCategory,

    #[validate(length(min = 1, max = 2000, message = "Issue description is required"))]
    pub issue_description: String,

    pub issue_priority: TicketPriority,

    pub created_by: i32,
}

#[derive(Validate, Debug, Default, Clone, Deserialize)]
pub struct UpdateComplaintTicketDto {
    #[validate(length(min = 1, max = 50, message = "Customer id cannot be empty"))]
    pub customer_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Customer name cannot be empty"))]
    pub customer_name: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Customer address cannot be empty"))]
    pub customer_address: Option<String>,

    pub customer_category: Option<CustomerCategory>,

    #[validate(length(min = 1, max = 2000, message = "Issue description cannot be empty"))]
    pub issue_description: Option<String>,

    pub issue_priority: Option<TicketPriority>,

    pub status: Option<TicketStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_team: Option<Option<UserRole>>,

    #[serde(default, deserialize_with = "double_option")]
    pub resolution_notes: Option<Option<String>>,

    pub updated_by: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignTicketDto {
    pub assigned_to: Option<i32>,
    pub assigned_team: UserRole,
    pub assigned_by: i32,
}

#[derive(Validate, Debug, Clone, Deserialize)]
pub struct TransferTicketDto {
    #[validate(length(min = 1, message = "Target team is required"))]
    pub target_team: String,
    pub transferred_by: i32,
}

#[derive(Validate, Debug, Deserialize)]
pub struct TicketListQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i32>,

    pub status: Option<TicketStatus>,
    pub team: Option<UserRole>,
    pub assigned_to: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_absent_vs_null_assignee() {
        let absent: UpdateComplaintTicketDto =
            serde_json::from_str(r#"{"updated_by": 1}"#).unwrap();
        assert_eq!(absent.assigned_to, None);

        let null: UpdateComplaintTicketDto =
            serde_json::from_str(r#"{"assigned_to": null, "updated_by": 1}"#).unwrap();
        assert_eq!(null.assigned_to, Some(None));

        let set: UpdateComplaintTicketDto =
            serde_json::from_str(r#"{"assigned_to": 7, "updated_by": 1}"#).unwrap();
        assert_eq!(set.assigned_to, Some(Some(7)));
    }

    #[test]
    fn test_update_dto_status_display_name() {
        let dto: UpdateComplaintTicketDto =
            serde_json::from_str(r#"{"status": "In Progress", "updated_by": 1}"#).unwrap();
        assert_eq!(dto.status, Some(TicketStatus::InProgress));
    }
}
