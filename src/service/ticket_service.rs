// service/ticket_service.rs
use std::sync::Arc;

use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::{
    db::{db::DBClient, userdb::UserExt},
    dtos::ticketdtos::{AssignTicketDto, CreateComplaintTicketDto, TransferTicketDto, UpdateComplaintTicketDto},
    models::{
        ticketmodel::{ComplaintTicket, CustomerCategory, TicketPriority, TicketStatus},
        usermodel::UserRole,
    },
    service::error::ServiceError,
};

/// Orchestrates every ticket mutation. Each write pairs the ticket-row
/// statement with its audit entries on one transaction; a failed validation
/// aborts the whole operation with no partial state.
#[derive(Debug, Clone)]
pub struct TicketService {
    db_client: Arc<DBClient>,
}

/// Typed new value for one staged column, so the row update and the audit
/// entry are derived from the same staging step.
#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    OptText(Option<String>),
    Category(CustomerCategory),
    Priority(TicketPriority),
    Status(TicketStatus),
    OptUser(Option<i32>),
    OptTeam(Option<UserRole>),
}

#[derive(Debug, Clone, PartialEq)]
struct FieldChange {
    column: &'static str,
    label: &'static str,
    previous: Option<String>,
    new: Option<String>,
    value: FieldValue,
}

impl FieldChange {
    fn action(&self) -> String {
        format!("{}_changed", self.label.to_lowercase())
    }

    fn notes(&self) -> String {
        format!("{} updated", self.label)
    }
}

#[derive(Debug, PartialEq)]
enum ResolvedTransition {
    Set,
    Clear,
    Keep,
}

/// Compares every mutable field the update DTO carries against the stored
/// row. Each differing field goes through the single staging point below, so
/// a field can never be written without its audit entry.
fn staged_changes(current: &ComplaintTicket, dto: &UpdateComplaintTicketDto) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    let mut stage = |column: &'static str,
                     label: &'static str,
                     previous: Option<String>,
                     new: Option<String>,
                     value: FieldValue| {
        changes.push(FieldChange {
            column,
            label,
            previous,
            new,
            value,
        });
    };

    if let Some(v) = &dto.customer_id {
        if *v != current.customer_id {
            stage(
                "customer_id",
                "Customer ID",
                Some(current.customer_id.clone()),
                Some(v.clone()),
                FieldValue::Text(v.clone()),
            );
        }
    }
    if let Some(v) = &dto.customer_name {
        if *v != current.customer_name {
            stage(
                "customer_name",
                "Customer Name",
                Some(current.customer_name.clone()),
                Some(v.clone()),
                FieldValue::Text(v.clone()),
            );
        }
    }
    if let Some(v) = &dto.customer_address {
        if *v != current.customer_address {
            stage(
                "customer_address",
                "Customer Address",
                Some(current.customer_address.clone()),
                Some(v.clone()),
                FieldValue::Text(v.clone()),
            );
        }
    }
    if let Some(v) = dto.customer_category {
        if v != current.customer_category {
            stage(
                "customer_category",
                "Customer Category",
                Some(current.customer_category.to_str().to_string()),
                Some(v.to_str().to_string()),
                FieldValue::Category(v),
            );
        }
    }
    if let Some(v) = &dto.issue_description {
        if *v != current.issue_description {
            stage(
                "issue_description",
                "Issue Description",
                Some(current.issue_description.clone()),
                Some(v.clone()),
                FieldValue::Text(v.clone()),
            );
        }
    }
    if let Some(v) = dto.issue_priority {
        if v != current.issue_priority {
            stage(
                "issue_priority",
                "Issue Priority",
                Some(current.issue_priority.to_str().to_string()),
                Some(v.to_str().to_string()),
                FieldValue::Priority(v),
            );
        }
    }
    if let Some(v) = dto.status {
        if v != current.status {
            stage(
                "status",
                "Status",
                Some(current.status.to_str().to_string()),
                Some(v.to_str().to_string()),
                FieldValue::Status(v),
            );
        }
    }
    if let Some(v) = dto.assigned_to {
        if v != current.assigned_to {
            stage(
                "assigned_to",
                "Assigned To",
                current.assigned_to.map(|id| id.to_string()),
                v.map(|id| id.to_string()),
                FieldValue::OptUser(v),
            );
        }
    }
    if let Some(v) = dto.assigned_team {
        if v != current.assigned_team {
            stage(
                "assigned_team",
                "Assigned Team",
                current.assigned_team.map(|t| t.to_str().to_string()),
                v.map(|t| t.to_str().to_string()),
                FieldValue::OptTeam(v),
            );
        }
    }
    if let Some(v) = &dto.resolution_notes {
        if *v != current.resolution_notes {
            stage(
                "resolution_notes",
                "Resolution Notes",
                current.resolution_notes.clone(),
                v.clone(),
                FieldValue::OptText(v.clone()),
            );
        }
    }

    changes
}

/// `resolved_at` follows the status column: set on a transition into Solved,
/// cleared on a transition out of it, untouched otherwise.
fn resolved_transition(current: &ComplaintTicket, changes: &[FieldChange]) -> ResolvedTransition {
    let new_status = changes.iter().find_map(|c| match c.value {
        FieldValue::Status(status) => Some(status),
        _ => None,
    });

    match new_status {
        Some(TicketStatus::Solved) if current.status != TicketStatus::Solved => {
            ResolvedTransition::Set
        }
        Some(status) if status != TicketStatus::Solved && current.status == TicketStatus::Solved => {
            ResolvedTransition::Clear
        }
        _ => ResolvedTransition::Keep,
    }
}

/// Human-readable audit encoding of an assignment:
/// `"User ID: <id>, Team: <team>"`, `"Team: <team>"`, or nothing.
fn encode_assignment(assigned_to: Option<i32>, assigned_team: Option<UserRole>) -> Option<String> {
    match (assigned_to, assigned_team) {
        (Some(id), Some(team)) => Some(format!("User ID: {}, Team: {}", id, team.to_str())),
        (Some(id), None) => Some(format!("User ID: {}", id)),
        (None, Some(team)) => Some(format!("Team: {}", team.to_str())),
        (None, None) => None,
    }
}

impl TicketService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn create_complaint_ticket(
        &self,
        dto: CreateComplaintTicketDto,
    ) -> Result<ComplaintTicket, ServiceError> {
        let creator = self
            .db_client
            .get_user_by_id(dto.created_by)
            .await?
            .ok_or(ServiceError::UserNotFound(dto.created_by))?;

        if !creator.is_active {
            return Err(ServiceError::InactiveActor(creator.id));
        }

        let mut tx = self.db_client.pool.begin().await?;

        let ticket = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            INSERT INTO complaint_tickets
                (customer_id, customer_name, customer_address, customer_category,
                 issue_description, issue_priority, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(dto.customer_id)
        .bind(dto.customer_name)
        .bind(dto.customer_address)
        .bind(dto.customer_category)
        .bind(dto.issue_description)
        .bind(dto.issue_priority)
        .bind(TicketStatus::New)
        .bind(creator.id)
        .fetch_one(&mut *tx)
        .await?;

        Self::append_history(
            &mut tx,
            ticket.id,
            "created",
            None,
            Some(TicketStatus::New.to_str().to_string()),
            creator.id,
            Some(format!("Ticket created by {}", creator.username)),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(ticket_id = ticket.id, "complaint ticket created by {}", creator.username);
        Ok(ticket)
    }

    /// Partial update. Returns `Ok(None)` for an unknown ticket. A no-op
    /// update (nothing supplied, or all supplied values equal current state)
    /// returns the stored row untouched with zero audit entries.
    pub async fn update_complaint_ticket(
        &self,
        ticket_id: i32,
        dto: UpdateComplaintTicketDto,
    ) -> Result<Option<ComplaintTicket>, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let current = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            SELECT * FROM complaint_tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(ticket) => ticket,
            None => return Ok(None),
        };

        // Direct field edits only require the assignee to exist and be
        // active; the strict role-team coherence lives in assign_ticket.
        if let Some(Some(assignee_id)) = dto.assigned_to {
            let assignee = self.db_client.get_user_by_id(assignee_id).await?;
            if !matches!(&assignee, Some(user) if user.is_active) {
                return Err(ServiceError::InvalidAssignment(format!(
                    "User {} does not exist or is not active",
                    assignee_id
                )));
            }
        }

        let performer = self
            .db_client
            .get_user_by_id(dto.updated_by)
            .await?
            .ok_or(ServiceError::UserNotFound(dto.updated_by))?;

        let changes = staged_changes(&current, &dto);
        if changes.is_empty() {
            return Ok(Some(current));
        }

        let mut qb =
            QueryBuilder::<Postgres>::new("UPDATE complaint_tickets SET updated_at = NOW()");
        for change in &changes {
            qb.push(", ");
            qb.push(change.column);
            qb.push(" = ");
            match &change.value {
                FieldValue::Text(v) => qb.push_bind(v.clone()),
                FieldValue::OptText(v) => qb.push_bind(v.clone()),
                FieldValue::Category(v) => qb.push_bind(*v),
                FieldValue::Priority(v) => qb.push_bind(*v),
                FieldValue::Status(v) => qb.push_bind(*v),
                FieldValue::OptUser(v) => qb.push_bind(*v),
                FieldValue::OptTeam(v) => qb.push_bind(*v),
            };
        }
        match resolved_transition(&current, &changes) {
            ResolvedTransition::Set => {
                qb.push(", resolved_at = NOW()");
            }
            ResolvedTransition::Clear => {
                qb.push(", resolved_at = NULL");
            }
            ResolvedTransition::Keep => {}
        }
        qb.push(" WHERE id = ").push_bind(ticket_id);
        qb.push(" RETURNING *");

        let updated = qb
            .build_query_as::<ComplaintTicket>()
            .fetch_one(&mut *tx)
            .await?;

        for change in &changes {
            Self::append_history(
                &mut tx,
                ticket_id,
                &change.action(),
                change.previous.clone(),
                change.new.clone(),
                performer.id,
                Some(change.notes()),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            ticket_id,
            changes = changes.len(),
            "complaint ticket updated by {}",
            performer.username
        );
        Ok(Some(updated))
    }

    pub async fn assign_ticket(
        &self,
        ticket_id: i32,
        dto: AssignTicketDto,
    ) -> Result<ComplaintTicket, ServiceError> {
        let assigner = self
            .db_client
            .get_user_by_id(dto.assigned_by)
            .await?
            .ok_or(ServiceError::UserNotFound(dto.assigned_by))?;

        let mut tx = self.db_client.pool.begin().await?;

        let current = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            SELECT * FROM complaint_tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if let Some(assignee_id) = dto.assigned_to {
            let assignee = self.db_client.get_user_by_id(assignee_id).await?;
            let valid =
                matches!(&assignee, Some(user) if user.is_active && user.role == dto.assigned_team);
            if !valid {
                return Err(ServiceError::InvalidAssignment(format!(
                    "User {} is not an active member of team {}",
                    assignee_id,
                    dto.assigned_team.to_str()
                )));
            }
        }

        let previous = encode_assignment(current.assigned_to, current.assigned_team);

        let updated = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            UPDATE complaint_tickets
            SET assigned_to = $1, assigned_team = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(dto.assigned_to)
        .bind(dto.assigned_team)
        .bind(ticket_id)
        .fetch_one(&mut *tx)
        .await?;

        let action = if dto.assigned_to.is_some() {
            "assigned_to_user"
        } else {
            "assigned_to_team"
        };
        let new_value = encode_assignment(updated.assigned_to, updated.assigned_team);

        Self::append_history(
            &mut tx,
            ticket_id,
            action,
            previous,
            new_value,
            assigner.id,
            Some(format!("Assigned by {}", assigner.username)),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(ticket_id, "ticket assigned by {}", assigner.username);
        Ok(updated)
    }

    pub async fn transfer_ticket_to_team(
        &self,
        ticket_id: i32,
        dto: TransferTicketDto,
    ) -> Result<ComplaintTicket, ServiceError> {
        let target_team = UserRole::parse(&dto.target_team).ok_or_else(|| {
            ServiceError::InvalidArgument(format!("Unknown team name: {}", dto.target_team))
        })?;

        let transferrer = self
            .db_client
            .get_user_by_id(dto.transferred_by)
            .await?
            .ok_or(ServiceError::UserNotFound(dto.transferred_by))?;

        let mut tx = self.db_client.pool.begin().await?;

        let current = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            SELECT * FROM complaint_tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        let previous = encode_assignment(current.assigned_to, current.assigned_team)
            .unwrap_or_else(|| "Unassigned".to_string());

        let updated = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            UPDATE complaint_tickets
            SET assigned_to = NULL, assigned_team = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(target_team)
        .bind(ticket_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::append_history(
            &mut tx,
            ticket_id,
            "transferred_to_team",
            Some(previous),
            Some(format!("Team: {}", target_team.to_str())),
            transferrer.id,
            Some(format!("Transferred by {}", transferrer.username)),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            ticket_id,
            "ticket transferred to {} by {}",
            target_team.to_str(),
            transferrer.username
        );
        Ok(updated)
    }

    async fn append_history(
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: i32,
        action: &str,
        previous_value: Option<String>,
        new_value: Option<String>,
        performed_by: i32,
        notes: Option<String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ticket_history
                (ticket_id, action, previous_value, new_value, performed_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ticket_id)
        .bind(action)
        .bind(previous_value)
        .bind(new_value)
        .bind(performed_by)
        .bind(notes)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_ticket() -> ComplaintTicket {
        let now = Utc::now();
        ComplaintTicket {
            id: 1,
            customer_id: "CUST-001".to_string(),
            customer_name: "Acme Networks".to_string(),
            customer_address: "12 Fiber Lane".to_string(),
            customer_category: CustomerCategory::Broadband,
            issue_description: "Intermittent packet loss".to_string(),
            issue_priority: TicketPriority::Medium,
            status: TicketStatus::New,
            created_by: 10,
            assigned_to: None,
            assigned_team: None,
            resolution_notes: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn test_no_supplied_fields_stages_nothing() {
        let dto = UpdateComplaintTicketDto {
            updated_by: 10,
            ..Default::default()
        };
        assert!(staged_changes(&sample_ticket(), &dto).is_empty());
    }

    #[test]
    fn test_equal_values_stage_nothing() {
        let dto = UpdateComplaintTicketDto {
            status: Some(TicketStatus::New),
            issue_priority: Some(TicketPriority::Medium),
            customer_name: Some("Acme Networks".to_string()),
            updated_by: 10,
            ..Default::default()
        };
        assert!(staged_changes(&sample_ticket(), &dto).is_empty());
    }

    #[test]
    fn test_status_change_stages_display_strings() {
        let dto = UpdateComplaintTicketDto {
            status: Some(TicketStatus::Solved),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&sample_ticket(), &dto);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action(), "status_changed");
        assert_eq!(changes[0].notes(), "Status updated");
        assert_eq!(changes[0].previous.as_deref(), Some("New"));
        assert_eq!(changes[0].new.as_deref(), Some("Solved"));
    }

    #[test]
    fn test_priority_action_keeps_display_spacing() {
        let dto = UpdateComplaintTicketDto {
            issue_priority: Some(TicketPriority::High),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&sample_ticket(), &dto);
        assert_eq!(changes[0].action(), "issue priority_changed");
        assert_eq!(changes[0].notes(), "Issue Priority updated");
    }

    #[test]
    fn test_clearing_assignee_stages_null_new_value() {
        let mut current = sample_ticket();
        current.assigned_to = Some(7);
        current.assigned_team = Some(UserRole::TSO);

        let dto = UpdateComplaintTicketDto {
            assigned_to: Some(None),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&current, &dto);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column, "assigned_to");
        assert_eq!(changes[0].previous.as_deref(), Some("7"));
        assert_eq!(changes[0].new, None);
    }

    #[test]
    fn test_multiple_fields_stage_in_order() {
        let dto = UpdateComplaintTicketDto {
            status: Some(TicketStatus::InProgress),
            issue_priority: Some(TicketPriority::Critical),
            resolution_notes: Some(Some("escalated".to_string())),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&sample_ticket(), &dto);
        let actions: Vec<String> = changes.iter().map(|c| c.action()).collect();
        assert_eq!(
            actions,
            vec![
                "issue priority_changed".to_string(),
                "status_changed".to_string(),
                "resolution notes_changed".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolved_transition_set_and_clear() {
        let current = sample_ticket();
        let into_solved = UpdateComplaintTicketDto {
            status: Some(TicketStatus::Solved),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&current, &into_solved);
        assert_eq!(resolved_transition(&current, &changes), ResolvedTransition::Set);

        let mut solved = sample_ticket();
        solved.status = TicketStatus::Solved;
        solved.resolved_at = Some(Utc::now());
        let out_of_solved = UpdateComplaintTicketDto {
            status: Some(TicketStatus::InProgress),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&solved, &out_of_solved);
        assert_eq!(resolved_transition(&solved, &changes), ResolvedTransition::Clear);
    }

    #[test]
    fn test_resolved_transition_keeps_without_status_change() {
        let current = sample_ticket();
        let dto = UpdateComplaintTicketDto {
            customer_name: Some("New Name".to_string()),
            updated_by: 10,
            ..Default::default()
        };
        let changes = staged_changes(&current, &dto);
        assert_eq!(resolved_transition(&current, &changes), ResolvedTransition::Keep);
    }

    #[test]
    fn test_encode_assignment() {
        assert_eq!(
            encode_assignment(Some(3), Some(UserRole::TSO)).as_deref(),
            Some("User ID: 3, Team: TSO")
        );
        assert_eq!(
            encode_assignment(None, Some(UserRole::NOC)).as_deref(),
            Some("Team: NOC")
        );
        assert_eq!(encode_assignment(None, None), None);
    }
}
