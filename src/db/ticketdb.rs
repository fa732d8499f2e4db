// db/ticketdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use super::db::DBClient;
use crate::models::ticketmodel::{ComplaintTicket, ComplaintTicketWithUsers, TicketStatus};
use crate::models::usermodel::UserRole;

/// Shared predicate over complaint tickets. Every query using it must alias
/// the tickets table as `t`. Range is half-open: `from <= created_at < to`.
#[derive(Debug, Default, Clone)]
pub struct TicketFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<TicketStatus>,
    pub team: Option<UserRole>,
    pub assigned_to: Option<i32>,
}

impl TicketFilter {
    pub fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        TicketFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE 1 = 1");
        if let Some(from) = self.from {
            qb.push(" AND t.created_at >= ").push_bind(from);
        }
        if let Some(to) = self.to {
            qb.push(" AND t.created_at < ").push_bind(to);
        }
        if let Some(status) = self.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(team) = self.team {
            qb.push(" AND t.assigned_team = ").push_bind(team);
        }
        if let Some(assigned_to) = self.assigned_to {
            qb.push(" AND t.assigned_to = ").push_bind(assigned_to);
        }
    }
}

#[async_trait]
pub trait TicketExt {
    async fn get_complaint_ticket(
        &self,
        ticket_id: i32,
    ) -> Result<Option<ComplaintTicket>, sqlx::Error>;

    async fn get_complaint_tickets(
        &self,
        filter: &TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ComplaintTicketWithUsers>, sqlx::Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn get_complaint_ticket(
        &self,
        ticket_id: i32,
    ) -> Result<Option<ComplaintTicket>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            SELECT * FROM complaint_tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_complaint_tickets(
        &self,
        filter: &TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ComplaintTicketWithUsers>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                t.*,
                c.username AS created_by_username,
                a.username AS assigned_to_username
            FROM complaint_tickets t
            JOIN users c ON t.created_by = c.id
            LEFT JOIN users a ON t.assigned_to = a.id
            "#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY t.created_at DESC");
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let tickets = qb
            .build_query_as::<ComplaintTicketWithUsers>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }
}
