// db/historydb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::ticketmodel::TicketHistoryWithUser;

#[async_trait]
pub trait HistoryExt {
    /// All audit entries for a ticket, newest first, with the performer's
    /// display fields joined in. Unknown tickets yield an empty vec.
    async fn get_ticket_history(
        &self,
        ticket_id: i32,
    ) -> Result<Vec<TicketHistoryWithUser>, sqlx::Error>;
}

#[async_trait]
impl HistoryExt for DBClient {
    async fn get_ticket_history(
        &self,
        ticket_id: i32,
    ) -> Result<Vec<TicketHistoryWithUser>, sqlx::Error> {
        let entries = sqlx::query_as::<_, TicketHistoryWithUser>(
            r#"
            SELECT
                h.*,
                u.username AS performed_by_username,
                u.full_name AS performed_by_name
            FROM ticket_history h
            JOIN users u ON h.performed_by = u.id
            WHERE h.ticket_id = $1
            ORDER BY h.created_at DESC, h.id DESC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
