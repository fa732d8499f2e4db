use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::userdtos::FilterUserDto;
use crate::models::ticketmodel::{ComplaintTicket, CustomerCategory, TicketPriority, TicketStatus};
use crate::models::usermodel::UserRole;

#[derive(Validate, Debug, Deserialize)]
pub struct MonthlyReportQueryDto {
    #[validate(range(min = 2000, max = 2100, message = "Year is out of range"))]
    pub year: i32,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,

    pub team: Option<UserRole>,
}

/// Inclusive calendar-date range; the service widens `to` to the end of its day.
#[derive(Validate, Debug, Deserialize)]
pub struct DateRangeQueryDto {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub user_id: Option<i32>,
    pub team: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct TeamPerformanceQueryDto {
    pub team: Option<UserRole>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct StatusBreakdown {
    #[serde(rename = "New")]
    pub new: i64,
    #[serde(rename = "In Progress")]
    pub in_progress: i64,
    #[serde(rename = "Pending")]
    pub pending: i64,
    #[serde(rename = "Cancel")]
    pub cancel: i64,
    #[serde(rename = "Solved")]
    pub solved: i64,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: TicketStatus, count: i64) {
        match status {
            TicketStatus::New => self.new = count,
            TicketStatus::InProgress => self.in_progress = count,
            TicketStatus::Pending => self.pending = count,
            TicketStatus::Cancel => self.cancel = count,
            TicketStatus::Solved => self.solved = count,
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct TeamBreakdown {
    #[serde(rename = "CS")]
    pub cs: i64,
    #[serde(rename = "TSO")]
    pub tso: i64,
    #[serde(rename = "NOC")]
    pub noc: i64,
}

impl TeamBreakdown {
    pub fn record(&mut self, team: UserRole, count: i64) {
        match team {
            UserRole::CS => self.cs = count,
            UserRole::TSO => self.tso = count,
            UserRole::NOC => self.noc = count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_tickets: i64,
    pub by_status: StatusBreakdown,
    pub by_team: TeamBreakdown,
    pub unassigned_tickets: i64,
    pub overdue_tickets: i64,
    pub avg_resolution_hours: f64,
    pub created_today: i64,
    pub resolved_today: i64,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub user: FilterUserDto,
    pub assigned_tickets: i64,
    pub in_progress_tickets: i64,
    pub solved_tickets: i64,
    pub avg_resolution_hours: f64,
    pub recent_tickets: Vec<ComplaintTicket>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: TicketPriority,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: CustomerCategory,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub team: Option<UserRole>,
    pub total_tickets: i64,
    pub by_status: StatusBreakdown,
    pub resolution_rate: f64,
    pub avg_resolution_hours: f64,
    pub by_priority: Vec<PriorityCount>,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkloadRow {
    pub user_id: i32,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub total_handled: i64,
    pub resolved: i64,
    pub in_progress: i64,
    pub avg_resolution_hours: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct IssueTypeCount {
    pub label: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct IssueTypeAnalysis {
    pub by_category: Vec<IssueTypeCount>,
    pub by_priority: Vec<IssueTypeCount>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CustomerFrequencyRow {
    pub customer_id: String,
    pub customer_name: String,
    pub ticket_count: i64,
    pub last_ticket_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TeamPerformanceRow {
    pub team: UserRole,
    pub total_tickets: i64,
    pub resolved: i64,
    pub in_progress: i64,
    pub pending: i64,
    pub resolution_rate: f64,
    pub avg_resolution_hours: Option<f64>,
    pub efficiency_score: Option<f64>,
}
