// service/report_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::{db::DBClient, ticketdb::TicketFilter, userdb::UserExt},
    dtos::{
        reportdtos::{
            CategoryCount, CustomerFrequencyRow, DashboardMetrics, IssueTypeAnalysis,
            IssueTypeCount, MonthlyReport, PriorityCount, StatusBreakdown, TeamBreakdown,
            TeamPerformanceRow, UserDashboard, WorkloadRow,
        },
        userdtos::FilterUserDto,
    },
    models::{
        ticketmodel::{ComplaintTicket, TicketStatus},
        usermodel::UserRole,
    },
    service::error::ServiceError,
};

/// Read-only aggregates over ticket snapshots. No history writes, no locks
/// held across queries; a report stitched from several queries may observe
/// interleaved writes, which is acceptable for reporting.
#[derive(Debug, Clone)]
pub struct ReportService {
    db_client: Arc<DBClient>,
}

#[derive(sqlx::FromRow)]
struct DashboardTotalsRow {
    total_tickets: i64,
    unassigned_tickets: i64,
    overdue_tickets: i64,
    avg_resolution_hours: Option<f64>,
    created_today: i64,
    resolved_today: i64,
}

#[derive(sqlx::FromRow)]
struct UserTotalsRow {
    assigned_tickets: i64,
    in_progress_tickets: i64,
    solved_tickets: i64,
    avg_resolution_hours: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct RangeTotalsRow {
    total_tickets: i64,
    resolved: i64,
    avg_resolution_hours: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct TeamPerformanceRawRow {
    team: UserRole,
    total_tickets: i64,
    resolved: i64,
    in_progress: i64,
    pending: i64,
    avg_resolution_hours: Option<f64>,
}

impl ReportService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ServiceError> {
        let overdue_cutoff = Utc::now() - Duration::hours(24);
        let (today_start, today_end) = local_day_bounds(Local::now().date_naive());

        let totals = sqlx::query_as::<_, DashboardTotalsRow>(
            r#"
            SELECT
                COUNT(*) AS total_tickets,
                COUNT(*) FILTER (WHERE t.assigned_to IS NULL) AS unassigned_tickets,
                COUNT(*) FILTER (
                    WHERE t.issue_priority IN ('high', 'critical')
                      AND t.created_at < $1
                      AND t.status NOT IN ('solved', 'cancel')
                ) AS overdue_tickets,
                (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0)
                    FILTER (WHERE t.status = 'solved' AND t.resolved_at IS NOT NULL)
                )::double precision AS avg_resolution_hours,
                COUNT(*) FILTER (WHERE t.created_at >= $2 AND t.created_at < $3) AS created_today,
                COUNT(*) FILTER (WHERE t.resolved_at >= $2 AND t.resolved_at < $3) AS resolved_today
            FROM complaint_tickets t
            "#,
        )
        .bind(overdue_cutoff)
        .bind(today_start)
        .bind(today_end)
        .fetch_one(&self.db_client.pool)
        .await?;

        let status_rows = sqlx::query_as::<_, (TicketStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM complaint_tickets
            GROUP BY status
            "#,
        )
        .fetch_all(&self.db_client.pool)
        .await?;

        let mut by_status = StatusBreakdown::default();
        for (status, count) in status_rows {
            by_status.record(status, count);
        }

        let team_rows = sqlx::query_as::<_, (UserRole, i64)>(
            r#"
            SELECT assigned_team, COUNT(*)
            FROM complaint_tickets
            WHERE assigned_team IS NOT NULL
            GROUP BY assigned_team
            "#,
        )
        .fetch_all(&self.db_client.pool)
        .await?;

        let mut by_team = TeamBreakdown::default();
        for (team, count) in team_rows {
            by_team.record(team, count);
        }

        Ok(DashboardMetrics {
            total_tickets: totals.total_tickets,
            by_status,
            by_team,
            unassigned_tickets: totals.unassigned_tickets,
            overdue_tickets: totals.overdue_tickets,
            avg_resolution_hours: totals.avg_resolution_hours.unwrap_or(0.0),
            created_today: totals.created_today,
            resolved_today: totals.resolved_today,
        })
    }

    pub async fn user_dashboard(&self, user_id: i32) -> Result<UserDashboard, ServiceError> {
        let user = self
            .db_client
            .get_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let totals = sqlx::query_as::<_, UserTotalsRow>(
            r#"
            SELECT
                COUNT(*) AS assigned_tickets,
                COUNT(*) FILTER (WHERE t.status = 'in_progress') AS in_progress_tickets,
                COUNT(*) FILTER (WHERE t.status = 'solved') AS solved_tickets,
                (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0)
                    FILTER (WHERE t.status = 'solved' AND t.resolved_at IS NOT NULL)
                )::double precision AS avg_resolution_hours
            FROM complaint_tickets t
            WHERE t.assigned_to = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_client.pool)
        .await?;

        let recent_tickets = sqlx::query_as::<_, ComplaintTicket>(
            r#"
            SELECT * FROM complaint_tickets
            WHERE assigned_to = $1
            ORDER BY created_at DESC
            LIMIT 10
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_client.pool)
        .await?;

        Ok(UserDashboard {
            user: FilterUserDto::filter_user(&user),
            assigned_tickets: totals.assigned_tickets,
            in_progress_tickets: totals.in_progress_tickets,
            solved_tickets: totals.solved_tickets,
            avg_resolution_hours: totals.avg_resolution_hours.unwrap_or(0.0),
            recent_tickets,
        })
    }

    pub async fn monthly_report(
        &self,
        year: i32,
        month: u32,
        team: Option<UserRole>,
    ) -> Result<MonthlyReport, ServiceError> {
        let (from, to) = month_bounds(year, month).ok_or_else(|| {
            ServiceError::InvalidArgument(format!("Invalid year/month: {}-{}", year, month))
        })?;

        let filter = TicketFilter {
            from: Some(from),
            to: Some(to),
            team,
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COUNT(*) AS total_tickets,
                COUNT(*) FILTER (WHERE t.status = 'solved') AS resolved,
                (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0)
                    FILTER (WHERE t.status = 'solved' AND t.resolved_at IS NOT NULL)
                )::double precision AS avg_resolution_hours
            FROM complaint_tickets t
            "#,
        );
        filter.push_conditions(&mut qb);
        let totals = qb
            .build_query_as::<RangeTotalsRow>()
            .fetch_one(&self.db_client.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.status, COUNT(*) FROM complaint_tickets t",
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.status");
        let status_rows = qb
            .build_query_as::<(TicketStatus, i64)>()
            .fetch_all(&self.db_client.pool)
            .await?;

        let mut by_status = StatusBreakdown::default();
        for (status, count) in status_rows {
            by_status.record(status, count);
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.issue_priority AS priority, COUNT(*) AS count FROM complaint_tickets t",
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.issue_priority ORDER BY count DESC");
        let by_priority = qb
            .build_query_as::<PriorityCount>()
            .fetch_all(&self.db_client.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.customer_category AS category, COUNT(*) AS count FROM complaint_tickets t",
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.customer_category ORDER BY count DESC");
        let by_category = qb
            .build_query_as::<CategoryCount>()
            .fetch_all(&self.db_client.pool)
            .await?;

        Ok(MonthlyReport {
            year,
            month,
            team,
            total_tickets: totals.total_tickets,
            by_status,
            resolution_rate: resolution_rate(totals.resolved, totals.total_tickets),
            avg_resolution_hours: totals.avg_resolution_hours.unwrap_or(0.0),
            by_priority,
            by_category,
        })
    }

    pub async fn workload_stats(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_id: Option<i32>,
        team: Option<UserRole>,
    ) -> Result<Vec<WorkloadRow>, ServiceError> {
        let (start, end) = date_range_bounds(from, to);
        let filter = TicketFilter {
            from: Some(start),
            to: Some(end),
            team,
            assigned_to: user_id,
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.full_name,
                u.role,
                COUNT(t.id) AS total_handled,
                COUNT(*) FILTER (WHERE t.status = 'solved') AS resolved,
                COUNT(*) FILTER (WHERE t.status = 'in_progress') AS in_progress,
                (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0)
                    FILTER (WHERE t.status = 'solved' AND t.resolved_at IS NOT NULL)
                )::double precision AS avg_resolution_hours
            FROM complaint_tickets t
            JOIN users u ON t.assigned_to = u.id
            "#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY u.id, u.username, u.full_name, u.role");
        qb.push(" ORDER BY total_handled DESC");

        let rows = qb
            .build_query_as::<WorkloadRow>()
            .fetch_all(&self.db_client.pool)
            .await?;

        Ok(rows)
    }

    pub async fn issue_type_analysis(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<IssueTypeAnalysis, ServiceError> {
        let (start, end) = date_range_bounds(from, to);
        let filter = TicketFilter::range(start, end);

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.customer_category AS category, COUNT(*) AS count FROM complaint_tickets t",
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.customer_category ORDER BY count DESC");
        let category_rows = qb
            .build_query_as::<CategoryCount>()
            .fetch_all(&self.db_client.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.issue_priority AS priority, COUNT(*) AS count FROM complaint_tickets t",
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.issue_priority ORDER BY count DESC");
        let priority_rows = qb
            .build_query_as::<PriorityCount>()
            .fetch_all(&self.db_client.pool)
            .await?;

        Ok(IssueTypeAnalysis {
            by_category: percentages(
                category_rows
                    .into_iter()
                    .map(|row| (row.category.to_str().to_string(), row.count))
                    .collect(),
            ),
            by_priority: percentages(
                priority_rows
                    .into_iter()
                    .map(|row| (row.priority.to_str().to_string(), row.count))
                    .collect(),
            ),
        })
    }

    pub async fn customer_frequency(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CustomerFrequencyRow>, ServiceError> {
        let (start, end) = date_range_bounds(from, to);
        let filter = TicketFilter::range(start, end);

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                t.customer_id,
                t.customer_name,
                COUNT(*) AS ticket_count,
                MAX(t.created_at) AS last_ticket_at
            FROM complaint_tickets t
            "#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY t.customer_id, t.customer_name");
        qb.push(" HAVING COUNT(*) > 1");
        qb.push(" ORDER BY ticket_count DESC, last_ticket_at DESC");

        let rows = qb
            .build_query_as::<CustomerFrequencyRow>()
            .fetch_all(&self.db_client.pool)
            .await?;

        Ok(rows)
    }

    pub async fn team_performance(
        &self,
        team: Option<UserRole>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TeamPerformanceRow>, ServiceError> {
        let filter = TicketFilter {
            from: from.map(local_day_start),
            to: to.map(|day| local_day_bounds(day).1),
            team,
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                t.assigned_team AS team,
                COUNT(*) AS total_tickets,
                COUNT(*) FILTER (WHERE t.status = 'solved') AS resolved,
                COUNT(*) FILTER (WHERE t.status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE t.status = 'pending') AS pending,
                (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0)
                    FILTER (WHERE t.status = 'solved' AND t.resolved_at IS NOT NULL)
                )::double precision AS avg_resolution_hours
            FROM complaint_tickets t
            "#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" AND t.assigned_team IS NOT NULL");
        qb.push(" GROUP BY t.assigned_team ORDER BY total_tickets DESC");

        let rows = qb
            .build_query_as::<TeamPerformanceRawRow>()
            .fetch_all(&self.db_client.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TeamPerformanceRow {
                team: row.team,
                total_tickets: row.total_tickets,
                resolved: row.resolved,
                in_progress: row.in_progress,
                pending: row.pending,
                resolution_rate: resolution_rate(row.resolved, row.total_tickets),
                efficiency_score: efficiency_score(
                    row.resolved,
                    row.total_tickets,
                    row.avg_resolution_hours,
                ),
                avg_resolution_hours: row.avg_resolution_hours,
            })
            .collect())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn resolution_rate(resolved: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(resolved as f64 * 100.0 / total as f64)
}

/// Resolved tickets per ticket-day of work:
/// `resolved / (total * avg_hours / 24)`. Without usable resolution-time
/// data the score is undefined.
fn efficiency_score(resolved: i64, total: i64, avg_resolution_hours: Option<f64>) -> Option<f64> {
    let avg = avg_resolution_hours?;
    if total == 0 || avg <= 0.0 {
        return None;
    }
    Some(round2(resolved as f64 / (total as f64 * avg / 24.0)))
}

fn percentages(rows: Vec<(String, i64)>) -> Vec<IssueTypeCount> {
    let total: i64 = rows.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return Vec::new();
    }
    rows.into_iter()
        .map(|(label, count)| IssueTypeCount {
            label,
            count,
            percentage: round2(count as f64 * 100.0 / total as f64),
        })
        .collect()
}

/// Start of the given calendar day in server-local time, as a UTC instant.
fn local_day_start(day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_day_start(day);
    let end = day
        .succ_opt()
        .map(local_day_start)
        .unwrap_or(start + Duration::days(1));
    (start, end)
}

/// Inclusive calendar-date range widened to a half-open timestamp range.
fn date_range_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (local_day_start(from), local_day_bounds(to).1)
}

fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((local_day_start(first), local_day_start(next)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_resolution_rate() {
        assert_eq!(resolution_rate(3, 4), 75.0);
        assert_eq!(resolution_rate(0, 0), 0.0);
        assert_eq!(resolution_rate(1, 3), 33.33);
    }

    #[test]
    fn test_efficiency_score() {
        // 6 resolved of 10 total at 12h average: 6 / (10 * 0.5) = 1.2
        assert_eq!(efficiency_score(6, 10, Some(12.0)), Some(1.2));
        assert_eq!(efficiency_score(6, 10, None), None);
        assert_eq!(efficiency_score(0, 0, Some(5.0)), None);
        assert_eq!(efficiency_score(6, 10, Some(0.0)), None);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let rows = vec![
            ("broadband".to_string(), 2),
            ("dedicated".to_string(), 1),
            ("reseller".to_string(), 1),
        ];
        let result = percentages(rows);
        assert_eq!(result[0].percentage, 50.0);
        assert_eq!(result[1].percentage, 25.0);
        assert_eq!(result[2].percentage, 25.0);
        let sum: f64 = result.iter().map(|r| r.percentage).sum();
        assert_eq!(sum, 100.0);
    }

    #[test]
    fn test_percentages_empty() {
        assert!(percentages(Vec::new()).is_empty());
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert!(start < end);
        // December spans 31 days.
        assert_eq!(end - start, Duration::days(31));
        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }

    #[test]
    fn test_local_day_bounds_cover_one_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = local_day_bounds(day);
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_date_range_bounds_inclusive_of_end_day() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let (start, end) = date_range_bounds(from, to);
        assert_eq!(end - start, Duration::days(2));
    }
}
