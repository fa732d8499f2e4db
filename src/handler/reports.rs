// src/handler/reports.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::reportdtos::{DateRangeQueryDto, MonthlyReportQueryDto, TeamPerformanceQueryDto},
    error::HttpError,
    AppState,
};

pub fn reports_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/users/:user_id", get(get_user_dashboard))
        .route("/monthly", get(get_monthly_report))
        .route("/workload", get(get_workload_stats))
        .route("/issue-types", get(get_issue_type_analysis))
        .route("/customer-frequency", get(get_customer_frequency))
        .route("/team-performance", get(get_team_performance))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let metrics = app_state.report_service.dashboard_metrics().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": metrics
    })))
}

pub async fn get_user_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.report_service.user_dashboard(user_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": dashboard
    })))
}

pub async fn get_monthly_report(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<MonthlyReportQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let report = app_state
        .report_service
        .monthly_report(params.year, params.month, params.team)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": report
    })))
}

pub async fn get_workload_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<DateRangeQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .report_service
        .workload_stats(params.from, params.to, params.user_id, params.team)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn get_issue_type_analysis(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<DateRangeQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let analysis = app_state
        .report_service
        .issue_type_analysis(params.from, params.to)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": analysis
    })))
}

pub async fn get_customer_frequency(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<DateRangeQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let customers = app_state
        .report_service
        .customer_frequency(params.from, params.to)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": customers
    })))
}

pub async fn get_team_performance(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<TeamPerformanceQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let teams = app_state
        .report_service
        .team_performance(params.team, params.from, params.to)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": teams
    })))
}
