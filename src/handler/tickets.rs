// src/handler/tickets.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::{
        historydb::HistoryExt,
        ticketdb::{TicketExt, TicketFilter},
    },
    dtos::ticketdtos::{
        AssignTicketDto, CreateComplaintTicketDto, TicketListQueryDto, TransferTicketDto,
        UpdateComplaintTicketDto,
    },
    error::{ErrorMessage, HttpError},
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", get(get_tickets).post(create_ticket))
        .route("/:ticket_id", get(get_ticket).put(update_ticket))
        .route("/:ticket_id/assign", put(assign_ticket))
        .route("/:ticket_id/transfer", put(transfer_ticket))
        .route("/:ticket_id/history", get(get_ticket_history))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateComplaintTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .create_complaint_ticket(body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn get_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<TicketListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20);
    let offset = ((page - 1) * limit) as i64;
    let limit = limit as i64;

    let filter = TicketFilter {
        status: params.status,
        team: params.team,
        assigned_to: params.assigned_to,
        ..Default::default()
    };

    let tickets = app_state
        .db_client
        .get_complaint_tickets(&filter, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "tickets": tickets,
            "page": page,
            "limit": limit
        }
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .db_client
        .get_complaint_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_str()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn update_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<i32>,
    Json(body): Json<UpdateComplaintTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .update_complaint_ticket(ticket_id, body)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_str()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn assign_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<i32>,
    Json(body): Json<AssignTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .assign_ticket(ticket_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn transfer_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<i32>,
    Json(body): Json<TransferTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .transfer_ticket_to_team(ticket_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn get_ticket_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let history = app_state
        .db_client
        .get_ticket_history(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": history
    })))
}
