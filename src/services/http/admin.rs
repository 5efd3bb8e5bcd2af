use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use super::{render, respond, AppState};

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    status: Option<String>,
}

pub async fn overview(State(state): State<AppState>) -> Response {
    let view = state.admin.overview().await;
    render(&state, "admin overview", view).await
}

pub async fn contracts(State(state): State<AppState>, Query(filter): Query<StatusFilter>) -> Response {
    let view = state.admin.contracts(filter.status.as_deref()).await;
    render(&state, "admin contracts", view).await
}

pub async fn commissions(State(state): State<AppState>, Query(filter): Query<StatusFilter>) -> Response {
    let view = state.admin.commissions(filter.status.as_deref()).await;
    render(&state, "admin commissions", view).await
}

pub async fn referrals(State(state): State<AppState>, Query(filter): Query<StatusFilter>) -> Response {
    let view = state.admin.referrals(filter.status.as_deref()).await;
    render(&state, "admin referrals", view).await
}

pub async fn approve_partner(State(state): State<AppState>, Path(partner_id): Path<String>) -> Response {
    let approved = state
        .admin
        .approve_partner(&partner_id)
        .await
        .map(|()| json!({ "id": partner_id, "approved": true }));
    respond(&state, StatusCode::OK, approved).await
}
