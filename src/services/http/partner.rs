use axum::{extract::State, http::StatusCode, response::Response, Extension, Json};

use super::{render, respond, today, AppState};
use crate::models::referrals::NewReferral;
use crate::models::users::Identity;

pub async fn overview(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.overview(&partner, today()).await;
    render(&state, "partner overview", view).await
}

pub async fn referrals(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.referrals(&partner).await;
    render(&state, "partner referrals", view).await
}

pub async fn create_referral(
    State(state): State<AppState>,
    Extension(partner): Extension<Identity>,
    Json(referral): Json<NewReferral>,
) -> Response {
    let created = state.partners.create_referral(&partner, &referral).await;
    respond(&state, StatusCode::CREATED, created).await
}

pub async fn commissions(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.commissions(&partner).await;
    render(&state, "partner commissions", view).await
}

pub async fn reports(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.reports(&partner).await;
    render(&state, "partner reports", view).await
}

pub async fn profile(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.profile(&partner).await;
    render(&state, "partner profile", view).await
}

pub async fn link(State(state): State<AppState>, Extension(partner): Extension<Identity>) -> Response {
    let view = state.partners.link(&partner).await;
    render(&state, "partner link", view).await
}
