use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::{end_session, error_response, AppState};
use crate::models::users::{Credentials, NewUser};
use crate::services::access::LOGIN_PATH;
use crate::services::session::SessionRequest;
use crate::services::ServiceError;

pub async fn landing() -> impl IntoResponse {
    Json(json!({
        "name": "PIAC Engenharia",
        "login": LOGIN_PATH,
        "register": "/register",
    }))
}

/// Already signed-in users with a dashboard are sent straight to it.
pub async fn login_page(State(state): State<AppState>) -> Response {
    let session = state.session.snapshot().await;

    match session.identity.and_then(|i| i.role.dashboard_path()) {
        Some(path) => Redirect::to(path).into_response(),
        None => Json(json!({ "view": "login" })).into_response(),
    }
}

pub async fn login(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> Response {
    let (login_tx, login_rx) = oneshot::channel();

    let send_result = state
        .session_channel
        .send(SessionRequest::Login {
            credentials,
            response: login_tx,
        })
        .await;
    if let Err(e) = send_result {
        return error_response(&ServiceError::Communication("Http".to_string(), e.to_string()));
    }

    match login_rx.await {
        Ok(Ok(auth)) => {
            let redirect = auth.user.role.dashboard_path().unwrap_or(LOGIN_PATH);
            (
                StatusCode::OK,
                Json(json!({
                    "user": auth.user,
                    "token": auth.token,
                    "redirect": redirect,
                })),
            )
                .into_response()
        }
        Ok(Err(service_error)) => error_response(&service_error),
        Err(e) => error_response(&ServiceError::Communication(
            "SessionService".to_string(),
            e.to_string(),
        )),
    }
}

pub async fn register_page() -> impl IntoResponse {
    Json(json!({ "view": "register" }))
}

pub async fn register(State(state): State<AppState>, Json(new_user): Json<NewUser>) -> Response {
    let (register_tx, register_rx) = oneshot::channel();

    let send_result = state
        .session_channel
        .send(SessionRequest::Register {
            new_user,
            response: register_tx,
        })
        .await;
    if let Err(e) = send_result {
        return error_response(&ServiceError::Communication("Http".to_string(), e.to_string()));
    }

    match register_rx.await {
        Ok(Ok(user)) => (
            StatusCode::CREATED,
            Json(json!({ "user": user, "redirect": LOGIN_PATH })),
        )
            .into_response(),
        Ok(Err(service_error)) => error_response(&service_error),
        Err(e) => error_response(&ServiceError::Communication(
            "SessionService".to_string(),
            e.to_string(),
        )),
    }
}

pub async fn logout(State(state): State<AppState>) -> Response {
    match end_session(&state).await {
        Ok(()) => Redirect::to(LOGIN_PATH).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.snapshot().await)
}
