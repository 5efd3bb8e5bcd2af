use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::access::{authorize, AccessDecision, LOGIN_PATH};
use super::admin::AdminDashboard;
use super::client::ClientDashboard;
use super::dashboard::ViewState;
use super::partner::PartnerDashboard;
use super::session::{SessionRequest, SessionStore};
use super::ServiceError;
use crate::models::users::Role;

mod admin;
mod auth;
mod client;
mod partner;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionStore,
    pub session_channel: mpsc::Sender<SessionRequest>,
    pub partners: PartnerDashboard,
    pub clients: ClientDashboard,
    pub admin: AdminDashboard,
}

#[derive(Clone)]
struct Guard {
    state: AppState,
    role: Option<Role>,
}

/// Lets a request through to a role subtree only if the session allows it.
/// The allowed identity is handed to the view as a request extension.
async fn require_role(State(guard): State<Guard>, mut request: Request, next: Next) -> Response {
    let session = guard.state.session.snapshot().await;

    match authorize(guard.role, &session) {
        AccessDecision::Loading => Json(ViewState::<()>::Loading).into_response(),
        AccessDecision::Redirect { location, cause } => {
            log::debug!("{} {} -> {}: {}", request.method(), request.uri(), location, cause);
            Redirect::to(location).into_response()
        }
        AccessDecision::Allow(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
    }
}

fn guarded(state: &AppState, role: Role) -> Guard {
    Guard {
        state: state.clone(),
        role: Some(role),
    }
}

pub(crate) fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidCredentials | ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::WrongRole(_) => StatusCode::FORBIDDEN,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Repository(..) | ServiceError::DataFetch(..) => StatusCode::BAD_GATEWAY,
        ServiceError::CorruptedSession(_)
        | ServiceError::Storage(_)
        | ServiceError::Communication(..)
        | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &ServiceError) -> Response {
    (status_for(err), Json(json!({ "error": err.to_string() }))).into_response()
}

/// Ends the session through the session service.
pub(crate) async fn end_session(state: &AppState) -> Result<(), ServiceError> {
    let (logout_tx, logout_rx) = oneshot::channel();

    state
        .session_channel
        .send(SessionRequest::Logout {
            response: logout_tx,
        })
        .await
        .map_err(|e| ServiceError::Communication("Http".to_string(), e.to_string()))?;

    logout_rx
        .await
        .map_err(|e| ServiceError::Communication("SessionService".to_string(), e.to_string()))
}

/// Renders a view result. A session rejected by the API is logged out and
/// sent back to the login page.
pub(crate) async fn render<T>(state: &AppState, view: &str, result: Result<T, ServiceError>) -> Response
where
    T: Serialize + Default,
{
    match ViewState::resolve(view, result) {
        Ok(view) => Json(view).into_response(),
        Err(cause) => {
            log::warn!("Ending session while loading {} view: {}", view, cause);
            if let Err(e) = end_session(state).await {
                log::error!("Could not end session: {}", e);
            }
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

/// Like `render`, for actions whose failures are answered with an error status.
pub(crate) async fn respond<T: Serialize>(
    state: &AppState,
    success: StatusCode,
    result: Result<T, ServiceError>,
) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(ServiceError::Unauthenticated) => {
            if let Err(e) = end_session(state).await {
                log::error!("Could not end session: {}", e);
            }
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => error_response(&e),
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn unmatched() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// Each role subtree is guarded as a whole, unknown subpaths included.
pub fn router(state: AppState) -> Router {
    let partner = Router::new()
        .route("/", get(partner::overview))
        .route("/overview", get(partner::overview))
        .route("/referrals", get(partner::referrals).post(partner::create_referral))
        .route("/commissions", get(partner::commissions))
        .route("/reports", get(partner::reports))
        .route("/link", get(partner::link))
        .route("/profile", get(partner::profile))
        .fallback(unmatched)
        .layer(middleware::from_fn_with_state(
            guarded(&state, Role::Partner),
            require_role,
        ));

    let client = Router::new()
        .route("/", get(client::overview))
        .route("/overview", get(client::overview))
        .route("/contracts", get(client::contracts))
        .route("/contracts/{id}", get(client::contract))
        .route("/documents", get(client::documents))
        .route("/history", get(client::history))
        .route("/contracts/{id}/documents/{document_id}", get(client::document))
        .route("/profile", get(client::profile))
        .fallback(unmatched)
        .layer(middleware::from_fn_with_state(
            guarded(&state, Role::Client),
            require_role,
        ));

    let admin = Router::new()
        .route("/", get(admin::overview))
        .route("/overview", get(admin::overview))
        .route("/contracts", get(admin::contracts))
        .route("/commissions", get(admin::commissions))
        .route("/referrals", get(admin::referrals))
        .route("/partners/{id}/approve", post(admin::approve_partner))
        .fallback(unmatched)
        .layer(middleware::from_fn_with_state(
            guarded(&state, Role::Admin),
            require_role,
        ));

    Router::new()
        .route("/", get(auth::landing))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .nest("/partner", partner)
        .nest("/client", client)
        .nest("/admin", admin)
        .fallback(unmatched)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
