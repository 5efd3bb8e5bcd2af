use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use super::{end_session, error_response, render, AppState};
use crate::services::access::LOGIN_PATH;
use crate::services::ServiceError;
use crate::models::users::Identity;

pub async fn overview(State(state): State<AppState>, Extension(client): Extension<Identity>) -> Response {
    let view = state.clients.overview(&client).await;
    render(&state, "client overview", view).await
}

pub async fn contracts(State(state): State<AppState>, Extension(client): Extension<Identity>) -> Response {
    let view = state.clients.contracts(&client).await;
    render(&state, "client contracts", view).await
}

pub async fn contract(
    State(state): State<AppState>,
    Extension(client): Extension<Identity>,
    Path(id): Path<String>,
) -> Response {
    let view = state.clients.contract(&client, &id).await.map(Some);
    render(&state, "contract detail", view).await
}

pub async fn documents(State(state): State<AppState>, Extension(client): Extension<Identity>) -> Response {
    let view = state.clients.documents(&client).await;
    render(&state, "client documents", view).await
}

pub async fn history(State(state): State<AppState>, Extension(client): Extension<Identity>) -> Response {
    let view = state.clients.history(&client).await;
    render(&state, "client history", view).await
}

/// Sends the file itself rather than a view.
pub async fn document(
    State(state): State<AppState>,
    Extension(client): Extension<Identity>,
    Path((contract_id, document_id)): Path<(String, String)>,
) -> Response {
    let file = match (contract_id.parse(), document_id.parse()) {
        (Ok(contract), Ok(document)) => state.clients.document(&client, contract, document).await,
        _ => Err(ServiceError::NotFound(format!(
            "document {} of contract {}",
            document_id, contract_id
        ))),
    };

    match file {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, file.content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", attachment_name(&file.file_name)),
                ),
            ],
            file.bytes,
        )
            .into_response(),
        Err(ServiceError::Unauthenticated) => {
            if let Err(e) = end_session(&state).await {
                log::error!("Could not end session: {}", e);
            }
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => {
            log::warn!("Document {}/{} unavailable: {}", contract_id, document_id, e);
            error_response(&e)
        }
    }
}

pub async fn profile(State(state): State<AppState>, Extension(client): Extension<Identity>) -> Response {
    let view = state.clients.profile(&client).await;
    render(&state, "client profile", view).await
}

/// Header-safe file name: printable ASCII only, no quotes.
fn attachment_name(name: &str) -> String {
    name.chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect()
}
