use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::users::Role;
use crate::repositories::{
    admin::{AdminRepository, HttpAdminRepository, MockAdminRepository},
    api::{is_unauthorized, ApiClient},
    clients::{ClientRepository, HttpClientRepository, MockClientRepository},
    identity::{HttpIdentityVerifier, IdentityVerifier, MockIdentityVerifier},
    partners::{HttpPartnerRepository, MockPartnerRepository, PartnerRepository},
    storage::{FileStore, KeyValueStore},
};
use crate::settings::{DataSource, Settings};

pub mod access;
pub mod admin;
pub mod client;
pub mod dashboard;
pub mod http;
pub mod partner;
pub mod session;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Not authenticated.")]
    Unauthenticated,
    #[error("Role {0} may not access this view.")]
    WrongRole(Role),
    #[error("Corrupted persisted session: {0}")]
    CorruptedSession(String),
    #[error("Could not load {0}: {1}")]
    DataFetch(String, String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Maps a data-access failure, keeping API token rejections distinguishable.
    pub fn fetch(resource: &str, err: anyhow::Error) -> Self {
        if is_unauthorized(&err) {
            ServiceError::Unauthenticated
        } else {
            ServiceError::DataFetch(resource.to_string(), err.to_string())
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

struct DataAccess {
    verifier: Arc<dyn IdentityVerifier>,
    partners: Arc<dyn PartnerRepository>,
    clients: Arc<dyn ClientRepository>,
    admin: Arc<dyn AdminRepository>,
}

fn data_access(
    settings: &Settings,
    store: Arc<dyn KeyValueStore>,
) -> Result<DataAccess, anyhow::Error> {
    match settings.data.source {
        DataSource::Mock => Ok(DataAccess {
            verifier: Arc::new(MockIdentityVerifier::seeded()),
            partners: Arc::new(MockPartnerRepository::seeded()),
            clients: Arc::new(MockClientRepository::seeded()),
            admin: Arc::new(MockAdminRepository::seeded()),
        }),
        DataSource::Http => {
            let api = ApiClient::new(
                &settings.api.base_url,
                Duration::from_secs(settings.api.timeout_secs),
                store,
            )?;

            Ok(DataAccess {
                verifier: Arc::new(HttpIdentityVerifier::new(api.clone())),
                partners: Arc::new(HttpPartnerRepository::new(api.clone())),
                clients: Arc::new(HttpClientRepository::new(api.clone())),
                admin: Arc::new(HttpAdminRepository::new(api)),
            })
        }
    }
}

pub async fn start_services(settings: Settings) -> Result<(), anyhow::Error> {
    let session_file: PathBuf = match &settings.storage.session_file {
        Some(path) => path.into(),
        None => FileStore::default_path()?,
    };
    let file_store = FileStore::new(session_file);
    log::info!("Persisting session to {}", file_store.path().display());
    let store: Arc<dyn KeyValueStore> = Arc::new(file_store);

    log::info!("Using {:?} data source.", settings.data.source);
    let data = data_access(&settings, store.clone())?;

    let session_store = session::SessionStore::new(store, data.verifier);
    let restored = session_store.restore().await;
    match &restored.identity {
        Some(identity) => log::info!("Resumed session of {} ({}).", identity.email, identity.role),
        None => log::info!("No session to resume."),
    }

    log::info!("Starting session service.");
    let (session_tx, mut session_rx) = mpsc::channel(64);
    let mut session_service = session::SessionService::new();
    let session_handler = session::SessionRequestHandler::new(session_store.clone());
    tokio::spawn(async move {
        session_service.run(session_handler, &mut session_rx).await;
    });

    let state = http::AppState {
        session: session_store,
        session_channel: session_tx,
        partners: partner::PartnerDashboard::new(data.partners, &settings.server.public_url),
        clients: client::ClientDashboard::new(data.clients),
        admin: admin::AdminDashboard::new(data.admin),
    };

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.server.listen, state).await
}
