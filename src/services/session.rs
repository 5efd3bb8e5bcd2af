//! The portal's single session: in-memory state plus its persisted copy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, RwLock};

use super::{RequestHandler, Service, ServiceError};
use crate::models::session::Session;
use crate::models::users::{AuthResponse, Credentials, Identity, NewUser};
use crate::repositories::identity::IdentityVerifier;
use crate::repositories::storage::KeyValueStore;
use crate::repositories::{TOKEN_KEY, USER_KEY};

/// Shared handle to the session.
///
/// Every mutation holds the write lock across the persistence call, so the
/// stored copy and the in-memory session agree whenever the lock is free.
#[derive(Clone)]
pub struct SessionStore {
    session: Arc<RwLock<Session>>,
    store: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::loading())),
            store,
            verifier,
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Loads the persisted session. Unreadable data is wiped and treated as
    /// no session at all.
    pub async fn restore(&self) -> Session {
        let mut session = self.session.write().await;
        *session = self.read_persisted().await;

        session.clone()
    }

    async fn read_persisted(&self) -> Session {
        let persisted = async {
            let token = self.store.get(TOKEN_KEY).await?;
            let user = self.store.get(USER_KEY).await?;
            Ok::<_, anyhow::Error>((token, user))
        };

        let raw_user = match persisted.await {
            Ok((Some(_), Some(user))) => user,
            Ok((None, None)) => return Session::unauthenticated(),
            Ok(_) => {
                self.discard_corrupted("incomplete session".to_string()).await;
                return Session::unauthenticated();
            }
            Err(e) => {
                self.discard_corrupted(e.to_string()).await;
                return Session::unauthenticated();
            }
        };

        match serde_json::from_str::<Identity>(&raw_user) {
            Ok(identity) => Session::authenticated(identity),
            Err(e) => {
                self.discard_corrupted(e.to_string()).await;
                Session::unauthenticated()
            }
        }
    }

    async fn discard_corrupted(&self, reason: String) {
        log::warn!("{}", ServiceError::CorruptedSession(reason));

        if let Err(e) = self.store.delete(&[TOKEN_KEY, USER_KEY]).await {
            log::error!("Could not wipe persisted session: {}", e);
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ServiceError> {
        let auth = self
            .verifier
            .verify(credentials)
            .await
            .map_err(|e| ServiceError::Repository("IdentityVerifier".to_string(), e.to_string()))?
            .ok_or(ServiceError::InvalidCredentials)?;

        let user =
            serde_json::to_string(&auth.user).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut session = self.session.write().await;
        self.store
            .put(&[(TOKEN_KEY, auth.token.as_str()), (USER_KEY, user.as_str())])
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        *session = Session::authenticated(auth.user.clone());

        log::info!("Logged in {} ({}).", auth.user.email, auth.user.role);
        Ok(auth)
    }

    pub async fn logout(&self) {
        let mut session = self.session.write().await;

        if let Err(e) = self.store.delete(&[TOKEN_KEY, USER_KEY]).await {
            log::error!("Could not erase persisted session: {}", e);
        }
        if let Some(identity) = session.identity.take() {
            log::info!("Logged out {}.", identity.email);
        }
        *session = Session::unauthenticated();
    }

    pub async fn register(&self, new_user: &NewUser) -> Result<Identity, ServiceError> {
        new_user.validate().map_err(ServiceError::Validation)?;

        let identity = self
            .verifier
            .register(new_user)
            .await
            .map_err(|e| ServiceError::Repository("IdentityVerifier".to_string(), e.to_string()))?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("{} is already registered.", new_user.email))
            })?;

        log::info!("Registered {} as {}.", identity.email, identity.role);
        Ok(identity)
    }
}

pub enum SessionRequest {
    Login {
        credentials: Credentials,
        response: oneshot::Sender<Result<AuthResponse, ServiceError>>,
    },
    Register {
        new_user: NewUser,
        response: oneshot::Sender<Result<Identity, ServiceError>>,
    },
    Logout {
        response: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct SessionRequestHandler {
    store: SessionStore,
}

impl SessionRequestHandler {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<SessionRequest> for SessionRequestHandler {
    async fn handle_request(&self, request: SessionRequest) {
        match request {
            SessionRequest::Login {
                credentials,
                response,
            } => {
                let auth = self.store.login(&credentials).await;
                let _ = response.send(auth);
            }
            SessionRequest::Register { new_user, response } => {
                let identity = self.store.register(&new_user).await;
                let _ = response.send(identity);
            }
            SessionRequest::Logout { response } => {
                self.store.logout().await;
                let _ = response.send(());
            }
        }
    }
}

pub struct SessionService;

impl SessionService {
    pub fn new() -> Self {
        SessionService {}
    }
}

#[async_trait]
impl Service<SessionRequest, SessionRequestHandler> for SessionService {
    /// Session writes are applied one at a time, in arrival order.
    async fn run(
        &mut self,
        handler: SessionRequestHandler,
        receiver: &mut mpsc::Receiver<SessionRequest>,
    ) {
        while let Some(request) = receiver.recv().await {
            handler.handle_request(request).await;
        }
    }
}
