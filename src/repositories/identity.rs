use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use super::api::{is_unauthorized, ApiClient, ApiError};
use crate::models::users::{AuthResponse, Credentials, Identity, NewUser, Role};

pub const DEMO_SECRET: &str = "123456";

#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    /// `Ok(None)` means the credentials were rejected.
    async fn verify(&self, credentials: &Credentials) -> Result<Option<AuthResponse>, anyhow::Error>;

    /// `Ok(None)` means the e-mail is already registered.
    async fn register(&self, new_user: &NewUser) -> Result<Option<Identity>, anyhow::Error>;
}

struct Account {
    identity: Identity,
    password: String,
}

/// In-process accounts, used for demos and tests.
pub struct MockIdentityVerifier {
    accounts: DashMap<String, Account>,
    next_id: AtomicU64,
}

impl MockIdentityVerifier {
    pub fn new(users: Vec<Identity>, secret: &str) -> Self {
        let next_id = users
            .iter()
            .filter_map(|u| u.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let accounts = users
            .into_iter()
            .map(|identity| {
                let account = Account {
                    identity: identity.clone(),
                    password: secret.to_string(),
                };
                (identity.email.to_lowercase(), account)
            })
            .collect();

        Self {
            accounts,
            next_id: AtomicU64::new(next_id),
        }
    }

    /// The three demo accounts: one client, one partner and one admin.
    pub fn seeded() -> Self {
        let user = |id: &str, email: &str, role: Role, name: &str| Identity {
            id: id.to_string(),
            email: email.to_string(),
            display_name: name.to_string(),
            role,
        };

        Self::new(
            vec![
                user("1", "cliente@teste.com", Role::Client, "Cliente Teste"),
                user("2", "parceiro@teste.com", Role::Partner, "Parceiro Teste"),
                user("3", "admin@teste.com", Role::Admin, "Admin Teste"),
            ],
            DEMO_SECRET,
        )
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Option<AuthResponse>, anyhow::Error> {
        let Some(account) = self.accounts.get(&credentials.email.to_lowercase()) else {
            return Ok(None);
        };

        if account.password != credentials.password {
            return Ok(None);
        }

        Ok(Some(AuthResponse {
            user: account.identity.clone(),
            token: format!("mock_token_{}", Uuid::new_v4().simple()),
        }))
    }

    async fn register(&self, new_user: &NewUser) -> Result<Option<Identity>, anyhow::Error> {
        let email = new_user.email.to_lowercase();
        if self.accounts.contains_key(&email) {
            return Ok(None);
        }

        let identity = Identity {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            email: new_user.email.clone(),
            display_name: new_user.name.clone(),
            role: new_user.role,
        };

        self.accounts.insert(
            email,
            Account {
                identity: identity.clone(),
                password: new_user.password.clone(),
            },
        );

        Ok(Some(identity))
    }
}

#[derive(Deserialize)]
struct RegisterResponse {
    user: Identity,
}

pub struct HttpIdentityVerifier {
    api: ApiClient,
}

impl HttpIdentityVerifier {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Option<AuthResponse>, anyhow::Error> {
        match self.api.post::<_, AuthResponse>("/auth/login", credentials).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if is_unauthorized(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn register(&self, new_user: &NewUser) -> Result<Option<Identity>, anyhow::Error> {
        match self.api.post::<_, RegisterResponse>("/auth/register", new_user).await {
            Ok(response) => Ok(Some(response.user)),
            Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Status(409, _))) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn seeded_accounts_accept_the_demo_secret() {
        let verifier = MockIdentityVerifier::seeded();

        let auth = verifier
            .verify(&credentials("parceiro@teste.com", DEMO_SECRET))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(auth.user.role, Role::Partner);
        assert!(auth.token.starts_with("mock_token_"));
    }

    #[tokio::test]
    async fn wrong_secret_or_unknown_email_is_rejected() {
        let verifier = MockIdentityVerifier::seeded();

        assert!(verifier
            .verify(&credentials("admin@teste.com", "654321"))
            .await
            .unwrap()
            .is_none());
        assert!(verifier
            .verify(&credentials("ninguem@teste.com", DEMO_SECRET))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn registered_accounts_can_log_in() {
        let verifier = MockIdentityVerifier::seeded();
        let new_user = NewUser {
            name: "Nova Cliente".to_string(),
            email: "nova@cliente.com".to_string(),
            phone: "(11) 91111-1111".to_string(),
            password: "senha-forte".to_string(),
            confirm_password: "senha-forte".to_string(),
            role: Role::Client,
            company: None,
        };

        let identity = verifier.register(&new_user).await.unwrap().unwrap();
        assert_eq!(identity.id, "4");
        assert!(verifier.register(&new_user).await.unwrap().is_none());

        let auth = verifier
            .verify(&credentials("nova@cliente.com", "senha-forte"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(auth.user, identity);
    }
}
