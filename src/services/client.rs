use std::sync::Arc;

use serde::Serialize;

use super::ServiceError;
use crate::models::contracts::{Contract, Document, DocumentFile};
use crate::models::users::{Identity, Profile};
use crate::repositories::clients::ClientRepository;

const RECENT_DOCUMENTS: usize = 3;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOverview {
    pub active_contracts: usize,
    pub completed_contracts: usize,
    pub documents_available: usize,
    pub contracts: Vec<Contract>,
    pub recent_documents: Vec<Document>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContracts {
    pub contracts: Vec<Contract>,
    pub active: usize,
    pub completed: usize,
    pub total_in_cents: i64,
}

#[derive(Clone)]
pub struct ClientDashboard {
    repository: Arc<dyn ClientRepository>,
}

impl ClientDashboard {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    async fn fetch_contracts(&self, client: &Identity) -> Result<Vec<Contract>, ServiceError> {
        self.repository
            .contracts(&client.id)
            .await
            .map_err(|e| ServiceError::fetch("contracts", e))
    }

    pub async fn overview(&self, client: &Identity) -> Result<ClientOverview, ServiceError> {
        let contracts = self.fetch_contracts(client).await?;
        let documents = documents_of(&contracts);

        Ok(ClientOverview {
            active_contracts: contracts.iter().filter(|c| c.is_active()).count(),
            completed_contracts: contracts.iter().filter(|c| !c.is_active()).count(),
            documents_available: documents.len(),
            recent_documents: documents.into_iter().take(RECENT_DOCUMENTS).collect(),
            contracts: contracts.into_iter().filter(|c| c.is_active()).collect(),
        })
    }

    pub async fn contracts(&self, client: &Identity) -> Result<ClientContracts, ServiceError> {
        let contracts = self.fetch_contracts(client).await?;

        Ok(ClientContracts {
            active: contracts.iter().filter(|c| c.is_active()).count(),
            completed: contracts.iter().filter(|c| !c.is_active()).count(),
            total_in_cents: contracts.iter().map(|c| c.amount_in_cents).sum(),
            contracts,
        })
    }

    /// Looks a contract up by the id as given in the path. Ids that are not
    /// numbers cannot exist, so they are reported as not found too.
    pub async fn contract(&self, client: &Identity, id: &str) -> Result<Contract, ServiceError> {
        let not_found =
            || ServiceError::DataFetch("contract".to_string(), "contract not found".to_string());
        let id: u64 = id.parse().map_err(|_| not_found())?;

        self.repository
            .contract(&client.id, id)
            .await
            .map_err(|e| ServiceError::fetch("contract", e))?
            .ok_or_else(not_found)
    }

    pub async fn document(
        &self,
        client: &Identity,
        contract_id: u64,
        document_id: u64,
    ) -> Result<DocumentFile, ServiceError> {
        self.repository
            .document(&client.id, contract_id, document_id)
            .await
            .map_err(|e| ServiceError::fetch("document", e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("document {} of contract {}", document_id, contract_id))
            })
    }

    /// The stored profile, or one made from the session identity when the
    /// client has none yet.
    pub async fn profile(&self, client: &Identity) -> Result<Profile, ServiceError> {
        let profile = self
            .repository
            .profile(&client.id)
            .await
            .map_err(|e| ServiceError::fetch("profile", e))?;

        Ok(profile.unwrap_or_else(|| Profile::from(client)))
    }

    pub async fn documents(&self, client: &Identity) -> Result<Vec<Document>, ServiceError> {
        let contracts = self.fetch_contracts(client).await?;

        Ok(documents_of(&contracts))
    }

    /// Completed contracts, most recently finished first.
    pub async fn history(&self, client: &Identity) -> Result<Vec<Contract>, ServiceError> {
        let mut completed: Vec<Contract> = self
            .fetch_contracts(client)
            .await?
            .into_iter()
            .filter(|c| !c.is_active())
            .collect();
        completed.sort_by(|a, b| b.expected_on.cmp(&a.expected_on));

        Ok(completed)
    }
}

fn documents_of(contracts: &[Contract]) -> Vec<Document> {
    let mut documents: Vec<Document> = contracts
        .iter()
        .flat_map(|c| c.documents.iter().cloned())
        .collect();
    documents.sort_by(|a, b| b.uploaded_on.cmp(&a.uploaded_on).then(a.id.cmp(&b.id)));

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Role;
    use crate::repositories::clients::MockClientRepository;

    fn client() -> Identity {
        Identity {
            id: "1".to_string(),
            email: "cliente@teste.com".to_string(),
            display_name: "Cliente Teste".to_string(),
            role: Role::Client,
        }
    }

    fn dashboard() -> ClientDashboard {
        ClientDashboard::new(Arc::new(MockClientRepository::seeded()))
    }

    #[tokio::test]
    async fn contract_listing_totals() {
        let listing = dashboard().contracts(&client()).await.unwrap();

        assert_eq!(listing.contracts.len(), 3);
        assert_eq!(listing.active, 2);
        assert_eq!(listing.completed, 1);
        assert_eq!(listing.total_in_cents, 5_800_000);
    }

    #[tokio::test]
    async fn overview_shows_active_work_and_latest_documents() {
        let overview = dashboard().overview(&client()).await.unwrap();

        assert_eq!(overview.active_contracts, 2);
        assert_eq!(overview.completed_contracts, 1);
        assert_eq!(overview.documents_available, 5);
        assert_eq!(overview.contracts.len(), 2);
        let latest: Vec<u64> = overview.recent_documents.iter().map(|d| d.id).collect();
        assert_eq!(latest, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_contract_is_a_failed_view() {
        let err = dashboard().contract(&client(), "99").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not load contract: contract not found");

        let err = dashboard().contract(&client(), "abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not load contract: contract not found");

        assert_eq!(dashboard().contract(&client(), "1").await.unwrap().progress, 65);
    }

    #[tokio::test]
    async fn documents_download_only_within_their_contract() {
        let file = dashboard().document(&client(), 3, 4).await.unwrap();
        assert_eq!(file.file_name, "Projeto Completo");
        assert_eq!(file.content_type, "application/pdf");

        assert!(matches!(
            dashboard().document(&client(), 1, 4).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_falls_back_to_the_session_identity() {
        let profile = dashboard().profile(&client()).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("(11) 98888-7777"));

        let newcomer = Identity {
            id: "8".to_string(),
            email: "nova@cliente.com".to_string(),
            display_name: "Nova Cliente".to_string(),
            role: Role::Client,
        };
        let profile = dashboard().profile(&newcomer).await.unwrap();
        assert_eq!(profile, Profile::from(&newcomer));
    }

    #[tokio::test]
    async fn history_holds_completed_contracts_only() {
        let history = dashboard().history(&client()).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].number, "CT-2024-015");
    }

    #[tokio::test]
    async fn clients_without_contracts_see_empty_views() {
        let stranger = Identity {
            id: "77".to_string(),
            ..client()
        };

        assert!(dashboard().documents(&stranger).await.unwrap().is_empty());
        assert_eq!(dashboard().contracts(&stranger).await.unwrap().total_in_cents, 0);
    }
}
