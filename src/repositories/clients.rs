use async_trait::async_trait;
use dashmap::DashMap;

use super::api::{ApiClient, ApiError};
use super::seed_date;
use crate::models::contracts::{
    Contract, ContractStatus, Document, DocumentFile, Stage, StageStatus,
};
use crate::models::users::Profile;

#[async_trait]
pub trait ClientRepository: Send + Sync + 'static {
    async fn contracts(&self, client_id: &str) -> Result<Vec<Contract>, anyhow::Error>;

    async fn contract(&self, client_id: &str, id: u64) -> Result<Option<Contract>, anyhow::Error>;

    /// `Ok(None)` when the contract or the document does not exist.
    async fn document(
        &self,
        client_id: &str,
        contract_id: u64,
        document_id: u64,
    ) -> Result<Option<DocumentFile>, anyhow::Error>;

    async fn profile(&self, client_id: &str) -> Result<Option<Profile>, anyhow::Error>;
}

#[derive(Default)]
pub struct MockClientRepository {
    contracts: DashMap<String, Vec<Contract>>,
    /// Document id to file contents.
    files: DashMap<u64, Vec<u8>>,
    profiles: DashMap<String, Profile>,
}

impl MockClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        let repository = Self::new();
        let contracts = demo_contracts();
        for contract in &contracts {
            for doc in &contract.documents {
                let body = format!("{} - {} ({})", contract.number, doc.name, doc.kind);
                repository.insert_file(doc.id, body.into_bytes());
            }
        }
        repository.insert_contracts("1", contracts);
        repository.insert_profile(Profile {
            id: "1".to_string(),
            name: "Cliente Teste".to_string(),
            email: "cliente@teste.com".to_string(),
            phone: Some("(11) 98888-7777".to_string()),
            company: None,
        });

        repository
    }

    pub fn insert_file(&self, document_id: u64, bytes: Vec<u8>) {
        self.files.insert(document_id, bytes);
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn insert_contracts(&self, client_id: &str, contracts: Vec<Contract>) {
        self.contracts
            .entry(client_id.to_string())
            .or_default()
            .extend(contracts);
    }
}

#[async_trait]
impl ClientRepository for MockClientRepository {
    async fn contracts(&self, client_id: &str) -> Result<Vec<Contract>, anyhow::Error> {
        Ok(self
            .contracts
            .get(client_id)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }

    async fn contract(&self, client_id: &str, id: u64) -> Result<Option<Contract>, anyhow::Error> {
        Ok(self
            .contracts
            .get(client_id)
            .and_then(|c| c.iter().find(|contract| contract.id == id).cloned()))
    }

    async fn document(
        &self,
        client_id: &str,
        contract_id: u64,
        document_id: u64,
    ) -> Result<Option<DocumentFile>, anyhow::Error> {
        let Some(contract) = self.contract(client_id, contract_id).await? else {
            return Ok(None);
        };
        let Some(doc) = contract.documents.iter().find(|d| d.id == document_id) else {
            return Ok(None);
        };

        Ok(self.files.get(&document_id).map(|bytes| DocumentFile {
            file_name: doc.name.clone(),
            content_type: doc.content_type().to_string(),
            bytes: bytes.value().clone(),
        }))
    }

    async fn profile(&self, client_id: &str) -> Result<Option<Profile>, anyhow::Error> {
        Ok(self.profiles.get(client_id).map(|p| p.value().clone()))
    }
}

pub struct HttpClientRepository {
    api: ApiClient,
}

impl HttpClientRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ClientRepository for HttpClientRepository {
    async fn contracts(&self, _client_id: &str) -> Result<Vec<Contract>, anyhow::Error> {
        self.api.get("/clients/contratos").await
    }

    async fn contract(&self, _client_id: &str, id: u64) -> Result<Option<Contract>, anyhow::Error> {
        not_found_as_none(self.api.get(&format!("/clients/contratos/{}", id)).await)
    }

    async fn document(
        &self,
        _client_id: &str,
        contract_id: u64,
        document_id: u64,
    ) -> Result<Option<DocumentFile>, anyhow::Error> {
        let path = format!("/clients/contratos/{}/arquivos/{}", contract_id, document_id);
        let download = not_found_as_none(self.api.download(&path).await)?;

        Ok(download.map(|(content_type, bytes)| DocumentFile {
            file_name: format!("contrato-{}-arquivo-{}", contract_id, document_id),
            content_type,
            bytes,
        }))
    }

    async fn profile(&self, _client_id: &str) -> Result<Option<Profile>, anyhow::Error> {
        self.api.get("/clients/profile").await.map(Some)
    }
}

fn not_found_as_none<T>(result: Result<T, anyhow::Error>) -> Result<Option<T>, anyhow::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => match e.downcast_ref::<ApiError>() {
            Some(ApiError::Status(404, _)) => Ok(None),
            _ => Err(e),
        },
    }
}

fn stage(name: &str, status: StageStatus, completed_on: Option<(i32, u32, u32)>) -> Stage {
    Stage {
        name: name.to_string(),
        status,
        completed_on: completed_on.map(|(y, m, d)| seed_date(y, m, d)),
    }
}

fn demo_document(
    id: u64,
    name: &str,
    kind: &str,
    size: &str,
    uploaded: (i32, u32, u32),
    contract_id: u64,
) -> Document {
    Document {
        id,
        name: name.to_string(),
        kind: kind.to_string(),
        size: size.to_string(),
        uploaded_on: seed_date(uploaded.0, uploaded.1, uploaded.2),
        contract_id,
    }
}

pub(crate) fn demo_contracts() -> Vec<Contract> {
    vec![
        Contract {
            id: 1,
            number: "CT-2025-001".to_string(),
            title: "Projeto Estrutural - Residência".to_string(),
            status: ContractStatus::InProgress,
            progress: 65,
            started_on: seed_date(2025, 1, 15),
            expected_on: seed_date(2025, 3, 15),
            engineer: "Eng. João Silva".to_string(),
            amount_in_cents: 2_500_000,
            description: "Desenvolvimento de projeto estrutural para residência unifamiliar de 200m²"
                .to_string(),
            stages: vec![
                stage("Análise do Terreno", StageStatus::Done, Some((2025, 1, 16))),
                stage("Projeto Preliminar", StageStatus::Done, Some((2025, 1, 20))),
                stage("Cálculos Estruturais", StageStatus::InProgress, None),
                stage("Detalhamento", StageStatus::Pending, None),
                stage("Revisão Final", StageStatus::Pending, None),
            ],
            documents: vec![
                demo_document(1, "Memorial Descritivo", "PDF", "2.5 MB", (2025, 1, 22), 1),
                demo_document(2, "Plantas Baixas", "DWG", "8.3 MB", (2025, 1, 20), 1),
            ],
        },
        Contract {
            id: 2,
            number: "CT-2025-002".to_string(),
            title: "Consultoria Técnica - Comercial".to_string(),
            status: ContractStatus::AwaitingApproval,
            progress: 25,
            started_on: seed_date(2025, 1, 20),
            expected_on: seed_date(2025, 2, 28),
            engineer: "Eng. Maria Santos".to_string(),
            amount_in_cents: 1_500_000,
            description: "Consultoria técnica para adequação de edifício comercial".to_string(),
            stages: vec![
                stage("Levantamento Técnico", StageStatus::Done, Some((2025, 1, 22))),
                stage("Análise de Viabilidade", StageStatus::InProgress, None),
                stage("Proposta de Solução", StageStatus::Pending, None),
                stage("Implementação", StageStatus::Pending, None),
            ],
            documents: vec![demo_document(
                3,
                "Relatório de Análise",
                "PDF",
                "1.8 MB",
                (2025, 1, 18),
                2,
            )],
        },
        Contract {
            id: 3,
            number: "CT-2024-015".to_string(),
            title: "Projeto Arquitetônico - Reforma".to_string(),
            status: ContractStatus::Completed,
            progress: 100,
            started_on: seed_date(2024, 11, 15),
            expected_on: seed_date(2024, 12, 30),
            engineer: "Arq. Pedro Costa".to_string(),
            amount_in_cents: 1_800_000,
            description: "Projeto arquitetônico completo para reforma residencial".to_string(),
            stages: vec![
                stage("Levantamento", StageStatus::Done, Some((2024, 11, 18))),
                stage("Anteprojeto", StageStatus::Done, Some((2024, 11, 25))),
                stage("Projeto Executivo", StageStatus::Done, Some((2024, 12, 10))),
                stage("Aprovação Prefeitura", StageStatus::Done, Some((2024, 12, 28))),
            ],
            documents: vec![
                demo_document(4, "Projeto Completo", "PDF", "12.5 MB", (2024, 12, 28), 3),
                demo_document(5, "Plantas DWG", "ZIP", "25.8 MB", (2024, 12, 28), 3),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn looks_up_contracts_within_the_client_scope() {
        let repository = MockClientRepository::seeded();

        assert_eq!(repository.contracts("1").await.unwrap().len(), 3);
        assert_eq!(
            repository.contract("1", 2).await.unwrap().map(|c| c.number),
            Some("CT-2025-002".to_string())
        );
        assert!(repository.contract("1", 42).await.unwrap().is_none());
        assert!(repository.contract("7", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn documents_are_fetched_through_their_contract() {
        let repository = MockClientRepository::seeded();

        let file = repository.document("1", 1, 2).await.unwrap().unwrap();
        assert_eq!(file.file_name, "Plantas Baixas");
        assert_eq!(file.content_type, "image/vnd.dwg");
        assert!(String::from_utf8(file.bytes).unwrap().starts_with("CT-2025-001"));

        assert!(repository.document("1", 1, 4).await.unwrap().is_none());
        assert!(repository.document("7", 1, 2).await.unwrap().is_none());
    }
}
