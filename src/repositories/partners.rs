use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Local;
use dashmap::DashMap;

use super::api::ApiClient;
use super::seed_date;
use crate::models::commissions::{Commission, CommissionStatus};
use crate::models::referrals::{LinkStats, NewReferral, Referral, ReferralStatus};
use crate::models::users::Profile;

/// Records owned by one partner.
#[async_trait]
pub trait PartnerRepository: Send + Sync + 'static {
    async fn referrals(&self, partner_id: &str) -> Result<Vec<Referral>, anyhow::Error>;

    async fn create_referral(
        &self,
        partner_id: &str,
        referral: &NewReferral,
    ) -> Result<Referral, anyhow::Error>;

    async fn commissions(&self, partner_id: &str) -> Result<Vec<Commission>, anyhow::Error>;

    async fn link_stats(&self, partner_id: &str) -> Result<LinkStats, anyhow::Error>;

    async fn profile(&self, partner_id: &str) -> Result<Option<Profile>, anyhow::Error>;
}

#[derive(Default)]
pub struct MockPartnerRepository {
    referrals: DashMap<String, Vec<Referral>>,
    commissions: DashMap<String, Vec<Commission>>,
    link_stats: DashMap<String, LinkStats>,
    profiles: DashMap<String, Profile>,
    next_id: AtomicU64,
}

impl MockPartnerRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Demo records for the seeded partner account.
    pub fn seeded() -> Self {
        let repository = Self::new();
        repository.insert_referrals("2", demo_referrals());
        repository.insert_commissions("2", demo_commissions());
        repository.link_stats.insert(
            "2".to_string(),
            LinkStats {
                clicks: 147,
                conversions: 12,
            },
        );
        repository.insert_profile(Profile {
            id: "2".to_string(),
            name: "Parceiro Teste".to_string(),
            email: "parceiro@teste.com".to_string(),
            phone: Some("(11) 97777-6666".to_string()),
            company: Some("Parceiro Imóveis Ltda".to_string()),
        });

        repository
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn insert_referrals(&self, partner_id: &str, referrals: Vec<Referral>) {
        let highest = referrals.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_id.fetch_max(highest + 1, Ordering::SeqCst);
        self.referrals
            .entry(partner_id.to_string())
            .or_default()
            .extend(referrals);
    }

    pub fn insert_commissions(&self, partner_id: &str, commissions: Vec<Commission>) {
        self.commissions
            .entry(partner_id.to_string())
            .or_default()
            .extend(commissions);
    }
}

#[async_trait]
impl PartnerRepository for MockPartnerRepository {
    async fn referrals(&self, partner_id: &str) -> Result<Vec<Referral>, anyhow::Error> {
        Ok(self
            .referrals
            .get(partner_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn create_referral(
        &self,
        partner_id: &str,
        referral: &NewReferral,
    ) -> Result<Referral, anyhow::Error> {
        let created = Referral {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            client_name: referral.client_name.clone(),
            client_email: referral.client_email.clone(),
            client_phone: referral.client_phone.clone(),
            service: referral.service.clone(),
            status: ReferralStatus::Pending,
            referred_on: Local::now().date_naive(),
            approved_on: None,
            commission_in_cents: 0,
            notes: referral.notes.clone(),
        };

        self.referrals
            .entry(partner_id.to_string())
            .or_default()
            .push(created.clone());

        Ok(created)
    }

    async fn commissions(&self, partner_id: &str) -> Result<Vec<Commission>, anyhow::Error> {
        Ok(self
            .commissions
            .get(partner_id)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }

    async fn link_stats(&self, partner_id: &str) -> Result<LinkStats, anyhow::Error> {
        Ok(self
            .link_stats
            .get(partner_id)
            .map(|s| s.value().clone())
            .unwrap_or_default())
    }

    async fn profile(&self, partner_id: &str) -> Result<Option<Profile>, anyhow::Error> {
        Ok(self.profiles.get(partner_id).map(|p| p.value().clone()))
    }
}

/// Partner endpoints of the portal API. The bearer token scopes every call
/// to the logged-in partner, so `partner_id` is not sent.
pub struct HttpPartnerRepository {
    api: ApiClient,
}

impl HttpPartnerRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PartnerRepository for HttpPartnerRepository {
    async fn referrals(&self, _partner_id: &str) -> Result<Vec<Referral>, anyhow::Error> {
        self.api.get("/partners/indicacoes").await
    }

    async fn create_referral(
        &self,
        _partner_id: &str,
        referral: &NewReferral,
    ) -> Result<Referral, anyhow::Error> {
        self.api.post("/partners/indicacoes", referral).await
    }

    async fn commissions(&self, _partner_id: &str) -> Result<Vec<Commission>, anyhow::Error> {
        self.api.get("/partners/comissoes").await
    }

    async fn link_stats(&self, _partner_id: &str) -> Result<LinkStats, anyhow::Error> {
        self.api.get("/partners/link-unico").await
    }

    async fn profile(&self, _partner_id: &str) -> Result<Option<Profile>, anyhow::Error> {
        self.api.get("/partners/profile").await.map(Some)
    }
}

pub(crate) fn demo_referrals() -> Vec<Referral> {
    vec![
        Referral {
            id: 1,
            client_name: "João Silva".to_string(),
            client_email: "joao@email.com".to_string(),
            client_phone: "(11) 99999-9999".to_string(),
            service: "Projeto Estrutural".to_string(),
            status: ReferralStatus::Approved,
            referred_on: seed_date(2025, 1, 20),
            approved_on: Some(seed_date(2025, 1, 22)),
            commission_in_cents: 85_000,
            notes: "Cliente interessado em projeto residencial".to_string(),
        },
        Referral {
            id: 2,
            client_name: "Maria Santos".to_string(),
            client_email: "maria@email.com".to_string(),
            client_phone: "(11) 88888-8888".to_string(),
            service: "Consultoria".to_string(),
            status: ReferralStatus::Pending,
            referred_on: seed_date(2025, 1, 18),
            approved_on: None,
            commission_in_cents: 0,
            notes: "Aguardando contato da equipe comercial".to_string(),
        },
        Referral {
            id: 3,
            client_name: "Pedro Oliveira".to_string(),
            client_email: "pedro@email.com".to_string(),
            client_phone: "(11) 77777-7777".to_string(),
            service: "Projeto Arquitetônico".to_string(),
            status: ReferralStatus::Rejected,
            referred_on: seed_date(2025, 1, 15),
            approved_on: None,
            commission_in_cents: 0,
            notes: "Cliente não se enquadra nos critérios".to_string(),
        },
    ]
}

pub(crate) fn demo_commissions() -> Vec<Commission> {
    vec![
        Commission {
            id: 1,
            referral_id: 1,
            client_name: "João Silva".to_string(),
            contract_number: "CT001".to_string(),
            contract_in_cents: 1_500_000,
            rate_percent: 5.5,
            commission_in_cents: 82_500,
            status: CommissionStatus::Paid,
            due_on: seed_date(2025, 1, 10),
            paid_on: Some(seed_date(2025, 1, 15)),
        },
        Commission {
            id: 2,
            referral_id: 4,
            client_name: "Ana Costa".to_string(),
            contract_number: "CT002".to_string(),
            contract_in_cents: 2_800_000,
            rate_percent: 6.0,
            commission_in_cents: 168_000,
            status: CommissionStatus::Pending,
            due_on: seed_date(2025, 2, 10),
            paid_on: None,
        },
        Commission {
            id: 3,
            referral_id: 7,
            client_name: "Carlos Santos".to_string(),
            contract_number: "CT003".to_string(),
            contract_in_cents: 1_250_000,
            rate_percent: 5.0,
            commission_in_cents: 62_500,
            status: CommissionStatus::Approved,
            due_on: seed_date(2025, 2, 15),
            paid_on: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_referral() -> NewReferral {
        NewReferral {
            client_name: "Bruna Lima".to_string(),
            client_email: "bruna@email.com".to_string(),
            client_phone: "(11) 95555-5555".to_string(),
            service: "Laudos Técnicos".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn records_are_scoped_by_partner() {
        let repository = MockPartnerRepository::seeded();

        assert_eq!(repository.referrals("2").await.unwrap().len(), 3);
        assert!(repository.referrals("99").await.unwrap().is_empty());
        assert!(repository.commissions("99").await.unwrap().is_empty());
        assert_eq!(repository.link_stats("99").await.unwrap(), LinkStats::default());
    }

    #[tokio::test]
    async fn created_referrals_start_pending_with_fresh_ids() {
        let repository = MockPartnerRepository::seeded();

        let created = repository.create_referral("2", &new_referral()).await.unwrap();

        assert_eq!(created.id, 4);
        assert_eq!(created.status, ReferralStatus::Pending);
        assert_eq!(repository.referrals("2").await.unwrap().len(), 4);
    }
}
