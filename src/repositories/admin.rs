use async_trait::async_trait;
use dashmap::DashMap;

use super::api::{ApiClient, ApiError};
use super::clients::demo_contracts;
use super::partners::{demo_commissions, demo_referrals};
use super::seed_date;
use crate::models::admin::{Activity, ActivityKind, AdminSummary};
use crate::models::commissions::Commission;
use crate::models::contracts::Contract;
use crate::models::referrals::Referral;
use crate::models::reports::MonthlyPoint;

#[async_trait]
pub trait AdminRepository: Send + Sync + 'static {
    async fn summary(&self) -> Result<AdminSummary, anyhow::Error>;

    async fn contracts(&self) -> Result<Vec<Contract>, anyhow::Error>;

    async fn commissions(&self) -> Result<Vec<Commission>, anyhow::Error>;

    async fn referrals(&self) -> Result<Vec<Referral>, anyhow::Error>;

    /// `Ok(false)` means there is no such partner.
    async fn approve_partner(&self, partner_id: &str) -> Result<bool, anyhow::Error>;
}

pub struct MockAdminRepository {
    summary: AdminSummary,
    contracts: Vec<Contract>,
    commissions: Vec<Commission>,
    referrals: Vec<Referral>,
    /// Partner id to approval flag.
    partners: DashMap<String, bool>,
}

impl MockAdminRepository {
    pub fn new(
        summary: AdminSummary,
        contracts: Vec<Contract>,
        commissions: Vec<Commission>,
        referrals: Vec<Referral>,
    ) -> Self {
        Self {
            summary,
            contracts,
            commissions,
            referrals,
            partners: DashMap::new(),
        }
    }

    pub fn seeded() -> Self {
        let repository = Self::new(
            demo_summary(),
            demo_contracts(),
            demo_commissions(),
            demo_referrals(),
        );
        repository.partners.insert("2".to_string(), true);
        repository.partners.insert("5".to_string(), false);

        repository
    }

    pub fn is_approved(&self, partner_id: &str) -> bool {
        self.partners.get(partner_id).map(|p| *p).unwrap_or(false)
    }
}

#[async_trait]
impl AdminRepository for MockAdminRepository {
    async fn summary(&self) -> Result<AdminSummary, anyhow::Error> {
        Ok(self.summary.clone())
    }

    async fn contracts(&self) -> Result<Vec<Contract>, anyhow::Error> {
        Ok(self.contracts.clone())
    }

    async fn commissions(&self) -> Result<Vec<Commission>, anyhow::Error> {
        Ok(self.commissions.clone())
    }

    async fn referrals(&self) -> Result<Vec<Referral>, anyhow::Error> {
        Ok(self.referrals.clone())
    }

    async fn approve_partner(&self, partner_id: &str) -> Result<bool, anyhow::Error> {
        match self.partners.get_mut(partner_id) {
            Some(mut approved) => {
                *approved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct HttpAdminRepository {
    api: ApiClient,
}

impl HttpAdminRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AdminRepository for HttpAdminRepository {
    async fn summary(&self) -> Result<AdminSummary, anyhow::Error> {
        self.api.get("/admin/dashboard").await
    }

    async fn contracts(&self) -> Result<Vec<Contract>, anyhow::Error> {
        self.api.get("/admin/contratos").await
    }

    async fn commissions(&self) -> Result<Vec<Commission>, anyhow::Error> {
        self.api.get("/admin/comissoes").await
    }

    async fn referrals(&self) -> Result<Vec<Referral>, anyhow::Error> {
        self.api.get("/admin/indicacoes").await
    }

    async fn approve_partner(&self, partner_id: &str) -> Result<bool, anyhow::Error> {
        match self.api.patch(&format!("/admin/partners/{}/approve", partner_id)).await {
            Ok(()) => Ok(true),
            Err(e) => match e.downcast_ref::<ApiError>() {
                Some(ApiError::Status(404, _)) => Ok(false),
                _ => Err(e),
            },
        }
    }
}

fn demo_summary() -> AdminSummary {
    let month = |label: &str, contracts: i64, revenue: i64, commissions: i64| {
        let mut point = MonthlyPoint::new(label);
        point.add("contracts", contracts);
        point.add("revenueInCents", revenue * 100);
        point.add("commissionsInCents", commissions * 100);
        point
    };

    AdminSummary {
        total_contracts: 127,
        active_contracts: 45,
        total_partners: 23,
        commissions_paid_in_cents: 4_542_050,
        revenue_in_cents: 89_065_000,
        recent_activities: vec![
            Activity {
                id: 1,
                kind: ActivityKind::Contract,
                description: "Novo contrato assinado - João Silva".to_string(),
                date: seed_date(2025, 1, 25),
                amount_in_cents: Some(2_500_000),
            },
            Activity {
                id: 2,
                kind: ActivityKind::Referral,
                description: "Nova indicação - Parceiro Maria Santos".to_string(),
                date: seed_date(2025, 1, 24),
                amount_in_cents: None,
            },
            Activity {
                id: 3,
                kind: ActivityKind::Commission,
                description: "Comissão paga - Parceiro Pedro Costa".to_string(),
                date: seed_date(2025, 1, 23),
                amount_in_cents: Some(125_000),
            },
            Activity {
                id: 4,
                kind: ActivityKind::Partner,
                description: "Novo parceiro aprovado - Ana Lima".to_string(),
                date: seed_date(2025, 1, 22),
                amount_in_cents: None,
            },
        ],
        monthly: vec![
            month("2025-01", 12, 180_000, 7_200),
            month("2025-02", 15, 225_000, 9_000),
            month("2025-03", 18, 270_000, 10_800),
            month("2025-04", 10, 150_000, 6_000),
            month("2025-05", 22, 330_000, 13_200),
            month("2025-06", 16, 240_000, 9_600),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn approving_marks_the_partner() {
        let repository = MockAdminRepository::seeded();
        assert!(!repository.is_approved("5"));

        assert!(repository.approve_partner("5").await.unwrap());

        assert!(repository.is_approved("5"));
        assert!(!repository.approve_partner("404").await.unwrap());
    }
}
