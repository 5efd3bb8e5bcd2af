use std::sync::Arc;

use futures_util::future::try_join;
use serde::Serialize;

use super::ServiceError;
use crate::models::admin::AdminSummary;
use crate::models::commissions::Commission;
use crate::models::contracts::{Contract, ContractStatus};
use crate::models::referrals::Referral;
use crate::models::reports::Distribution;
use crate::repositories::admin::AdminRepository;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    #[serde(flatten)]
    pub summary: AdminSummary,
    pub contract_status: Vec<Distribution>,
}

#[derive(Clone)]
pub struct AdminDashboard {
    repository: Arc<dyn AdminRepository>,
}

impl AdminDashboard {
    pub fn new(repository: Arc<dyn AdminRepository>) -> Self {
        Self { repository }
    }

    pub async fn overview(&self) -> Result<AdminOverview, ServiceError> {
        let (mut summary, contracts) = try_join(
            async {
                self.repository
                    .summary()
                    .await
                    .map_err(|e| ServiceError::fetch("dashboard", e))
            },
            async {
                self.repository
                    .contracts()
                    .await
                    .map_err(|e| ServiceError::fetch("contracts", e))
            },
        )
        .await?;

        summary
            .recent_activities
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        let contract_status = [
            ContractStatus::InProgress,
            ContractStatus::AwaitingApproval,
            ContractStatus::Completed,
        ]
        .into_iter()
        .map(|status| Distribution {
            label: status.as_str().to_string(),
            value: contracts.iter().filter(|c| c.status == status).count() as i64,
        })
        .collect();

        Ok(AdminOverview {
            summary,
            contract_status,
        })
    }

    pub async fn contracts(&self, status: Option<&str>) -> Result<Vec<Contract>, ServiceError> {
        let contracts = self
            .repository
            .contracts()
            .await
            .map_err(|e| ServiceError::fetch("contracts", e))?;

        Ok(with_status(contracts, status, |c| c.status.as_str()))
    }

    pub async fn commissions(&self, status: Option<&str>) -> Result<Vec<Commission>, ServiceError> {
        let commissions = self
            .repository
            .commissions()
            .await
            .map_err(|e| ServiceError::fetch("commissions", e))?;

        Ok(with_status(commissions, status, |c| c.status.as_str()))
    }

    pub async fn referrals(&self, status: Option<&str>) -> Result<Vec<Referral>, ServiceError> {
        let referrals = self
            .repository
            .referrals()
            .await
            .map_err(|e| ServiceError::fetch("referrals", e))?;

        Ok(with_status(referrals, status, |r| r.status.as_str()))
    }

    pub async fn approve_partner(&self, partner_id: &str) -> Result<(), ServiceError> {
        let found = self
            .repository
            .approve_partner(partner_id)
            .await
            .map_err(|e| ServiceError::fetch("partner", e))?;
        if !found {
            return Err(ServiceError::NotFound(format!("partner {}", partner_id)));
        }

        log::info!("Approved partner {}.", partner_id);
        Ok(())
    }
}

fn with_status<T>(records: Vec<T>, status: Option<&str>, status_of: impl Fn(&T) -> &'static str) -> Vec<T> {
    match status {
        Some(wanted) => records
            .into_iter()
            .filter(|record| status_of(record) == wanted)
            .collect(),
        None => records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::admin::MockAdminRepository;

    fn dashboard() -> AdminDashboard {
        AdminDashboard::new(Arc::new(MockAdminRepository::seeded()))
    }

    #[tokio::test]
    async fn overview_counts_contracts_by_status() {
        let overview = dashboard().overview().await.unwrap();

        assert_eq!(overview.summary.total_partners, 23);
        let counts: Vec<i64> = overview.contract_status.iter().map(|d| d.value).collect();
        assert_eq!(counts, vec![1, 1, 1]);
        assert_eq!(overview.summary.recent_activities[0].id, 1);

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["totalContracts"], 127);
        assert!(json["contractStatus"].is_array());
    }

    #[tokio::test]
    async fn listings_filter_by_status() {
        let dashboard = dashboard();

        assert_eq!(dashboard.contracts(None).await.unwrap().len(), 3);
        assert_eq!(dashboard.contracts(Some("completed")).await.unwrap().len(), 1);
        assert_eq!(dashboard.commissions(Some("paid")).await.unwrap().len(), 1);
        assert_eq!(dashboard.referrals(Some("pending")).await.unwrap()[0].id, 2);
        assert!(dashboard.referrals(Some("archived")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approving_an_unknown_partner_fails() {
        let dashboard = dashboard();

        assert!(dashboard.approve_partner("5").await.is_ok());
        assert!(matches!(
            dashboard.approve_partner("404").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
