use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::try_join;
use reqwest::Url;
use serde::Serialize;

use super::dashboard::month_key;
use super::ServiceError;
use crate::models::commissions::{Commission, CommissionStatus};
use crate::models::referrals::{NewReferral, Referral, ReferralStatus};
use crate::models::reports::{Distribution, MonthlyPoint};
use crate::models::users::{Identity, Profile};
use crate::repositories::partners::PartnerRepository;

const QR_CODE_SERVICE: &str = "https://api.qrserver.com/v1/create-qr-code/";
const RECENT_REFERRALS: usize = 5;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerOverview {
    pub total_referrals: usize,
    pub approved_referrals: usize,
    pub total_commission_in_cents: i64,
    pub month_commission_in_cents: i64,
    pub recent_referrals: Vec<Referral>,
    pub monthly: Vec<MonthlyPoint>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerReferrals {
    pub referrals: Vec<Referral>,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerCommissions {
    pub commissions: Vec<Commission>,
    pub total_in_cents: i64,
    pub paid_in_cents: i64,
    pub pending_in_cents: i64,
    pub approved_in_cents: i64,
    pub next_payment: Option<Commission>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerReports {
    pub referrals_by_month: Vec<MonthlyPoint>,
    pub commissions_by_month: Vec<MonthlyPoint>,
    pub status_distribution: Vec<Distribution>,
    pub referrals_by_service: Vec<Distribution>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLink {
    pub url: String,
    pub qr_code_url: String,
    pub clicks: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

#[derive(Clone)]
pub struct PartnerDashboard {
    repository: Arc<dyn PartnerRepository>,
    public_url: String,
}

impl PartnerDashboard {
    pub fn new(repository: Arc<dyn PartnerRepository>, public_url: &str) -> Self {
        Self {
            repository,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    async fn records(&self, partner: &Identity) -> Result<(Vec<Referral>, Vec<Commission>), ServiceError> {
        try_join(
            async {
                self.repository
                    .referrals(&partner.id)
                    .await
                    .map_err(|e| ServiceError::fetch("referrals", e))
            },
            async {
                self.repository
                    .commissions(&partner.id)
                    .await
                    .map_err(|e| ServiceError::fetch("commissions", e))
            },
        )
        .await
    }

    pub async fn overview(
        &self,
        partner: &Identity,
        today: NaiveDate,
    ) -> Result<PartnerOverview, ServiceError> {
        let (mut referrals, commissions) = self.records(partner).await?;
        newest_first(&mut referrals);

        let this_month = month_key(today);
        let month_commission_in_cents = commissions
            .iter()
            .filter(|c| c.status == CommissionStatus::Paid)
            .filter(|c| c.paid_on.map(month_key).as_deref() == Some(this_month.as_str()))
            .map(|c| c.commission_in_cents)
            .sum();

        let mut monthly: BTreeMap<String, MonthlyPoint> = BTreeMap::new();
        for referral in &referrals {
            month_entry(&mut monthly, referral.referred_on).add("referrals", 1);
        }
        for commission in earning(&commissions) {
            month_entry(&mut monthly, earned_on(commission))
                .add("commissionsInCents", commission.commission_in_cents);
        }

        Ok(PartnerOverview {
            total_referrals: referrals.len(),
            approved_referrals: count_status(&referrals, ReferralStatus::Approved),
            total_commission_in_cents: earning(&commissions).map(|c| c.commission_in_cents).sum(),
            month_commission_in_cents,
            recent_referrals: referrals.into_iter().take(RECENT_REFERRALS).collect(),
            monthly: monthly.into_values().collect(),
        })
    }

    pub async fn referrals(&self, partner: &Identity) -> Result<PartnerReferrals, ServiceError> {
        let mut referrals = self
            .repository
            .referrals(&partner.id)
            .await
            .map_err(|e| ServiceError::fetch("referrals", e))?;
        newest_first(&mut referrals);

        Ok(PartnerReferrals {
            pending: count_status(&referrals, ReferralStatus::Pending),
            approved: count_status(&referrals, ReferralStatus::Approved),
            rejected: count_status(&referrals, ReferralStatus::Rejected),
            referrals,
        })
    }

    pub async fn create_referral(
        &self,
        partner: &Identity,
        referral: &NewReferral,
    ) -> Result<Referral, ServiceError> {
        referral.validate().map_err(ServiceError::Validation)?;

        let created = self
            .repository
            .create_referral(&partner.id, referral)
            .await
            .map_err(|e| ServiceError::fetch("referrals", e))?;

        log::info!("Partner {} referred {}.", partner.id, created.client_name);
        Ok(created)
    }

    pub async fn commissions(&self, partner: &Identity) -> Result<PartnerCommissions, ServiceError> {
        let commissions = self
            .repository
            .commissions(&partner.id)
            .await
            .map_err(|e| ServiceError::fetch("commissions", e))?;

        Ok(summarize_commissions(commissions))
    }

    pub async fn reports(&self, partner: &Identity) -> Result<PartnerReports, ServiceError> {
        let (referrals, commissions) = self.records(partner).await?;

        let mut referrals_by_month: BTreeMap<String, MonthlyPoint> = BTreeMap::new();
        let mut by_service: HashMap<&str, i64> = HashMap::new();
        for referral in &referrals {
            let point = month_entry(&mut referrals_by_month, referral.referred_on);
            point.add("total", 1);
            match referral.status {
                ReferralStatus::Approved => point.add("approved", 1),
                ReferralStatus::Rejected => point.add("rejected", 1),
                ReferralStatus::Pending => {}
            }
            *by_service.entry(referral.service.as_str()).or_insert(0) += 1;
        }

        let mut commissions_by_month: BTreeMap<String, MonthlyPoint> = BTreeMap::new();
        for commission in earning(&commissions) {
            month_entry(&mut commissions_by_month, earned_on(commission))
                .add("amountInCents", commission.commission_in_cents);
        }

        let status_distribution = [
            ReferralStatus::Approved,
            ReferralStatus::Pending,
            ReferralStatus::Rejected,
        ]
        .into_iter()
        .map(|status| Distribution {
            label: status.as_str().to_string(),
            value: count_status(&referrals, status) as i64,
        })
        .collect();

        let mut referrals_by_service: Vec<Distribution> = by_service
            .into_iter()
            .map(|(service, value)| Distribution {
                label: service.to_string(),
                value,
            })
            .collect();
        referrals_by_service.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));

        Ok(PartnerReports {
            referrals_by_month: referrals_by_month.into_values().collect(),
            commissions_by_month: commissions_by_month.into_values().collect(),
            status_distribution,
            referrals_by_service,
        })
    }

    /// The stored profile, or one made from the session identity.
    pub async fn profile(&self, partner: &Identity) -> Result<Profile, ServiceError> {
        let profile = self
            .repository
            .profile(&partner.id)
            .await
            .map_err(|e| ServiceError::fetch("profile", e))?;

        Ok(profile.unwrap_or_else(|| Profile::from(partner)))
    }

    pub async fn link(&self, partner: &Identity) -> Result<PartnerLink, ServiceError> {
        let stats = self
            .repository
            .link_stats(&partner.id)
            .await
            .map_err(|e| ServiceError::fetch("link statistics", e))?;

        let url = format!("{}/indicacao/{}", self.public_url, partner.id);
        let qr_code_url =
            Url::parse_with_params(QR_CODE_SERVICE, &[("size", "200x200"), ("data", url.as_str())])
                .map_err(|e| ServiceError::Internal(e.to_string()))?
                .to_string();

        let conversion_rate = if stats.clicks == 0 {
            0.0
        } else {
            (stats.conversions as f64 / stats.clicks as f64 * 1000.0).round() / 10.0
        };

        Ok(PartnerLink {
            url,
            qr_code_url,
            clicks: stats.clicks,
            conversions: stats.conversions,
            conversion_rate,
        })
    }
}

fn newest_first(referrals: &mut [Referral]) {
    referrals.sort_by(|a, b| b.referred_on.cmp(&a.referred_on).then(b.id.cmp(&a.id)));
}

fn count_status(referrals: &[Referral], status: ReferralStatus) -> usize {
    referrals.iter().filter(|r| r.status == status).count()
}

fn earning(commissions: &[Commission]) -> impl Iterator<Item = &Commission> {
    commissions
        .iter()
        .filter(|c| c.status != CommissionStatus::Cancelled)
}

fn earned_on(commission: &Commission) -> NaiveDate {
    commission.paid_on.unwrap_or(commission.due_on)
}

fn month_entry(points: &mut BTreeMap<String, MonthlyPoint>, date: NaiveDate) -> &mut MonthlyPoint {
    let key = month_key(date);
    points
        .entry(key.clone())
        .or_insert_with(|| MonthlyPoint::new(key))
}

fn sum_status(commissions: &[Commission], status: CommissionStatus) -> i64 {
    commissions
        .iter()
        .filter(|c| c.status == status)
        .map(|c| c.commission_in_cents)
        .sum()
}

fn summarize_commissions(commissions: Vec<Commission>) -> PartnerCommissions {
    let total_in_cents: i64 = earning(&commissions).map(|c| c.commission_in_cents).sum();
    let paid_in_cents = sum_status(&commissions, CommissionStatus::Paid);
    let pending_in_cents = sum_status(&commissions, CommissionStatus::Pending);

    let next_payment = commissions
        .iter()
        .filter(|c| c.status == CommissionStatus::Pending)
        .min_by_key(|c| c.due_on)
        .cloned();

    PartnerCommissions {
        total_in_cents,
        paid_in_cents,
        pending_in_cents,
        approved_in_cents: total_in_cents - paid_in_cents - pending_in_cents,
        next_payment,
        commissions,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::referrals::LinkStats;
    use crate::models::users::Role;
    use crate::repositories::api::ApiError;
    use crate::repositories::partners::MockPartnerRepository;
    use crate::repositories::seed_date;

    fn partner() -> Identity {
        Identity {
            id: "2".to_string(),
            email: "parceiro@teste.com".to_string(),
            display_name: "Parceiro Teste".to_string(),
            role: Role::Partner,
        }
    }

    fn dashboard() -> PartnerDashboard {
        PartnerDashboard::new(Arc::new(MockPartnerRepository::seeded()), "https://portal.piac.eng.br/")
    }

    struct Unreachable {
        unauthorized: bool,
    }

    impl Unreachable {
        fn error(&self) -> anyhow::Error {
            if self.unauthorized {
                ApiError::Unauthorized.into()
            } else {
                anyhow::anyhow!("connection refused")
            }
        }
    }

    #[async_trait]
    impl PartnerRepository for Unreachable {
        async fn referrals(&self, _: &str) -> Result<Vec<Referral>, anyhow::Error> {
            Err(self.error())
        }

        async fn create_referral(&self, _: &str, _: &NewReferral) -> Result<Referral, anyhow::Error> {
            Err(self.error())
        }

        async fn commissions(&self, _: &str) -> Result<Vec<Commission>, anyhow::Error> {
            Err(self.error())
        }

        async fn link_stats(&self, _: &str) -> Result<LinkStats, anyhow::Error> {
            Err(self.error())
        }

        async fn profile(&self, _: &str) -> Result<Option<Profile>, anyhow::Error> {
            Err(self.error())
        }
    }

    #[tokio::test]
    async fn overview_aggregates_the_partner_records() {
        let overview = dashboard()
            .overview(&partner(), seed_date(2025, 1, 28))
            .await
            .unwrap();

        assert_eq!(overview.total_referrals, 3);
        assert_eq!(overview.approved_referrals, 1);
        assert_eq!(overview.total_commission_in_cents, 82_500 + 168_000 + 62_500);
        assert_eq!(overview.month_commission_in_cents, 82_500);
        assert_eq!(overview.recent_referrals[0].client_name, "João Silva");
        assert_eq!(overview.monthly.len(), 2);
        assert_eq!(overview.monthly[0].month, "2025-01");
        assert_eq!(overview.monthly[0].get("referrals"), 3);
        assert_eq!(overview.monthly[1].get("commissionsInCents"), 168_000 + 62_500);
    }

    #[tokio::test]
    async fn referrals_are_listed_newest_first() {
        let listing = dashboard().referrals(&partner()).await.unwrap();

        let ids: Vec<u64> = listing.referrals.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!((listing.pending, listing.approved, listing.rejected), (1, 1, 1));
    }

    #[tokio::test]
    async fn invalid_referrals_are_rejected_before_storage() {
        let referral = NewReferral {
            client_name: "Sem Email".to_string(),
            client_email: "sem-email".to_string(),
            client_phone: "1".to_string(),
            service: "Consultoria".to_string(),
            notes: String::new(),
        };

        let err = dashboard().create_referral(&partner(), &referral).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn approved_is_what_remains_after_paid_and_pending() {
        let mut commissions = crate::repositories::partners::demo_commissions();
        let mut cancelled = commissions[0].clone();
        cancelled.id = 9;
        cancelled.status = CommissionStatus::Cancelled;
        commissions.push(cancelled);

        let summary = summarize_commissions(commissions);

        assert_eq!(summary.total_in_cents, 313_000);
        assert_eq!(summary.paid_in_cents, 82_500);
        assert_eq!(summary.pending_in_cents, 168_000);
        assert_eq!(summary.approved_in_cents, 62_500);
        assert_eq!(summary.next_payment.map(|c| c.id), Some(2));
    }

    #[tokio::test]
    async fn reports_group_by_month_and_service() {
        let reports = dashboard().reports(&partner()).await.unwrap();

        assert_eq!(reports.referrals_by_month.len(), 1);
        let january = &reports.referrals_by_month[0];
        assert_eq!(january.get("total"), 3);
        assert_eq!(january.get("approved"), 1);
        assert_eq!(january.get("rejected"), 1);
        assert_eq!(reports.commissions_by_month.len(), 2);
        assert_eq!(reports.status_distribution.iter().map(|d| d.value).sum::<i64>(), 3);
        assert_eq!(reports.referrals_by_service.len(), 3);
        assert_eq!(reports.referrals_by_service[0].label, "Consultoria");
    }

    #[tokio::test]
    async fn link_points_at_the_partner() {
        let link = dashboard().link(&partner()).await.unwrap();

        assert_eq!(link.url, "https://portal.piac.eng.br/indicacao/2");
        assert!(link.qr_code_url.starts_with(QR_CODE_SERVICE));
        assert!(link.qr_code_url.contains("data=https%3A%2F%2Fportal.piac.eng.br%2Findicacao%2F2"));
        assert_eq!(link.conversion_rate, 8.2);
    }

    #[tokio::test]
    async fn profile_carries_the_partner_company() {
        let profile = dashboard().profile(&partner()).await.unwrap();

        assert_eq!(profile.company.as_deref(), Some("Parceiro Imóveis Ltda"));
        assert_eq!(profile.email, "parceiro@teste.com");
    }

    #[tokio::test]
    async fn fetch_failures_and_rejected_tokens_are_told_apart() {
        let failing = PartnerDashboard::new(Arc::new(Unreachable { unauthorized: false }), "");
        let rejected = PartnerDashboard::new(Arc::new(Unreachable { unauthorized: true }), "");

        assert!(matches!(
            failing.commissions(&partner()).await,
            Err(ServiceError::DataFetch(..))
        ));
        assert!(matches!(
            rejected.overview(&partner(), seed_date(2025, 1, 1)).await,
            Err(ServiceError::Unauthenticated)
        ));
    }
}
