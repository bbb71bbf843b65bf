/// Aggregate figures for the admin dashboard

use serde::Serialize;

use crate::api::dechets::{self, statut, Dechet};
use crate::api::signalements::{self, Signalement, EN_COURS};
use crate::api::users::{self, Role, User};
use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DechetBreakdown {
    pub en_attente: usize,
    pub collecte: usize,
    pub traite: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_dechets: usize,
    pub total_signalements: usize,
    pub dechets_en_attente: usize,
    pub signalements_en_cours: usize,
    pub collecteurs: usize,
    pub admins: usize,
    pub dechets_par_statut: DechetBreakdown,
}

impl DashboardStats {
    pub fn compute(users: &[User], dechets: &[Dechet], signalements: &[Signalement]) -> Self {
        let count_dechets = |wanted: &str| dechets.iter().filter(|d| d.statut() == wanted).count();
        let count_role = |wanted: Role| users.iter().filter(|u| u.role == wanted).count();
        let breakdown = DechetBreakdown {
            en_attente: count_dechets(statut::EN_ATTENTE),
            collecte: count_dechets(statut::COLLECTE),
            traite: count_dechets(statut::TRAITE),
        };

        Self {
            total_users: users.len(),
            total_dechets: dechets.len(),
            total_signalements: signalements.len(),
            dechets_en_attente: breakdown.en_attente,
            signalements_en_cours: signalements
                .iter()
                .filter(|s| s.statut.as_deref() == Some(EN_COURS))
                .count(),
            collecteurs: count_role(Role::Collector),
            admins: count_role(Role::Admin),
            dechets_par_statut: breakdown,
        }
    }
}

/// Load users, waste items and reports concurrently and aggregate them
pub async fn fetch_stats(client: &ApiClient) -> Result<DashboardStats, ApiError> {
    let (users, dechets, signalements) = futures::try_join!(
        users::list(client),
        dechets::list(client),
        signalements::list(client)
    )?;
    Ok(DashboardStats::compute(&users, &dechets, &signalements))
}
