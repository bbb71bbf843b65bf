/// Collections (collectes): pickups assigned to and validated by collectors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::dechets::{statut, Dechet};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collecte {
    pub id: i64,
    pub statut: String,
    #[serde(default)]
    pub dechet: Option<Dechet>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Collecte {
    fn last_change(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Pickups waiting for a collector
pub async fn pending(client: &ApiClient) -> Result<Vec<Collecte>, ApiError> {
    client.get("/api/collectes/en-attente").await
}

/// Mark a pickup as collected
pub async fn validate(client: &ApiClient, id: i64) -> Result<Collecte, ApiError> {
    client
        .fetch(ApiRequest::put(format!("/api/collectes/{}/valider", id)))
        .await
}

pub async fn by_status(client: &ApiClient, status: &str) -> Result<Vec<Collecte>, ApiError> {
    client
        .fetch(ApiRequest::get("/api/collectes").with_query("status", status))
        .await
}

/// Collected and processed pickups, most recent first
pub async fn history(client: &ApiClient) -> Result<Vec<Collecte>, ApiError> {
    let (collected, processed) = futures::try_join!(
        by_status(client, statut::COLLECTE),
        by_status(client, statut::TRAITE)
    )?;
    Ok(merge_history(collected, processed))
}

/// Merge two lists sorted newest first by last change; undated entries go last
pub fn merge_history(collected: Vec<Collecte>, processed: Vec<Collecte>) -> Vec<Collecte> {
    let mut merged: Vec<Collecte> = collected.into_iter().chain(processed).collect();
    merged.sort_by(|a, b| b.last_change().cmp(&a.last_change()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn collecte(id: i64, created: Option<u32>, updated: Option<u32>) -> Collecte {
        let at = |day: u32| Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap();
        Collecte {
            id,
            statut: statut::COLLECTE.to_string(),
            dechet: None,
            created_at: created.map(at),
            updated_at: updated.map(at),
        }
    }

    #[test]
    fn test_history_is_newest_first_using_update_time() {
        let merged = merge_history(
            vec![collecte(1, Some(1), Some(10)), collecte(2, Some(5), None)],
            vec![collecte(3, Some(2), Some(7)), collecte(4, None, None)],
        );

        let ids: Vec<i64> = merged.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_deserialize_with_nested_dechet() {
        let parsed: Collecte = serde_json::from_value(serde_json::json!({
            "id": 9,
            "statut": "EN_ATTENTE",
            "dechet": { "id": 3, "type": "PAPIER", "quantite": 4 },
            "updatedAt": "2024-05-03T12:30:00Z"
        }))
        .unwrap();
        assert_eq!(parsed.dechet.unwrap().id, 3);
        assert!(parsed.updated_at.is_some());
    }
}
