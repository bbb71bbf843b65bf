/// Waste items (déchets) reported by citizens

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::validators::{is_valid_coordinates, is_valid_quantity, required_text};

pub mod statut {
    pub const EN_ATTENTE: &str = "EN_ATTENTE";
    pub const COLLECTE: &str = "COLLECTE";
    pub const TRAITE: &str = "TRAITE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DechetType {
    Plastique,
    Papier,
    Metal,
    Verre,
    Dangereux,
    Organique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dechet {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub quantite: f64,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dechet {
    /// Items without a status are still waiting for pickup
    pub fn statut(&self) -> &str {
        self.statut.as_deref().unwrap_or(statut::EN_ATTENTE)
    }
}

/// A new waste report. Coordinates and photo are only sent when present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDechet {
    #[serde(rename = "type")]
    pub kind: DechetType,
    pub quantite: f64,
    pub adresse: String,
    pub ville: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl NewDechet {
    pub fn validate(&self) -> Result<Self, ValidationError> {
        is_valid_quantity(self.quantite)?;
        is_valid_coordinates(self.latitude, self.longitude)?;
        Ok(Self {
            adresse: required_text("adresse", &self.adresse)?,
            ville: required_text("ville", &self.ville)?,
            photo: self.photo.clone().filter(|p| !p.trim().is_empty()),
            ..self.clone()
        })
    }
}

pub async fn list(client: &ApiClient) -> Result<Vec<Dechet>, ApiError> {
    client.get("/api/dechets").await
}

pub async fn create(client: &ApiClient, dechet: &NewDechet) -> Result<Dechet, ApiError> {
    let dechet = dechet.validate()?;
    client.post("/api/dechets", serde_json::to_value(&dechet)?).await
}

pub async fn update<T: Serialize + ?Sized>(
    client: &ApiClient,
    id: i64,
    changes: &T,
) -> Result<Dechet, ApiError> {
    client
        .put(&format!("/api/dechets/{}", id), serde_json::to_value(changes)?)
        .await
}

pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/api/dechets/{}", id)).await
}

/// Group items by status, in status order
pub fn group_by_statut(dechets: &[Dechet]) -> BTreeMap<String, Vec<Dechet>> {
    let mut grouped: BTreeMap<String, Vec<Dechet>> = BTreeMap::new();
    for dechet in dechets {
        grouped
            .entry(dechet.statut().to_string())
            .or_default()
            .push(dechet.clone());
    }
    grouped
}
