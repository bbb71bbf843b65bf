/// Incident reports (signalements): abandoned waste, full bins, missed pickups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::validators::{is_valid_coordinates, required_description, required_text};

pub const EN_COURS: &str = "EN_COURS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalementType {
    DechetAbandonne,
    PoubellePleine,
    DechetDangereux,
    ProblemeCollecte,
    Autre,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signalement {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSignalement {
    #[serde(rename = "type")]
    pub kind: SignalementType,
    pub description: String,
    pub adresse: String,
    pub ville: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl NewSignalement {
    pub fn validate(&self) -> Result<Self, ValidationError> {
        is_valid_coordinates(self.latitude, self.longitude)?;
        Ok(Self {
            description: required_description(&self.description)?,
            adresse: required_text("adresse", &self.adresse)?,
            ville: required_text("ville", &self.ville)?,
            photo: self.photo.clone().filter(|p| !p.trim().is_empty()),
            ..self.clone()
        })
    }
}

pub async fn list(client: &ApiClient) -> Result<Vec<Signalement>, ApiError> {
    client.get("/api/signalements").await
}

pub async fn create(client: &ApiClient, signalement: &NewSignalement) -> Result<Signalement, ApiError> {
    let signalement = signalement.validate()?;
    client
        .post("/api/signalements", serde_json::to_value(&signalement)?)
        .await
}

pub async fn update<T: Serialize + ?Sized>(
    client: &ApiClient,
    id: i64,
    changes: &T,
) -> Result<Signalement, ApiError> {
    client
        .put(&format!("/api/signalements/{}", id), serde_json::to_value(changes)?)
        .await
}

pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/api/signalements/{}", id)).await
}
