/// Proximity search around a GPS position

use serde::{Deserialize, Serialize};

use crate::api::dechets::Dechet;
use crate::api::signalements::Signalement;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;
use crate::validators::is_valid_coordinates;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProximityKind {
    All,
    #[default]
    Dechets,
    Signalements,
}

impl ProximityKind {
    fn as_str(self) -> &'static str {
        match self {
            ProximityKind::All => "all",
            ProximityKind::Dechets => "dechets",
            ProximityKind::Signalements => "signalements",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Proximite {
    pub dechets: Vec<Dechet>,
    pub signalements: Vec<Signalement>,
}

// The backend may send null or omit either list
#[derive(Deserialize)]
struct ProximiteBody {
    #[serde(default)]
    dechets: Option<Vec<Dechet>>,
    #[serde(default)]
    signalements: Option<Vec<Signalement>>,
}

/// Items within `radius_km` of the position. Without a full position nothing is requested.
pub async fn nearby(
    client: &ApiClient,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_km: f64,
    kind: ProximityKind,
) -> Result<Proximite, ApiError> {
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => (latitude, longitude),
        _ => return Ok(Proximite::default()),
    };
    is_valid_coordinates(Some(latitude), Some(longitude))?;

    let request = ApiRequest::get("/api/geo/proximite")
        .with_query("latitude", latitude)
        .with_query("longitude", longitude)
        .with_query("rayon", radius_km)
        .with_query("type", kind.as_str());
    let body: ProximiteBody = client.fetch(request).await?;

    Ok(Proximite {
        dechets: body.dechets.unwrap_or_default(),
        signalements: body.signalements.unwrap_or_default(),
    })
}
