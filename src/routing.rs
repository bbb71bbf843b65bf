use serde::{Deserialize, Serialize};

use crate::configuration::RoutingSettings;
use crate::error::{NetworkError, RoutingError};

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

/// A `(latitude, longitude)` pair
pub type LatLon = (f64, f64);

/// Client for the OpenRouteService directions API, used to draw a
/// collector's route to a pickup.
#[derive(Clone)]
pub struct RoutingClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RoutingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct DirectionsRequest {
    /// OpenRouteService expects `[longitude, latitude]`
    coordinates: [[f64; 2]; 2],
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

impl RoutingClient {
    pub fn new(base_url: String, api_key: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_settings(settings: &RoutingSettings) -> Result<Self, RoutingError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(NetworkError::from)?;
        Ok(Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            http_client,
        ))
    }

    /// Driving route from `start` to `end`, as `(latitude, longitude)` points
    pub async fn directions(&self, start: LatLon, end: LatLon) -> Result<Vec<LatLon>, RoutingError> {
        let url = format!("{}{}", self.base_url, DIRECTIONS_PATH);
        let request = DirectionsRequest {
            coordinates: [[start.1, start.0], [end.1, end.0]],
        };

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to request directions: {}", e);
                NetworkError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Directions service returned error");
            return Err(RoutingError::Status { status, body });
        }

        let directions: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Decode(e.to_string()))?;

        route_points(directions)
    }
}

fn route_points(directions: DirectionsResponse) -> Result<Vec<LatLon>, RoutingError> {
    let feature = directions
        .features
        .into_iter()
        .next()
        .ok_or(RoutingError::NoRoute)?;

    Ok(feature
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| (lat, lon))
        .collect())
}
