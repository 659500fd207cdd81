use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Distance collaborator consumed by the travel-fee input. Implementations
/// wrap whatever routing/geocoding backend the host uses; the engine only
/// ever asks for one-way miles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn distance_miles(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<f64, ServiceError>;
}

/// Great-circle distance in statute miles. Adequate for travel-fee zoning;
/// hosts wanting road distance supply their own provider.
pub struct HaversineDistanceProvider;

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[async_trait]
impl DistanceProvider for HaversineDistanceProvider {
    async fn distance_miles(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<f64, ServiceError> {
        Ok(haversine_miles(origin, destination))
    }
}

fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}
