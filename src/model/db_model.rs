use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;

use super::ride::{PaymentMethod, RideRecord};

#[derive(Clone, Debug, FromRow)]
pub struct RideDb {
    pub route: String,
    pub timestamp: DateTime<Utc>,
    pub ridership: f64,
    /// One of "OMNY", "MetroCard" or "No Fare", enforced by a check constraint.
    pub payment_method: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub vehicle_id: Option<String>,
    pub transfers: Option<f64>,
}

impl From<RideDb> for RideRecord {
    fn from(value: RideDb) -> Self {
        RideRecord {
            route: value.route,
            timestamp: value.timestamp,
            ridership_count: value.ridership,
            payment_method: PaymentMethod::from(value.payment_method.as_str()),
            latitude: value.latitude,
            longitude: value.longitude,
            vehicle_id: value.vehicle_id,
            transfers: value.transfers,
        }
    }
}
