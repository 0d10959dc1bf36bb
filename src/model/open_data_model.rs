use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use super::ride::{PaymentMethod, RideRecord};
use crate::utils::lenient_count;

/// A row of the MTA bus hourly ridership dataset (data.ny.gov `gxb3-akrn`).
///
/// The feed sends every value as a string and omits empty columns.
#[derive(Debug, Default, Deserialize)]
pub struct OpenDataRide {
    pub bus_route: Option<String>,
    /// Floating local time, e.g. "2024-01-01T08:00:00.000"
    pub transit_timestamp: Option<String>,
    /// "omny" or "metrocard"
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ridership: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub transfers: f64,
}

impl OpenDataRide {
    /// Fails when the row has no route or no usable timestamp.
    pub fn try_into_ride_record(self, timezone: Tz) -> anyhow::Result<RideRecord> {
        let route = self
            .bus_route
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| anyhow!("row without a bus route"))?;

        let raw_timestamp = self
            .transit_timestamp
            .ok_or_else(|| anyhow!("row for route {route} without a timestamp"))?;
        let timestamp = parse_transit_timestamp(&raw_timestamp, timezone)?;

        // The feed only distinguishes omny and metrocard. Rows with any other
        // or no payment method are riders without a recorded fare, not
        // unknown methods.
        let payment_method = match self.payment_method.as_deref().map(PaymentMethod::from) {
            Some(method @ (PaymentMethod::Omny | PaymentMethod::MetroCard)) => method,
            _ => PaymentMethod::NoFare,
        };

        Ok(RideRecord {
            route,
            timestamp,
            ridership_count: self.ridership,
            payment_method,
            latitude: None,
            longitude: None,
            vehicle_id: None,
            transfers: Some(self.transfers),
        })
    }
}

fn parse_transit_timestamp(raw: &str, timezone: Tz) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("couldn't parse transit_timestamp {raw:?}"))?;

    let local = naive
        .and_local_timezone(timezone)
        .earliest()
        .ok_or_else(|| anyhow!("transit_timestamp {raw:?} doesn't exist in {timezone}"))?;

    Ok(local.with_timezone(&Utc))
}
