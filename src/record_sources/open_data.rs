//! Responsible for fetching ridership from the NY open data portal
use async_trait::async_trait;
use chrono_tz::Tz;
use itertools::Itertools;
use tracing::{Instrument, error, info, info_span};

use super::RecordSource;
use crate::model::{open_data_model::OpenDataRide, ride::RideRecord};

pub struct OpenDataSource {
    client: reqwest::Client,
    url: String,
    limit: u32,
    timezone: Tz,
}

impl OpenDataSource {
    pub fn new(client: reqwest::Client, url: String, limit: u32, timezone: Tz) -> Self {
        OpenDataSource {
            client,
            url,
            limit,
            timezone,
        }
    }
}

#[async_trait]
impl RecordSource for OpenDataSource {
    fn name(&self) -> &'static str {
        "open-data"
    }

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>> {
        let rows = fetch_open_data_rides(&self.client, &self.url, self.limit).await?;

        Ok(into_ride_records(rows, self.timezone))
    }
}

/// Rows that can't become a [`RideRecord`] are logged and skipped.
pub fn into_ride_records(rows: Vec<OpenDataRide>, timezone: Tz) -> Vec<RideRecord> {
    rows.into_iter()
        .map(|r| r.try_into_ride_record(timezone))
        .filter_map(|r| match r {
            Err(e) => {
                error!("Error turning OpenDataRide to RideRecord {e}");
                None
            }
            Ok(r) => Some(r),
        })
        .collect_vec()
}

#[tracing::instrument(err, skip(client))]
async fn fetch_open_data_rides(
    client: &reqwest::Client,
    url: &str,
    limit: u32,
) -> Result<Vec<OpenDataRide>, GetRidesError> {
    let response = client
        .get(url)
        .query(&[("$limit", limit)])
        .send()
        .instrument(info_span!("Fetching open data rides"))
        .await?
        .error_for_status()?;

    let rides_string = response
        .text()
        .instrument(info_span!("Reading body of response"))
        .await?;

    let rides = parse_open_data_rides(&rides_string)?;

    info!("got {} open data rows", rides.len());

    Ok(rides)
}

fn parse_open_data_rides(body: &str) -> Result<Vec<OpenDataRide>, GetRidesError> {
    let rides: Vec<OpenDataRide> =
        serde_json::from_str(body).map_err(|e| GetRidesError::ParsingError {
            source: e,
            body: body.chars().take(512).collect(),
        })?;

    if rides.is_empty() {
        return Err(GetRidesError::EmptyFeed);
    }

    Ok(rides)
}

#[derive(thiserror::Error, Debug)]
pub enum GetRidesError {
    #[error("error fetching the open data rides")]
    HttpRequestError(#[from] reqwest::Error),

    #[error("error parsing the open data rides \n{source} \n{body}")]
    ParsingError {
        source: serde_json::Error,
        body: String,
    },

    #[error("the open data feed returned no rows")]
    EmptyFeed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    #[test]
    fn parses_body_and_skips_bad_rows() -> anyhow::Result<()> {
        let body = r#"[
            {"transit_timestamp":"2024-01-01T08:00:00.000","bus_route":"M15","payment_method":"omny","ridership":"10","transfers":"1"},
            {"transit_timestamp":"2024-01-01T08:00:00.000","payment_method":"omny","ridership":"99"},
            {"transit_timestamp":"2024-01-01T17:00:00.000","bus_route":"B46","payment_method":"metrocard","ridership":"5"}
        ]"#;

        let records = into_ride_records(parse_open_data_rides(body)?, New_York);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].route, "M15");
        assert_eq!(records[1].route, "B46");

        Ok(())
    }

    #[test]
    fn empty_and_malformed_bodies_are_errors() {
        assert!(matches!(
            parse_open_data_rides("[]"),
            Err(GetRidesError::EmptyFeed)
        ));
        assert!(matches!(
            parse_open_data_rides("<html>rate limited</html>"),
            Err(GetRidesError::ParsingError { .. })
        ));
    }
}
